//! Command-line front end for Zi Wei Dou Shu pattern detection.

pub mod commands;
pub mod config;
pub mod error;

pub use commands::{load_chart, render_catalog, render_reports, resolve_target, OutputFormat};
pub use config::resolve_chart_path;
pub use error::{CliError, CliResult};

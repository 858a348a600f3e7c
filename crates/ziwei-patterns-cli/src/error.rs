//! Errors raised by the command-line front end.

use ziwei_patterns::ChartError;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),

    #[error("No palace matches {0:?}")]
    UnknownPalace(String),

    #[error("Chart has no life palace (命宫)")]
    NoLifePalace,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;

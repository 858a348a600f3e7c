//! Entry point for the `ziwei-patterns` binary.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use ziwei_patterns::ScopeFlags;
use ziwei_patterns_cli::commands::{self, OutputFormat};
use ziwei_patterns_cli::config::resolve_chart_path;

#[derive(Parser)]
#[command(
    name = "ziwei-patterns",
    about = "Detect classical Zi Wei Dou Shu patterns in a chart export",
    version
)]
struct Cli {
    /// Path to the chart JSON export.
    #[arg(short, long)]
    chart: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect patterns for one palace, or every palace with --all.
    Detect {
        /// Path to the chart JSON export.
        #[arg(short, long)]
        chart: Option<PathBuf>,

        /// Separate horoscope JSON, replacing any overlays in the chart.
        #[arg(long)]
        horoscope: Option<PathBuf>,

        /// Target palace: ring index, palace name, role, or branch label.
        #[arg(short, long, conflicts_with = "all")]
        palace: Option<String>,

        /// Report every palace.
        #[arg(long)]
        all: bool,

        /// Include the decade overlay.
        #[arg(long)]
        decadal: bool,

        /// Include the year overlay.
        #[arg(long)]
        yearly: bool,

        /// Include the month overlay.
        #[arg(long)]
        monthly: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List the pattern catalog in reporting order.
    Catalog {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Validate a chart export.
    Validate {
        /// Path to the chart JSON export.
        #[arg(short, long)]
        chart: Option<PathBuf>,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   ziwei-patterns completions bash > ~/.local/share/bash-completion/completions/ziwei-patterns
    ///   ziwei-patterns completions zsh > ~/.zfunc/_ziwei-patterns
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Detect {
            chart,
            horoscope,
            palace,
            all,
            decadal,
            yearly,
            monthly,
            format,
        } => {
            let chart_path = resolve_chart_path(chart.or(cli.chart).as_deref());
            let chart = commands::load_chart(&chart_path, horoscope.as_deref())?;
            let flags = ScopeFlags {
                decadal,
                yearly,
                monthly,
            };

            let reports = if all {
                chart.detect_all(flags)
            } else {
                let target = commands::resolve_target(&chart, palace.as_deref(), flags)?;
                tracing::info!("Detecting patterns for palace {target}");
                vec![chart.detect(target, flags)]
            };
            print!("{}", commands::render_reports(&chart, &reports, flags, format)?);
            if format == OutputFormat::Json {
                println!();
            }
        }

        Commands::Catalog { format } => {
            print!("{}", commands::render_catalog(format)?);
            if format == OutputFormat::Json {
                println!();
            }
        }

        Commands::Validate { chart } => {
            let chart_path = resolve_chart_path(chart.or(cli.chart).as_deref());
            match commands::load_chart(&chart_path, None) {
                Ok(chart) => {
                    println!("Valid chart: {}", chart_path.display());
                    print!("{}", commands::summarize_chart(&chart));
                }
                Err(e) => {
                    eprintln!("Invalid chart: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "ziwei-patterns", &mut std::io::stdout());
        }
    }

    Ok(())
}

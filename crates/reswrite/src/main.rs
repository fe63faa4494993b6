//! reswrite CLI binary.
//!
//! Usage:
//!   reswrite [--config <file>] [--solution <path>] [--rewrite-files] [--dry-run]
//!
//! Prints a JSON run summary on stdout. On failure prints a JSON error
//! response and exits with its error code.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use reswrite::cli::{run, RunOptions};
use reswrite_core::config::{AppSettings, DEFAULT_CONFIG_FILE};
use reswrite_core::error::{OutputErrorCode, ReswriteError};
use reswrite_core::output::{emit_response, ErrorResponse, RunSummary};

/// Rewrite legacy resource `XFormat(...)` calls to `string.Format(...)`.
#[derive(Parser, Debug)]
#[command(name = "reswrite", version, about, long_about = None)]
struct Cli {
    /// Configuration file with an `appSettings` section.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Solution (.sln) or project (.csproj) to process. Overrides the config file.
    #[arg(long)]
    solution: Option<String>,

    /// Overwrite source files instead of writing `.upd` siblings.
    #[arg(long)]
    rewrite_files: bool,

    /// Rewrite in memory and report targets without writing.
    #[arg(long)]
    dry_run: bool,

    /// Log level (RUST_LOG takes precedence).
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Log output format.
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Format of log lines on stderr.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines (default).
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.log_level, cli.log_format);

    match execute(cli) {
        Ok(summary) => match emit_response(&summary, &mut io::stdout()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::from(OutputErrorCode::InternalError.code()),
        },
        Err(err) => {
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, like the summary
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(err.error_code().code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Load settings, apply flag overrides and run on a current-thread runtime.
fn execute(cli: Cli) -> Result<RunSummary, ReswriteError> {
    let mut settings = AppSettings::load(&cli.config)?;
    if let Some(solution) = cli.solution {
        settings.solution = solution;
    }
    if cli.rewrite_files {
        settings.rewrite_files = true;
    }

    let options = RunOptions {
        settings,
        config_path: cli.config,
        dry_run: cli.dry_run,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ReswriteError::internal(format!("failed to start runtime: {}", e)))?;
    runtime.block_on(run(&options))
}

//! blastcp CLI - copy one file with a live spinner and progress bar

use blastcp::app::{self, CopySummary};
use blastcp::config::{CliArgs, CopyConfig, DisplayMode};
use blastcp::error::{BlastError, Result};
use blastcp::progress::ExitReason;
use clap::Parser;
use std::fs::File;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
/// Conventional status for a run stopped by the user (128 + SIGINT)
const EXIT_USER_QUIT: i32 = 130;

fn main() {
    // Parse CLI arguments; usage errors exit with code 2
    let args = CliArgs::parse();

    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}

fn run(args: CliArgs) -> Result<i32> {
    // Build configuration
    let config = CopyConfig::from_cli(&args).map_err(BlastError::Config)?;

    init_logging(&args, &config)?;
    tracing::debug!(?config, "Configuration");

    match app::run(&config)? {
        ExitReason::Completed(stats) => {
            if config.display != DisplayMode::Quiet {
                CopySummary::new(&config, &stats).print(config.output_format)?;
            }
            Ok(EXIT_SUCCESS)
        }
        ExitReason::Failed(e) => {
            // already shown by the frontend
            tracing::debug!("Copy failed: {}", e);
            Ok(EXIT_FAILURE)
        }
        ExitReason::UserQuit { bytes_written } => {
            match bytes_written {
                Some(bytes) => eprintln!(
                    "Copy stopped after {}; {} is incomplete",
                    humansize::format_size(bytes, humansize::BINARY),
                    config.destination.display()
                ),
                None => eprintln!(
                    "Copy stopped; {} may be incomplete",
                    config.destination.display()
                ),
            }
            Ok(EXIT_USER_QUIT)
        }
    }
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins over `-v`. The interactive display owns the terminal, so
/// without `--log-file` nothing is installed while it is active.
fn init_logging(args: &CliArgs, config: &CopyConfig) -> Result<()> {
    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Some(path) = &args.log_file {
        let file = File::create(path).map_err(|e| {
            BlastError::config(format!("cannot open log file {}: {}", path.display(), e))
        })?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if !app::uses_terminal_ui(config) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}

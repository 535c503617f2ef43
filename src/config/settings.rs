//! Configuration settings for blastcp
//!
//! Defines the CLI arguments, the validated runtime configuration and
//! their defaults.

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Reference chunk size for the read/write loop
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Largest accepted chunk size (1 GiB); the copier allocates one chunk buffer
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024 * 1024;

/// Default spinner animation interval in milliseconds
pub const DEFAULT_TICK_RATE_MS: u64 = 100;

/// blastcp - copy one file with a live spinner and progress bar
#[derive(Parser, Debug, Clone)]
#[command(name = "blastcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Copy a single file with a live spinner and progress bar")]
#[command(long_about = r#"
blastcp copies one regular file to a destination path and shows a spinner
and a percentage bar while it runs.

Press q, Esc or Ctrl+C to stop. A stopped copy leaves the partial
destination file in place.

Examples:
  blastcp disk.img /mnt/backup/disk.img
  blastcp --chunk-size 1M big.iso copy.iso
  blastcp --plain data.bin out.bin > log.txt
"#)]
pub struct CliArgs {
    /// File to copy
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Path of the copy (created or overwritten)
    #[arg(value_name = "DESTINATION")]
    pub destination: PathBuf,

    /// Bytes per read/write cycle (e.g., 4K, 1M)
    #[arg(short = 'b', long, default_value = "4K", value_name = "SIZE")]
    pub chunk_size: String,

    /// Spinner animation interval in milliseconds
    #[arg(long, default_value_t = DEFAULT_TICK_RATE_MS, value_name = "MS")]
    pub tick_rate: u64,

    /// Draw a plain line progress bar instead of the interactive display
    #[arg(long)]
    pub plain: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (no progress display, no summary)
    #[arg(short = 'q', long, conflicts_with = "plain")]
    pub quiet: bool,

    /// Output format for the completion summary
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,

    /// Write log output to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Output format for the completion summary
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// How progress is shown while copying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Interactive inline terminal display with key handling
    #[default]
    Interactive,
    /// Line-oriented spinner and bar, no key handling
    Plain,
    /// Nothing is drawn
    Quiet,
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyConfig {
    /// Source path
    pub source: PathBuf,
    /// Destination path
    pub destination: PathBuf,
    /// Chunk size in bytes
    pub chunk_size: usize,
    /// Spinner animation interval
    pub tick_rate: Duration,
    /// Progress display
    pub display: DisplayMode,
    /// Summary format
    pub output_format: OutputFormat,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            tick_rate: Duration::from_millis(DEFAULT_TICK_RATE_MS),
            display: DisplayMode::Interactive,
            output_format: OutputFormat::Text,
        }
    }
}

/// Parse human-readable size string to bytes
pub fn parse_size(size: &str) -> Result<u64, String> {
    let size = size.trim().to_uppercase();

    if size.is_empty() {
        return Err("Empty size string".to_string());
    }

    let (num_str, multiplier) = if size.ends_with("GB") || size.ends_with('G') {
        (size.trim_end_matches(['G', 'B']), 1024u64 * 1024 * 1024)
    } else if size.ends_with("MB") || size.ends_with('M') {
        (size.trim_end_matches(['M', 'B']), 1024u64 * 1024)
    } else if size.ends_with("KB") || size.ends_with('K') {
        (size.trim_end_matches(['K', 'B']), 1024u64)
    } else if size.ends_with('B') {
        (size.trim_end_matches('B'), 1u64)
    } else {
        // Assume bytes if no suffix
        (size.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", num_str))?;

    if !num.is_finite() || num < 0.0 {
        return Err(format!("Invalid number: {}", num_str));
    }

    Ok((num * multiplier as f64) as u64)
}

impl CopyConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        let chunk_size =
            parse_size(&args.chunk_size).map_err(|e| format!("Invalid chunk size: {}", e))?;
        if chunk_size == 0 {
            return Err("Invalid chunk size: must be greater than zero".to_string());
        }
        let chunk_size = usize::try_from(chunk_size)
            .ok()
            .filter(|&size| size <= MAX_CHUNK_SIZE)
            .ok_or_else(|| {
                format!(
                    "Invalid chunk size: {} is too large (max 1G)",
                    args.chunk_size
                )
            })?;

        if args.tick_rate == 0 {
            return Err("Invalid tick rate: must be greater than zero".to_string());
        }

        let display = if args.quiet {
            DisplayMode::Quiet
        } else if args.plain {
            DisplayMode::Plain
        } else {
            DisplayMode::Interactive
        };

        Ok(Self {
            source: args.source.clone(),
            destination: args.destination.clone(),
            chunk_size,
            tick_rate: Duration::from_millis(args.tick_rate),
            display,
            output_format: args.output_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["blastcp", "in.bin", "out.bin"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size("4K").unwrap(), 4096);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("1m").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("1G").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size("1.5K").unwrap(), 1536);
        assert!(parse_size("").is_err());
        assert!(parse_size("lots").is_err());
        assert!(parse_size("-4K").is_err());
    }

    #[test]
    fn test_defaults_from_cli() {
        let config = CopyConfig::from_cli(&args(&[])).unwrap();
        assert_eq!(config.source, PathBuf::from("in.bin"));
        assert_eq!(config.destination, PathBuf::from("out.bin"));
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.tick_rate, Duration::from_millis(DEFAULT_TICK_RATE_MS));
        assert_eq!(config.display, DisplayMode::Interactive);
        assert_eq!(config.output_format, OutputFormat::Text);
    }

    #[test]
    fn test_display_mode() {
        let config = CopyConfig::from_cli(&args(&["--plain"])).unwrap();
        assert_eq!(config.display, DisplayMode::Plain);

        let config = CopyConfig::from_cli(&args(&["-q"])).unwrap();
        assert_eq!(config.display, DisplayMode::Quiet);
    }

    #[test]
    fn test_quiet_conflicts_with_plain() {
        let result = CliArgs::try_parse_from(["blastcp", "a", "b", "--plain", "--quiet"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_destination_is_usage_error() {
        let err = CliArgs::try_parse_from(["blastcp", "a"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_rejects_zero_chunk_and_tick() {
        assert!(CopyConfig::from_cli(&args(&["--chunk-size", "0"])).is_err());
        assert!(CopyConfig::from_cli(&args(&["--tick-rate", "0"])).is_err());
    }

    #[test]
    fn test_rejects_huge_chunk_size() {
        for size in ["1e30", "2G", "1025M"] {
            let err = CopyConfig::from_cli(&args(&["-b", size])).unwrap_err();
            assert!(err.contains("too large"), "{size}: {err}");
        }

        let config = CopyConfig::from_cli(&args(&["-b", "1G"])).unwrap();
        assert_eq!(config.chunk_size, MAX_CHUNK_SIZE);
    }

    #[test]
    fn test_chunk_size_and_format() {
        let config = CopyConfig::from_cli(&args(&["-b", "1M", "--output-format", "json"])).unwrap();
        assert_eq!(config.chunk_size, 1024 * 1024);
        assert_eq!(config.output_format, OutputFormat::Json);
    }
}

//! Error types for blastcp
//!
//! Two layers: [`CopyError`] covers everything the copier can report about
//! the file transfer itself, [`BlastError`] wraps it together with the
//! failures that belong to the process (terminal, configuration, output).

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Outcome of a failed copy
#[derive(Error, Debug)]
pub enum CopyError {
    /// Source missing, unreadable, or not a regular file
    #[error("invalid source '{path}': {reason}")]
    InvalidSource { path: PathBuf, reason: String },

    /// Source and destination name the same file
    #[error("source and destination are the same file: {path}")]
    SameFile { path: PathBuf },

    /// Destination could not be created or truncated
    #[error("cannot write destination '{path}': {source}")]
    DestinationUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Read error in the middle of the transfer
    #[error("read failed on '{path}' after {bytes_written} bytes: {source}")]
    ReadFailed {
        path: PathBuf,
        bytes_written: u64,
        #[source]
        source: std::io::Error,
    },

    /// Write error in the middle of the transfer
    #[error("write failed on '{path}' after {bytes_written} bytes: {source}")]
    WriteFailed {
        path: PathBuf,
        bytes_written: u64,
        #[source]
        source: std::io::Error,
    },

    /// Copy stopped through its cancellation token
    #[error("copy cancelled after {bytes_written} bytes")]
    Cancelled { bytes_written: u64 },

    /// The copy task went away without reporting a result
    #[error("copy task stopped without reporting a result")]
    TaskLost,
}

impl CopyError {
    /// Create an invalid source error
    pub fn invalid_source(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::InvalidSource {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a destination error
    pub fn unwritable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DestinationUnwritable {
            path: path.into(),
            source,
        }
    }

    /// Bytes that reached the destination before the copy stopped, if known
    pub fn bytes_written(&self) -> Option<u64> {
        match self {
            Self::ReadFailed { bytes_written, .. }
            | Self::WriteFailed { bytes_written, .. }
            | Self::Cancelled { bytes_written } => Some(*bytes_written),
            _ => None,
        }
    }

    /// True if the error was raised before the destination was touched
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::InvalidSource { .. } | Self::SameFile { .. } | Self::DestinationUnwritable { .. }
        )
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::InvalidSource { path, .. }
            | Self::SameFile { path }
            | Self::DestinationUnwritable { path, .. }
            | Self::ReadFailed { path, .. }
            | Self::WriteFailed { path, .. } => Some(path),
            Self::Cancelled { .. } | Self::TaskLost => None,
        }
    }
}

/// Main error type for the blastcp process
#[derive(Error, Debug)]
pub enum BlastError {
    /// The copy itself failed
    #[error(transparent)]
    Copy(#[from] CopyError),

    /// Terminal could not be set up or drawn to
    #[error("terminal error: {source}")]
    UiFatal {
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Summary could not be serialized
    #[error("cannot encode summary: {0}")]
    Summary(#[from] serde_json::Error),
}

impl BlastError {
    /// Wrap a terminal I/O failure
    pub fn ui(source: std::io::Error) -> Self {
        Self::UiFatal { source }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result type alias for blastcp operations
pub type Result<T> = std::result::Result<T, BlastError>;

/// Extension trait for turning terminal `io::Result`s into [`BlastError::UiFatal`]
pub trait UiResultExt<T> {
    /// Mark an I/O error as fatal to the UI
    fn ui_fatal(self) -> Result<T>;
}

impl<T> UiResultExt<T> for std::io::Result<T> {
    fn ui_fatal(self) -> Result<T> {
        self.map_err(BlastError::ui)
    }
}

//! Single-file copier
//!
//! Validates the request, streams the source into the destination in
//! fixed-size chunks and reports the progress fraction after every chunk.

use crate::config::MAX_CHUNK_SIZE;
use crate::core::ProgressSink;
use crate::error::CopyError;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, Metadata};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What to copy where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyRequest {
    /// File to read
    pub source: PathBuf,
    /// File to create or overwrite
    pub destination: PathBuf,
}

impl CopyRequest {
    /// Create a new request
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Copy operation statistics
#[derive(Debug, Clone, Default)]
pub struct CopyStats {
    /// Bytes copied
    pub bytes_copied: u64,
    /// Read/write cycles performed
    pub chunks: u64,
    /// Duration of the copy
    pub duration: Duration,
    /// Throughput in bytes/second
    pub throughput: f64,
}

impl CopyStats {
    /// Calculate throughput from bytes and duration
    pub fn calculate_throughput(&mut self) {
        if self.duration.as_secs_f64() > 0.0 {
            self.throughput = self.bytes_copied as f64 / self.duration.as_secs_f64();
        }
    }
}

/// Shared flag that asks a running copy to stop between chunks
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress fraction for `written` out of `total` bytes.
///
/// A zero-byte total counts as complete. Values are capped at 1.0 so a
/// source that grows while being copied never overshoots the bar.
pub fn progress_fraction(written: u64, total: u64) -> f64 {
    if total == 0 {
        1.0
    } else {
        (written as f64 / total as f64).min(1.0)
    }
}

/// Chunked file copier
#[derive(Debug, Clone)]
pub struct Copier {
    chunk_size: usize,
    cancel: Option<CancelToken>,
}

impl Copier {
    /// Create a copier reading `chunk_size` bytes per cycle.
    /// The size is clamped to `1..=MAX_CHUNK_SIZE`.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.clamp(1, MAX_CHUNK_SIZE),
            cancel: None,
        }
    }

    /// Check `token` between chunks and stop when it is cancelled
    pub fn with_cancellation(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Bytes per read/write cycle
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Copy `request.source` to `request.destination`.
    ///
    /// The source is validated before the destination is touched. Progress
    /// starts at 0.0 and, on success, always ends at 1.0 (a zero-byte source
    /// emits exactly `[0.0, 1.0]`).
    ///
    /// # Errors
    ///
    /// [`CopyError::InvalidSource`] or [`CopyError::SameFile`] before any
    /// destination I/O, [`CopyError::DestinationUnwritable`] if the
    /// destination cannot be created, and [`CopyError::ReadFailed`],
    /// [`CopyError::WriteFailed`] or [`CopyError::Cancelled`] mid-transfer.
    /// Mid-transfer failures leave the partial destination in place.
    pub fn copy<S>(&self, request: &CopyRequest, sink: &mut S) -> Result<CopyStats, CopyError>
    where
        S: ProgressSink + ?Sized,
    {
        let start = Instant::now();

        let metadata = fs::metadata(&request.source)
            .map_err(|e| CopyError::invalid_source(&request.source, e))?;
        if !metadata.is_file() {
            return Err(CopyError::invalid_source(
                &request.source,
                describe_non_regular(&metadata),
            ));
        }
        if is_same_file(&request.source, &metadata, &request.destination) {
            return Err(CopyError::SameFile {
                path: request.destination.clone(),
            });
        }

        let mut source = File::open(&request.source)
            .map_err(|e| CopyError::invalid_source(&request.source, e))?;
        let mut destination = File::create(&request.destination)
            .map_err(|e| CopyError::unwritable(&request.destination, e))?;

        let total = metadata.len();
        tracing::info!(
            source = %request.source.display(),
            destination = %request.destination.display(),
            bytes = total,
            chunk_size = self.chunk_size,
            "Copy started"
        );

        let (bytes_copied, chunks) =
            self.transfer(&mut source, &mut destination, total, request, sink)?;

        let mut stats = CopyStats {
            bytes_copied,
            chunks,
            duration: start.elapsed(),
            throughput: 0.0,
        };
        stats.calculate_throughput();

        tracing::info!(
            bytes = stats.bytes_copied,
            chunks = stats.chunks,
            elapsed = ?stats.duration,
            "Copy finished"
        );

        Ok(stats)
    }

    /// Stream `reader` into `writer`, reporting progress against `total`.
    ///
    /// Returns the number of bytes written and the number of chunks read.
    /// `paths` only supplies context for errors.
    ///
    /// # Errors
    ///
    /// [`CopyError::ReadFailed`] on a read error other than an interrupt,
    /// [`CopyError::WriteFailed`] on a failed or zero-length write and
    /// [`CopyError::Cancelled`] when the token fires between chunks. The
    /// `bytes_written` field is exact: every byte counted reached `writer`.
    pub fn transfer<R, W, S>(
        &self,
        reader: &mut R,
        writer: &mut W,
        total: u64,
        paths: &CopyRequest,
        sink: &mut S,
    ) -> Result<(u64, u64), CopyError>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
        S: ProgressSink + ?Sized,
    {
        let mut buffer = vec![0u8; self.chunk_size];
        let mut written: u64 = 0;
        let mut chunks: u64 = 0;
        let mut last = 0.0;

        sink.on_progress(last);

        loop {
            if self.is_cancelled() {
                tracing::warn!(bytes_written = written, "Copy cancelled");
                return Err(CopyError::Cancelled {
                    bytes_written: written,
                });
            }

            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(CopyError::ReadFailed {
                        path: paths.source.clone(),
                        bytes_written: written,
                        source: e,
                    })
                }
            };
            chunks += 1;

            write_chunk(writer, &buffer[..n], &mut written).map_err(|e| {
                CopyError::WriteFailed {
                    path: paths.destination.clone(),
                    bytes_written: written,
                    source: e,
                }
            })?;

            last = progress_fraction(written, total);
            tracing::trace!(chunk = chunks, bytes_written = written, fraction = last);
            sink.on_progress(last);
        }

        writer.flush().map_err(|e| CopyError::WriteFailed {
            path: paths.destination.clone(),
            bytes_written: written,
            source: e,
        })?;

        if last < 1.0 {
            sink.on_progress(1.0);
        }

        Ok((written, chunks))
    }
}

impl Default for Copier {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CHUNK_SIZE)
    }
}

/// Write all of `chunk`, adding every accepted byte to `written`.
/// A write that accepts nothing is a short write and fails.
fn write_chunk<W: Write + ?Sized>(writer: &mut W, mut chunk: &[u8], written: &mut u64) -> io::Result<()> {
    while !chunk.is_empty() {
        match writer.write(chunk) {
            Ok(0) => return Err(io::Error::new(ErrorKind::WriteZero, "short write")),
            Ok(n) => {
                *written += n as u64;
                chunk = &chunk[n..];
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn describe_non_regular(metadata: &Metadata) -> &'static str {
    let file_type = metadata.file_type();
    if file_type.is_dir() {
        return "is a directory";
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        if file_type.is_block_device() || file_type.is_char_device() {
            return "is a device";
        }
        if file_type.is_fifo() {
            return "is a named pipe";
        }
        if file_type.is_socket() {
            return "is a socket";
        }
    }

    "is not a regular file"
}

#[cfg(unix)]
fn is_same_file(_source: &Path, source_meta: &Metadata, destination: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match fs::metadata(destination) {
        Ok(dest_meta) => source_meta.dev() == dest_meta.dev() && source_meta.ino() == dest_meta.ino(),
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_same_file(source: &Path, _source_meta: &Metadata, destination: &Path) -> bool {
    match (fs::canonicalize(source), fs::canonicalize(destination)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

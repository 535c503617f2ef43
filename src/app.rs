//! Application wiring
//!
//! Connects the copier thread, the render loop and the chosen frontend,
//! and produces the completion summary.

use crate::config::{CopyConfig, DisplayMode, OutputFormat};
use crate::core::{CancelToken, CopyRequest, CopyStats, Copier};
use crate::error::{Result, UiResultExt};
use crate::progress::tui::TerminalFrontend;
use crate::progress::{
    inbox, ChannelSink, ExitReason, FinishGuard, Frontend, LineFrontend, Reporter, UiMessage,
};
use crossbeam::channel::{Receiver, Sender};
use serde::Serialize;
use std::fmt::Write as _;
use std::thread;

/// True when the interactive terminal display will be used
pub fn uses_terminal_ui(config: &CopyConfig) -> bool {
    config.display == DisplayMode::Interactive && console::Term::stdout().is_term()
}

/// Copy `config.source` to `config.destination`, showing progress as
/// configured.
///
/// In quiet mode a copy failure is returned as an error. With a display
/// active the failure has already been shown and comes back as
/// [`ExitReason::Failed`].
pub fn run(config: &CopyConfig) -> Result<ExitReason> {
    if config.display == DisplayMode::Quiet {
        let request = CopyRequest::new(&config.source, &config.destination);
        return run_headless(config, &request);
    }

    let (tx, rx) = inbox();
    let mut frontend: Box<dyn Frontend> = if uses_terminal_ui(config) {
        Box::new(TerminalFrontend::new(tx.clone()).ui_fatal()?)
    } else {
        Box::new(LineFrontend::new())
    };

    run_with_frontend(config, frontend.as_mut(), tx, rx)
}

/// Run the copier thread and the render loop, drawing through `frontend`.
///
/// `tx` and `rx` are the two ends of one inbox. After a quit the copier is
/// cancelled and its own result decides the outcome: a copy that had
/// already finished is reported as completed, otherwise the partial size
/// is attached to [`ExitReason::UserQuit`].
pub fn run_with_frontend<F: Frontend + ?Sized>(
    config: &CopyConfig,
    frontend: &mut F,
    tx: Sender<UiMessage>,
    rx: Receiver<UiMessage>,
) -> Result<ExitReason> {
    let request = CopyRequest::new(&config.source, &config.destination);
    let cancel = CancelToken::new();
    let copier = Copier::new(config.chunk_size).with_cancellation(cancel.clone());
    let handle = spawn_copier(copier, request.clone(), tx);

    let outcome = match Reporter::new(&request, config.tick_rate).run(&rx, frontend) {
        Ok(ExitReason::UserQuit { .. }) => {
            tracing::warn!("Stopping copy before completion");
            cancel.cancel();
            Ok(settle_after_quit(&rx))
        }
        Err(e) => {
            cancel.cancel();
            Err(e)
        }
        finished => finished,
    };
    drop(rx);

    if handle.join().is_err() {
        tracing::error!("Copy thread panicked");
    }

    outcome
}

/// Wait for the copier's own result once the render loop stopped listening
fn settle_after_quit(inbox: &Receiver<UiMessage>) -> ExitReason {
    for message in inbox.iter() {
        if let UiMessage::Finished(result) = message {
            return match result {
                Ok(stats) => {
                    tracing::info!("Copy finished before the quit took effect");
                    ExitReason::Completed(stats)
                }
                Err(error) => {
                    tracing::debug!("Copy stopped: {}", error);
                    ExitReason::UserQuit {
                        bytes_written: error.bytes_written(),
                    }
                }
            };
        }
    }

    ExitReason::UserQuit {
        bytes_written: None,
    }
}

fn run_headless(config: &CopyConfig, request: &CopyRequest) -> Result<ExitReason> {
    let copier = Copier::new(config.chunk_size);
    let mut sink = |fraction: f64| tracing::trace!(fraction, "Copy progress");
    let stats = copier.copy(request, &mut sink)?;
    Ok(ExitReason::Completed(stats))
}

fn spawn_copier(
    copier: Copier,
    request: CopyRequest,
    tx: Sender<UiMessage>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let guard = FinishGuard::new(tx.clone());
        let mut sink = ChannelSink::new(tx);
        let result = copier.copy(&request, &mut sink);
        drop(sink);
        guard.finish(result);
    })
}

/// Completion summary
#[derive(Debug, Clone, Serialize)]
pub struct CopySummary {
    /// Source path
    pub source: String,
    /// Destination path
    pub destination: String,
    /// Bytes copied
    pub bytes_copied: u64,
    /// Read/write cycles
    pub chunks: u64,
    /// Wall time in seconds
    pub duration_secs: f64,
    /// Average throughput
    pub throughput_bytes_per_sec: f64,
}

impl CopySummary {
    /// Build a summary from the finished copy
    pub fn new(config: &CopyConfig, stats: &CopyStats) -> Self {
        Self {
            source: config.source.display().to_string(),
            destination: config.destination.display().to_string(),
            bytes_copied: stats.bytes_copied,
            chunks: stats.chunks,
            duration_secs: stats.duration.as_secs_f64(),
            throughput_bytes_per_sec: stats.throughput,
        }
    }

    /// Format the summary
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Text => {
                let mut out = String::new();
                let _ = writeln!(out, "\n=== Copy Summary ===");
                let _ = writeln!(out, "Source:          {}", self.source);
                let _ = writeln!(out, "Destination:     {}", self.destination);
                let _ = writeln!(
                    out,
                    "Bytes copied:    {}",
                    humansize::format_size(self.bytes_copied, humansize::BINARY)
                );
                let _ = writeln!(out, "Chunks:          {}", self.chunks);
                let _ = writeln!(out, "Duration:        {:.2}s", self.duration_secs);
                let _ = write!(
                    out,
                    "Throughput:      {}/s",
                    humansize::format_size(self.throughput_bytes_per_sec as u64, humansize::BINARY)
                );
                Ok(out)
            }
        }
    }

    /// Print the summary to stdout
    pub fn print(&self, format: OutputFormat) -> Result<()> {
        println!("{}", self.render(format)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BlastError, CopyError};
    use crate::progress::UiState;
    use std::fs;
    use std::io;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Slow frontend that asks to quit once the copy has made progress
    struct QuitOnProgress {
        tx: Option<Sender<UiMessage>>,
    }

    impl Frontend for QuitOnProgress {
        fn draw(&mut self, state: &UiState) -> io::Result<()> {
            if state.progress() > 0.0 {
                if let Some(tx) = self.tx.take() {
                    // off-thread so a full inbox never blocks the loop
                    thread::spawn(move || {
                        let _ = tx.send(UiMessage::QuitRequested);
                    });
                }
            }
            thread::sleep(Duration::from_millis(1));
            Ok(())
        }

        fn finish(&mut self, _state: &UiState) -> io::Result<()> {
            Ok(())
        }
    }

    fn config(src: &Path, dst: &Path, display: DisplayMode) -> CopyConfig {
        CopyConfig {
            source: src.to_path_buf(),
            destination: dst.to_path_buf(),
            chunk_size: 1024,
            tick_rate: Duration::from_millis(10),
            display,
            ..Default::default()
        }
    }

    #[test]
    fn test_quiet_copy() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("in.bin");
        let dst = temp.path().join("out.bin");
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&src, &data).unwrap();

        let reason = run(&config(&src, &dst, DisplayMode::Quiet)).unwrap();
        match reason {
            ExitReason::Completed(stats) => assert_eq!(stats.bytes_copied, 10_000),
            other => panic!("expected Completed, got {other:?}"),
        }
        assert_eq!(fs::read(&dst).unwrap(), data);
    }

    #[test]
    fn test_quiet_failure_is_error() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("missing.bin");
        let dst = temp.path().join("out.bin");

        let err = run(&config(&src, &dst, DisplayMode::Quiet)).unwrap_err();
        assert!(matches!(
            err,
            BlastError::Copy(CopyError::InvalidSource { .. })
        ));
        assert!(!dst.exists());
    }

    #[test]
    fn test_plain_copy() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("in.bin");
        let dst = temp.path().join("out.bin");
        let data = vec![7u8; 64 * 1024];
        fs::write(&src, &data).unwrap();

        let reason = run(&config(&src, &dst, DisplayMode::Plain)).unwrap();
        assert!(matches!(reason, ExitReason::Completed(_)));
        assert_eq!(fs::read(&dst).unwrap(), data);
    }

    #[test]
    fn test_plain_failure_is_exit_reason() {
        let temp = TempDir::new().unwrap();
        let dst = temp.path().join("out.bin");

        let reason = run(&config(temp.path(), &dst, DisplayMode::Plain)).unwrap();
        assert!(matches!(
            reason,
            ExitReason::Failed(CopyError::InvalidSource { .. })
        ));
        assert!(!dst.exists());
    }

    #[test]
    fn test_quit_mid_copy_leaves_cancelled_partial() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("in.bin");
        let dst = temp.path().join("out.bin");
        let data = vec![3u8; 8 * 1024 * 1024];
        fs::write(&src, &data).unwrap();

        let mut cfg = config(&src, &dst, DisplayMode::Plain);
        cfg.chunk_size = 4096;
        let (tx, rx) = inbox();
        let mut frontend = QuitOnProgress {
            tx: Some(tx.clone()),
        };

        let reason = run_with_frontend(&cfg, &mut frontend, tx, rx).unwrap();
        match reason {
            ExitReason::UserQuit {
                bytes_written: Some(written),
            } => {
                assert!(written < data.len() as u64);
                assert_eq!(fs::metadata(&dst).unwrap().len(), written);
            }
            other => panic!("expected UserQuit with a partial size, got {other:?}"),
        }
    }

    #[test]
    fn test_quit_after_copy_finished_reports_completed() {
        let (tx, rx) = inbox();
        tx.send(UiMessage::Progress(1.0)).unwrap();
        tx.send(UiMessage::QuitRequested).unwrap();
        tx.send(UiMessage::Finished(Ok(CopyStats {
            bytes_copied: 99,
            ..Default::default()
        })))
        .unwrap();

        match settle_after_quit(&rx) {
            ExitReason::Completed(stats) => assert_eq!(stats.bytes_copied, 99),
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[test]
    fn test_quit_settles_on_copier_result() {
        let (tx, rx) = inbox();
        tx.send(UiMessage::Progress(0.2)).unwrap();
        tx.send(UiMessage::Finished(Err(CopyError::Cancelled {
            bytes_written: 42,
        })))
        .unwrap();
        assert!(matches!(
            settle_after_quit(&rx),
            ExitReason::UserQuit {
                bytes_written: Some(42)
            }
        ));

        let (tx, rx) = inbox();
        drop(tx);
        assert!(matches!(
            settle_after_quit(&rx),
            ExitReason::UserQuit {
                bytes_written: None
            }
        ));
    }

    #[test]
    fn test_quiet_never_uses_terminal() {
        let cfg = config(Path::new("a"), Path::new("b"), DisplayMode::Quiet);
        assert!(!uses_terminal_ui(&cfg));
        let cfg = config(Path::new("a"), Path::new("b"), DisplayMode::Plain);
        assert!(!uses_terminal_ui(&cfg));
    }

    #[test]
    fn test_summary_text() {
        let cfg = config(Path::new("a.bin"), Path::new("b.bin"), DisplayMode::Quiet);
        let stats = CopyStats {
            bytes_copied: 2048,
            chunks: 2,
            duration: Duration::from_secs(2),
            throughput: 1024.0,
        };
        let text = CopySummary::new(&cfg, &stats)
            .render(OutputFormat::Text)
            .unwrap();

        assert!(text.contains("Source:          a.bin"));
        assert!(text.contains("Bytes copied:    2 KiB"));
        assert!(text.contains("Chunks:          2"));
        assert!(text.contains("Throughput:      1 KiB/s"));
    }

    #[test]
    fn test_summary_json() {
        let cfg = config(Path::new("a.bin"), Path::new("b.bin"), DisplayMode::Quiet);
        let stats = CopyStats {
            bytes_copied: 10,
            chunks: 1,
            ..Default::default()
        };
        let json = CopySummary::new(&cfg, &stats)
            .render(OutputFormat::Json)
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source"], "a.bin");
        assert_eq!(value["destination"], "b.bin");
        assert_eq!(value["bytes_copied"], 10);
        assert_eq!(value["chunks"], 1);
    }
}

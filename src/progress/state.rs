//! Render loop state
//!
//! [`UiState`] is owned by the render loop and changes only through
//! [`UiState::update`]. The copier never touches it; it can only send
//! messages.

use crate::core::{CopyRequest, CopyStats};
use crate::error::CopyError;
use crate::progress::UiMessage;

/// Braille dot spinner
pub const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// Glyph shown in place of the spinner once the copy succeeded
pub const DONE_GLYPH: &str = "✓";

/// Width of the textual bar in cells
pub const BAR_WIDTH: usize = 40;

/// Spinner animation state
#[derive(Debug, Clone, Default)]
pub struct Spinner {
    ticks: usize,
}

impl Spinner {
    /// Advance one frame
    pub fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
    }

    /// Index of the current frame
    pub fn frame(&self) -> usize {
        self.ticks % SPINNER_FRAMES.len()
    }

    /// Glyph of the current frame
    pub fn glyph(&self) -> &'static str {
        SPINNER_FRAMES[self.frame()]
    }

    /// Number of ticks seen so far
    pub fn ticks(&self) -> usize {
        self.ticks
    }
}

/// Render loop phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting messages and redrawing
    Running,
    /// Terminal; the loop stops
    Quitting,
}

/// Why the render loop ended
#[derive(Debug)]
pub enum ExitReason {
    /// The copy finished
    Completed(CopyStats),
    /// The copy failed; the error was shown in place of the progress frame
    Failed(CopyError),
    /// The user quit before the copy finished
    UserQuit {
        /// Bytes in the partial destination, once the copier has stopped
        bytes_written: Option<u64>,
    },
}

/// State owned by the render loop
#[derive(Debug)]
pub struct UiState {
    source: String,
    destination: String,
    spinner: Spinner,
    progress: f64,
    phase: Phase,
    error: Option<CopyError>,
    stats: Option<CopyStats>,
}

impl UiState {
    /// Fresh state for a copy request
    pub fn new(request: &CopyRequest) -> Self {
        Self {
            source: request.source.display().to_string(),
            destination: request.destination.display().to_string(),
            spinner: Spinner::default(),
            progress: 0.0,
            phase: Phase::Running,
            error: None,
            stats: None,
        }
    }

    /// Apply one message.
    ///
    /// Progress values are stored as received; the copier guarantees the
    /// range. Messages that arrive after the loop started quitting are
    /// ignored. Returns the phase after the update.
    pub fn update(&mut self, message: UiMessage) -> Phase {
        if self.phase == Phase::Quitting {
            return self.phase;
        }

        match message {
            UiMessage::Tick => self.spinner.tick(),
            UiMessage::Progress(fraction) => self.progress = fraction,
            UiMessage::QuitRequested => {
                tracing::debug!("Quit requested");
                self.phase = Phase::Quitting;
            }
            UiMessage::Finished(Ok(stats)) => {
                tracing::debug!(bytes = stats.bytes_copied, "Copy reported success");
                self.stats = Some(stats);
                self.phase = Phase::Quitting;
            }
            UiMessage::Finished(Err(error)) => {
                tracing::debug!("Copy reported failure: {}", error);
                self.error = Some(error);
                self.phase = Phase::Quitting;
            }
        }

        self.phase
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True while the loop should keep going
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Last progress fraction received
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Spinner state
    pub fn spinner(&self) -> &Spinner {
        &self.spinner
    }

    /// Terminal error, if the copy failed
    pub fn error(&self) -> Option<&CopyError> {
        self.error.as_ref()
    }

    /// True once the copier reported success
    pub fn is_complete(&self) -> bool {
        self.stats.is_some()
    }

    /// Source path as displayed
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Destination path as displayed
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Leading glyph: the spinner, or a check mark once done
    pub fn glyph(&self) -> &'static str {
        if self.is_complete() {
            DONE_GLYPH
        } else {
            self.spinner.glyph()
        }
    }

    /// Headline next to the glyph
    pub fn headline(&self) -> String {
        if self.is_complete() {
            format!("Copied {} to {}", self.source, self.destination)
        } else {
            format!("Copying {} to {}...", self.source, self.destination)
        }
    }

    /// Progress clamped for drawing
    pub fn display_ratio(&self) -> f64 {
        if self.progress.is_nan() {
            0.0
        } else {
            self.progress.clamp(0.0, 1.0)
        }
    }

    /// Textual frame.
    ///
    /// With an error present the frame is only the error message.
    pub fn view(&self) -> String {
        if let Some(error) = &self.error {
            return format!("{}\n", error);
        }

        format!(
            "\n{} {}\n\n{}\n\n",
            self.glyph(),
            self.headline(),
            render_bar(self.display_ratio(), BAR_WIDTH)
        )
    }

    /// Consume the state into the loop's result
    pub fn into_exit_reason(self) -> ExitReason {
        match (self.error, self.stats) {
            (Some(error), _) => ExitReason::Failed(error),
            (None, Some(stats)) => ExitReason::Completed(stats),
            (None, None) => ExitReason::UserQuit {
                bytes_written: None,
            },
        }
    }
}

/// Proportional bar followed by the percentage, e.g. `█████░░░░░  50%`
pub fn render_bar(ratio: f64, width: usize) -> String {
    let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
    let filled = (ratio * width as f64).round() as usize;
    format!(
        "{}{} {:>3.0}%",
        "█".repeat(filled),
        "░".repeat(width - filled),
        ratio * 100.0
    )
}

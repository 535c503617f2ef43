//! Line progress frontend
//!
//! Uses indicatif for a spinner line and a bar below it:
//! - Spinner frames advanced by render loop ticks
//! - Bar position driven by copier progress
//! - Check mark on success, error text on failure
//!
//! Draws to stderr so piped stdout stays clean. No keyboard handling, so
//! Ctrl+C terminates the process as usual.

use crate::progress::{Frontend, UiState, DONE_GLYPH, SPINNER_FRAMES};
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io;

/// Bar resolution: positions per full bar
const PROGRESS_SCALE: u64 = 1000;

const TEMPLATE: &str = "{spinner:.magenta} {msg}\n[{bar:40.magenta/yellow}] {percent:>3}%";

/// indicatif-backed frontend
pub struct LineFrontend {
    bar: ProgressBar,
    ticks: usize,
}

impl LineFrontend {
    /// Create a frontend drawing to stderr
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    /// Create a frontend that draws nothing (for tests and non-terminals)
    pub fn hidden() -> Self {
        Self::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(PROGRESS_SCALE), target);
        bar.set_style(line_style());
        Self { bar, ticks: 0 }
    }

    /// Current bar position, out of 1000
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// True once the bar was finished or abandoned
    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}

impl Default for LineFrontend {
    fn default() -> Self {
        Self::new()
    }
}

fn line_style() -> ProgressStyle {
    let mut ticks: Vec<&str> = SPINNER_FRAMES.to_vec();
    // last tick string is the finished state
    ticks.push(DONE_GLYPH);

    ProgressStyle::with_template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_strings(&ticks)
        .progress_chars("█▓░")
}

impl Frontend for LineFrontend {
    fn draw(&mut self, state: &UiState) -> io::Result<()> {
        while self.ticks < state.spinner().ticks() {
            self.bar.tick();
            self.ticks += 1;
        }
        self.bar.set_message(state.headline());
        self.bar
            .set_position((state.display_ratio() * PROGRESS_SCALE as f64).round() as u64);
        Ok(())
    }

    fn finish(&mut self, state: &UiState) -> io::Result<()> {
        if let Some(error) = state.error() {
            self.bar.finish_and_clear();
            eprintln!("{} {}", style("✗").red().bold(), style(error).red());
        } else if state.is_complete() {
            self.bar.set_position(PROGRESS_SCALE);
            self.bar.finish_with_message(state.headline());
        } else {
            self.bar.abandon_with_message(format!(
                "Stopped copying {} to {}",
                state.source(),
                state.destination()
            ));
        }
        Ok(())
    }
}

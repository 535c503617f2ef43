//! Progress reporting module
//!
//! The render loop in [`Reporter::run`] owns the [`UiState`] and is the only
//! place it changes. It multiplexes the inbox (copier progress, copier
//! result, quit requests) with a spinner tick timer, redrawing through a
//! [`Frontend`] after every message.

mod message;
mod reporter;
mod state;
pub mod tui;

pub use message::*;
pub use reporter::*;
pub use state::*;

use crate::core::CopyRequest;
use crate::error::{CopyError, UiResultExt};
use crossbeam::channel::{tick, Receiver};
use std::io;
use std::time::Duration;

/// Something that can show a [`UiState`]
pub trait Frontend {
    /// Draw the current frame
    fn draw(&mut self, state: &UiState) -> io::Result<()>;

    /// Draw the last frame and release the output
    fn finish(&mut self, state: &UiState) -> io::Result<()>;
}

/// The render loop
pub struct Reporter {
    state: UiState,
    tick_rate: Duration,
}

impl Reporter {
    /// Create a render loop for `request`, animating every `tick_rate`
    pub fn new(request: &CopyRequest, tick_rate: Duration) -> Self {
        Self {
            state: UiState::new(request),
            tick_rate,
        }
    }

    /// Run until the copy finishes, fails, or the user quits.
    ///
    /// A disconnected inbox counts as a lost copy task. After a quit the
    /// copier may still be sending; the caller must keep draining or drop
    /// the inbox so it is never left blocked on a full channel.
    pub fn run<F: Frontend + ?Sized>(
        mut self,
        inbox: &Receiver<UiMessage>,
        frontend: &mut F,
    ) -> crate::error::Result<ExitReason> {
        let ticker = tick(self.tick_rate);

        frontend.draw(&self.state).ui_fatal()?;

        while self.state.is_running() {
            let message = crossbeam::select! {
                recv(inbox) -> msg => msg.unwrap_or(UiMessage::Finished(Err(CopyError::TaskLost))),
                recv(ticker) -> _ => UiMessage::Tick,
            };

            self.state.update(message);
            frontend.draw(&self.state).ui_fatal()?;
        }

        frontend.finish(&self.state).ui_fatal()?;

        let reason = self.state.into_exit_reason();
        tracing::debug!("Render loop stopped: {:?}", reason);
        Ok(reason)
    }
}

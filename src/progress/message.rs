//! Messages delivered to the render loop
//!
//! Everything the loop reacts to arrives through one ordered inbox: copier
//! progress, the copier's final result, and quit requests from the keyboard.
//! Animation ticks come from a timer multiplexed next to it.

use crate::core::{CopyStats, ProgressSink};
use crate::error::CopyError;
use crossbeam::channel::{bounded, Receiver, Sender};

/// Inbox capacity. A full inbox makes the copier wait for the UI.
pub const INBOX_CAPACITY: usize = 64;

/// Message types for render loop communication
#[derive(Debug)]
pub enum UiMessage {
    /// Advance the spinner
    Tick,
    /// Copier progress fraction
    Progress(f64),
    /// The user asked to stop
    QuitRequested,
    /// The copier is done, successfully or not
    Finished(Result<CopyStats, CopyError>),
}

/// Create the bounded render loop inbox
pub fn inbox() -> (Sender<UiMessage>, Receiver<UiMessage>) {
    bounded(INBOX_CAPACITY)
}

/// Forwards copier progress into the render loop inbox.
///
/// Sending blocks while the inbox is full. Once the render loop has gone
/// away, updates are dropped and the copier keeps going.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<UiMessage>,
    disconnected: bool,
}

impl ChannelSink {
    /// Wrap an inbox sender
    pub fn new(tx: Sender<UiMessage>) -> Self {
        Self {
            tx,
            disconnected: false,
        }
    }
}

impl ProgressSink for ChannelSink {
    fn on_progress(&mut self, fraction: f64) {
        if self.disconnected {
            return;
        }
        if self.tx.send(UiMessage::Progress(fraction)).is_err() {
            tracing::debug!("Render loop gone, dropping progress updates");
            self.disconnected = true;
        }
    }
}

/// Sends the copier's result exactly once.
///
/// If the copier unwinds before [`FinishGuard::finish`] is called, dropping
/// the guard reports [`CopyError::TaskLost`] so the render loop never waits
/// on a dead task.
pub struct FinishGuard {
    tx: Option<Sender<UiMessage>>,
}

impl FinishGuard {
    /// Create a guard over an inbox sender
    pub fn new(tx: Sender<UiMessage>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Deliver the result
    pub fn finish(mut self, result: Result<CopyStats, CopyError>) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(UiMessage::Finished(result));
        }
    }
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            tracing::error!("Copy task ended without a result");
            let _ = tx.send(UiMessage::Finished(Err(CopyError::TaskLost)));
        }
    }
}

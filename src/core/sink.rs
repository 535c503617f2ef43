//! Progress observers
//!
//! The copier reports through [`ProgressSink`] and never knows who is
//! listening: the render loop, a test collecting fractions, or nobody.

/// Receives the progress fraction after each chunk
pub trait ProgressSink {
    /// Called with bytes written / total bytes, in `[0.0, 1.0]`
    fn on_progress(&mut self, fraction: f64);
}

impl<F> ProgressSink for F
where
    F: FnMut(f64),
{
    fn on_progress(&mut self, fraction: f64) {
        self(fraction)
    }
}

/// A sink that drops every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_progress(&mut self, _fraction: f64) {}
}

/// A sink that keeps every update, in order
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    /// Fractions in emission order
    pub fractions: Vec<f64>,
}

impl RecordingSink {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Last fraction seen
    pub fn last(&self) -> Option<f64> {
        self.fractions.last().copied()
    }

    /// True if no fraction is smaller than the one before it
    pub fn is_monotonic(&self) -> bool {
        self.fractions.windows(2).all(|w| w[0] <= w[1])
    }
}

impl ProgressSink for RecordingSink {
    fn on_progress(&mut self, fraction: f64) {
        self.fractions.push(fraction);
    }
}

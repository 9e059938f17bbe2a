//! Operator-facing progress reporting.
//!
//! Orchestrators announce each step through a [`ProgressCallback`]. The
//! library never prints; what a line looks like is up to the caller.

/// Receives display lines from orchestrators.
pub trait ProgressCallback: Send + Sync {
    /// A step is starting.
    fn step(&self, message: &str);

    /// A step finished.
    fn success(&self, message: &str);

    /// Something the operator should know about; the operation continues.
    fn warn(&self, message: &str);
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn step(&self, _message: &str) {}
    fn success(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}

//! Progress reporting for long-running jobs (generation, training).
//!
//! Library code reports through [`ProgressCallback`] and never renders
//! anything itself; binaries decide how progress is shown.

use std::sync::Arc;

/// Receives progress updates from a long-running job.
///
/// `Send + Sync` so a single reporter can be shared behind an [`Arc`].
pub trait ProgressCallback: Send + Sync {
    /// Declares the total number of work units.
    fn set_total(&self, total: u64);

    /// Moves to an absolute position.
    fn set_position(&self, pos: u64);

    /// Advances by `delta` units.
    fn inc(&self, delta: u64);

    /// Replaces the status message.
    fn set_message(&self, msg: String);

    /// Marks the job done, leaving `msg` visible.
    fn finish(&self, msg: String);

    /// Marks the job done and removes the indicator.
    fn finish_and_clear(&self);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn set_position(&self, _pos: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

/// A shared [`NullProgress`], for tests and non-interactive callers.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}

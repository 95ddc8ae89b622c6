//! Phase progress for a crawl.
//!
//! Each phase announces how many fetches it will make and ticks once per
//! completed fetch, whether it succeeded or not. The pipeline reports the
//! final record count when all regions are done.

use std::sync::Arc;

/// Receives progress from the discovery, collection, and detail phases.
///
/// Ticks arrive from concurrent fetches, hence `Send + Sync`.
pub trait ProgressCallback: Send + Sync {
    /// Starts a phase of `total` fetches. Position goes back to zero.
    fn set_total(&self, total: u64);

    /// Records `delta` completed fetches.
    fn inc(&self, delta: u64);

    /// Names the current phase, e.g. `"[台北市 (1)] index pages"`.
    fn set_message(&self, msg: String);

    /// Ends the crawl with a closing line.
    fn finish(&self, msg: String);
}

/// Discards all progress. Used when no terminal is attached.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Shared [`NullProgress`], the default for a new [`crate::Crawler`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}

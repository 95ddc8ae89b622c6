//! Reporting sink for recoverable crawl failures.
//!
//! The crawler never aborts a region because one fetch failed. Instead each
//! failure becomes a [`CrawlEvent`] delivered to the injected [`EventSink`],
//! and the pipeline carries on with a safe default.

use std::fmt;
use std::sync::{Arc, Mutex};

use rental_crawl_listing_models::{ListingId, Region};

/// A recoverable failure observed during a crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    /// The first index page could not be fetched; the last page defaulted
    /// to 1.
    DiscoveryFailed {
        /// Region being discovered.
        region: Region,
        /// Failure description.
        error: String,
    },
    /// An index page could not be fetched; it contributed no ids.
    PageFetchFailed {
        /// Region being collected.
        region: Region,
        /// 1-based index page number.
        page: u32,
        /// Failure description.
        error: String,
    },
    /// A detail page could not be fetched; an id-only record was produced.
    DetailFetchFailed {
        /// Listing whose page failed.
        id: ListingId,
        /// Failure description.
        error: String,
    },
}

impl fmt::Display for CrawlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiscoveryFailed { region, error } => {
                write!(f, "[{region}] failed to discover last page: {error}")
            }
            Self::PageFetchFailed {
                region,
                page,
                error,
            } => write!(f, "[{region}] failed to fetch index page {page}: {error}"),
            Self::DetailFetchFailed { id, error } => {
                write!(f, "failed to fetch details for listing {id}: {error}")
            }
        }
    }
}

/// Receives recoverable failures.
///
/// Implementations must be `Send + Sync`; events arrive from concurrent
/// fetches within a phase.
pub trait EventSink: Send + Sync {
    /// Records one event.
    fn report(&self, event: CrawlEvent);
}

/// Writes every event to the `log` facade at `warn` level.
pub struct LogSink;

impl EventSink for LogSink {
    fn report(&self, event: CrawlEvent) {
        log::warn!("{event}");
    }
}

/// Keeps every event in memory. Used by tests and by callers that want to
/// summarize failures after a run.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<CrawlEvent>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the events reported so far.
    #[must_use]
    pub fn events(&self) -> Vec<CrawlEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for MemorySink {
    fn report(&self, event: CrawlEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Returns a shared [`LogSink`].
#[must_use]
pub fn log_sink() -> Arc<dyn EventSink> {
    Arc::new(LogSink)
}

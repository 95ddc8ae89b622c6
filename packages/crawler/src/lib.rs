#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Listing crawl pipeline.
//!
//! A [`Crawler`] runs the three fetch phases for a region: discovering how
//! many index pages exist ([`discover`]), collecting listing ids from every
//! index page ([`collect`]), and fetching each listing's detail page into a
//! record ([`detail`]). [`pipeline::run`] sequences those phases over every
//! configured region and writes the aggregate to the record store in one
//! transaction.
//!
//! Fetch failures never abort a region. They are reported to an
//! [`events::EventSink`] and replaced by a safe default. Only a store
//! failure ends a run with an error.

pub mod collect;
pub mod detail;
pub mod discover;
pub mod events;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod rules;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::Duration;

use rental_crawl_scraper::http::{DEFAULT_REQUEST_TIMEOUT, HttpFetcher};
use rental_crawl_scraper::{IdentityRotator, PageFetcher, ScrapeError};

use crate::events::EventSink;
use crate::progress::ProgressCallback;

/// Default ceiling on concurrent requests within a phase.
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Errors that end a crawl run.
///
/// Recoverable fetch failures never show up here; they are reported as
/// [`events::CrawlEvent`]s instead.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A region's configured markup contains an invalid selector.
    #[error("Invalid markup for region config '{name}': {source}")]
    Markup {
        /// Name of the region config.
        name: String,
        /// Selector parse failure.
        source: ScrapeError,
    },

    /// Writing the batch to the store failed. Nothing was committed.
    #[error("Store error: {0}")]
    Store(#[from] rental_crawl_store::StoreError),
}

/// Tunables for a crawl run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Maximum number of requests in flight within a phase.
    pub concurrency: usize,
    /// Timeout applied to each individual request.
    pub request_timeout: Duration,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Runs crawl phases against a [`PageFetcher`].
///
/// All requests of a phase share the same fetcher (and therefore the same
/// connection pool) and draw a fresh identity each.
pub struct Crawler<F> {
    fetcher: F,
    identities: IdentityRotator,
    concurrency: usize,
    sink: Arc<dyn EventSink>,
    progress: Arc<dyn ProgressCallback>,
}

impl Crawler<HttpFetcher> {
    /// Creates an HTTP crawler configured from `options`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the HTTP client cannot be built.
    pub fn http(options: &CrawlOptions) -> Result<Self, ScrapeError> {
        let fetcher = HttpFetcher::new(options.request_timeout)?;
        Ok(Self::new(fetcher).with_concurrency(options.concurrency))
    }
}

impl<F: PageFetcher> Crawler<F> {
    /// Creates a crawler with the default identity pool, concurrency,
    /// [`events::LogSink`], and no progress reporting.
    #[must_use]
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            identities: IdentityRotator::default(),
            concurrency: DEFAULT_CONCURRENCY,
            sink: events::log_sink(),
            progress: progress::null_progress(),
        }
    }

    /// Sets the concurrency ceiling. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Replaces the identity pool.
    #[must_use]
    pub fn with_identities(mut self, identities: IdentityRotator) -> Self {
        self.identities = identities;
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the progress callback updated by each phase.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Concurrency ceiling.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// The underlying fetcher.
    #[must_use]
    pub const fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetches `url` with a freshly rotated identity.
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let identity = self.identities.identity();
        self.fetcher.fetch_text(url, &identity).await
    }
}

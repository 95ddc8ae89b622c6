#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Page fetching layer for the rental crawler.
//!
//! Provides the [`PageFetcher`] trait, its `reqwest`-backed implementation
//! ([`http::HttpFetcher`]), randomized client identities
//! ([`identity::IdentityRotator`]), and small helpers for pulling text out of
//! parsed HTML ([`html`]).
//!
//! This crate knows nothing about listings or regions. It turns URLs into
//! response bodies and documents into ordered text sequences; the crawler
//! decides what those mean.

pub mod html;
pub mod http;
pub mod identity;

pub use identity::{Identity, IdentityRotator};

/// Errors that can occur while fetching or parsing a page.
///
/// Every variant is recoverable from the crawler's point of view: a failed
/// page costs its own contribution and nothing else.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// The HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// A configured CSS selector could not be parsed.
    #[error("Invalid selector '{selector}': {message}")]
    Selector {
        /// The offending selector.
        selector: String,
        /// Parser error description.
        message: String,
    },
}

impl ScrapeError {
    /// Returns `true` if the failure was a request timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

/// Fetches page bodies.
///
/// One fetcher is shared by every concurrent request of a crawl phase, so
/// implementations must be cheap to call concurrently through `&self`.
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` presenting `identity` and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the request fails, times out, or the
    /// server responds with a non-success status.
    fn fetch_text(
        &self,
        url: &str,
        identity: &Identity,
    ) -> impl std::future::Future<Output = Result<String, ScrapeError>> + Send;
}

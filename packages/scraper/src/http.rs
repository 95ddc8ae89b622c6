//! `reqwest`-backed [`PageFetcher`].

use std::time::Duration;

use crate::{Identity, PageFetcher, ScrapeError};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches pages over HTTP with a shared connection pool.
///
/// Each request carries its own timeout, independent of how long the
/// overall crawl runs.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher with a fresh client and the given per-request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, timeout))
    }

    /// Creates a fetcher around an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str, identity: &Identity) -> Result<String, ScrapeError> {
        log::debug!("GET {url}");

        let mut request = self.client.get(url).timeout(self.timeout);
        for (name, value) in identity.headers() {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

//! Detail page fetching and record extraction.

use futures::stream::{self, StreamExt as _};
use rental_crawl_listing_models::{ListingId, ListingRecord};
use rental_crawl_scraper::{PageFetcher, ScrapeError};

use crate::Crawler;
use crate::events::CrawlEvent;
use crate::rules::SiteRules;

/// Records produced for a batch of listing ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailBatch {
    /// One record per requested id, in completion order.
    pub records: Vec<ListingRecord>,
    /// How many of `records` are id-only fallbacks for failed fetches.
    pub failed: usize,
}

impl<F: PageFetcher> Crawler<F> {
    /// Fetches the detail page for `id` and extracts its record.
    ///
    /// The returned record always carries `id`. If the page cannot be
    /// fetched, the failure is reported and an id-only record is returned.
    pub async fn fetch_detail(&self, id: ListingId, rules: &SiteRules) -> ListingRecord {
        match self.try_fetch_detail(&id, rules).await {
            Ok(record) => record,
            Err(e) => self.detail_fallback(id, &e),
        }
    }

    /// Fetches detail records for every id, at most
    /// [`Crawler::concurrency`] at a time.
    pub async fn fetch_details<I>(&self, ids: I, rules: &SiteRules) -> DetailBatch
    where
        I: IntoIterator<Item = ListingId>,
    {
        let ids: Vec<ListingId> = ids.into_iter().collect();
        self.progress.set_message(format!("[{}] listings", rules.config().name));
        self.progress.set_total(ids.len() as u64);

        let mut results = stream::iter(ids)
            .map(|id| async move {
                let result = self.try_fetch_detail(&id, rules).await;
                (id, result)
            })
            .buffer_unordered(self.concurrency);

        let mut batch = DetailBatch::default();

        while let Some((id, result)) = results.next().await {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    batch.failed += 1;
                    self.detail_fallback(id, &e)
                }
            };
            batch.records.push(record);
            self.progress.inc(1);
        }

        batch
    }

    async fn try_fetch_detail(
        &self,
        id: &ListingId,
        rules: &SiteRules,
    ) -> Result<ListingRecord, ScrapeError> {
        let url = rules.config().detail_page_url(id);
        let body = self.fetch(&url).await?;
        Ok(rules.record(id.clone(), &body))
    }

    fn detail_fallback(&self, id: ListingId, error: &ScrapeError) -> ListingRecord {
        self.sink.report(CrawlEvent::DetailFetchFailed {
            id: id.clone(),
            error: error.to_string(),
        });
        ListingRecord::id_only(id)
    }
}

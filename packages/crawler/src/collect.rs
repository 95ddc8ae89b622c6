//! Listing id collection across index pages.

use std::collections::BTreeSet;

use futures::stream::{self, StreamExt as _};
use rental_crawl_listing_models::{ListingId, Region};
use rental_crawl_scraper::PageFetcher;

use crate::Crawler;
use crate::events::CrawlEvent;
use crate::rules::SiteRules;

impl<F: PageFetcher> Crawler<F> {
    /// Collects the listing ids linked from index pages `1..=last_page`.
    ///
    /// Pages are fetched concurrently, at most [`Crawler::concurrency`] at a
    /// time. A page that fails to fetch is reported and contributes no ids.
    /// Ids appearing on several pages are returned once.
    pub async fn collect_ids(
        &self,
        region: &Region,
        last_page: u32,
        rules: &SiteRules,
    ) -> BTreeSet<ListingId> {
        log::info!(
            "[{region}] Collecting listing ids from {last_page} index pages (concurrency={})",
            self.concurrency
        );
        self.progress.set_message(format!("[{region}] index pages"));
        self.progress.set_total(u64::from(last_page));

        let mut pages = stream::iter(1..=last_page)
            .map(|page| async move {
                let url = rules.config().index_page_url(region, page);
                (page, self.fetch(&url).await)
            })
            .buffer_unordered(self.concurrency);

        let mut ids = BTreeSet::new();

        while let Some((page, result)) = pages.next().await {
            match result {
                Ok(body) => {
                    let found = rules.listing_ids(&body);
                    log::debug!("[{region}] page {page}: {} listing links", found.len());
                    ids.extend(found);
                }
                Err(e) => {
                    self.sink.report(CrawlEvent::PageFetchFailed {
                        region: region.clone(),
                        page,
                        error: e.to_string(),
                    });
                }
            }
            self.progress.inc(1);
        }

        log::info!("[{region}] Collected {} unique listing ids", ids.len());
        ids
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::events::MemorySink;
    use crate::test_support::{StaticFetcher, index_page, site, taipei};

    use super::*;

    #[tokio::test]
    async fn overlapping_pages_are_deduplicated() {
        let rules = site();
        let region = taipei();
        let fetcher = StaticFetcher::new()
            .with_page(
                &rules.config().index_page_url(&region, 1),
                &index_page(&["101", "102"]),
            )
            .with_page(
                &rules.config().index_page_url(&region, 2),
                &index_page(&["102", "103"]),
            );

        let ids = Crawler::new(fetcher).collect_ids(&region, 2, &rules).await;

        let expected: BTreeSet<ListingId> =
            ["101", "102", "103"].into_iter().map(ListingId::from).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn failed_page_contributes_nothing() {
        let rules = site();
        let region = taipei();
        let fetcher = StaticFetcher::new()
            .with_page(
                &rules.config().index_page_url(&region, 1),
                &index_page(&["101"]),
            )
            .with_page(
                &rules.config().index_page_url(&region, 3),
                &index_page(&["301"]),
            );
        let sink = Arc::new(MemorySink::new());

        let ids = Crawler::new(fetcher)
            .with_sink(sink.clone())
            .collect_ids(&region, 3, &rules)
            .await;

        assert_eq!(ids.len(), 2);
        assert_eq!(
            sink.events(),
            vec![CrawlEvent::PageFetchFailed {
                region: region.clone(),
                page: 2,
                error: format!(
                    "HTTP 404 from {}",
                    rules.config().index_page_url(&region, 2)
                ),
            }]
        );
    }

    #[tokio::test]
    async fn every_page_is_requested_once() {
        let rules = site();
        let region = taipei();
        let crawler = Crawler::new(StaticFetcher::new()).with_sink(Arc::new(MemorySink::new()));

        crawler.collect_ids(&region, 7, &rules).await;

        let mut requested = crawler.fetcher().requested_urls();
        requested.sort();
        let mut expected: Vec<String> = (1..=7)
            .map(|page| rules.config().index_page_url(&region, page))
            .collect();
        expected.sort();
        assert_eq!(requested, expected);
    }

    #[tokio::test]
    async fn in_flight_requests_never_exceed_concurrency() {
        let rules = site();
        let region = taipei();
        let mut fetcher = StaticFetcher::new().with_delay(Duration::from_millis(10));
        for page in 1..=40 {
            fetcher = fetcher.with_page(
                &rules.config().index_page_url(&region, page),
                &index_page(&[&page.to_string()]),
            );
        }

        let crawler = Crawler::new(fetcher).with_concurrency(4);
        let ids = crawler.collect_ids(&region, 40, &rules).await;

        assert_eq!(ids.len(), 40);
        assert!(crawler.fetcher().max_in_flight() <= 4);
        assert!(crawler.fetcher().max_in_flight() > 1);
    }

    #[tokio::test]
    async fn zero_pages_yields_empty_set() {
        let crawler = Crawler::new(StaticFetcher::new());
        let ids = crawler.collect_ids(&taipei(), 0, &site()).await;
        assert!(ids.is_empty());
        assert!(crawler.fetcher().requested_urls().is_empty());
    }
}

//! Pagination discovery.

use rental_crawl_listing_models::Region;
use rental_crawl_scraper::PageFetcher;

use crate::Crawler;
use crate::events::CrawlEvent;
use crate::rules::SiteRules;

impl<F: PageFetcher> Crawler<F> {
    /// Returns the number of index pages for `region`.
    ///
    /// Fetches index page 1 and takes the highest number in its pagination
    /// control. Never returns less than 1: when the fetch fails the failure
    /// is reported and 1 is returned so the region still gets scanned.
    pub async fn discover_last_page(&self, region: &Region, rules: &SiteRules) -> u32 {
        let url = rules.config().index_page_url(region, 1);

        match self.fetch(&url).await {
            Ok(body) => {
                let last_page = rules.last_page(&body);
                log::debug!("[{region}] pagination ends at page {last_page}");
                last_page
            }
            Err(e) => {
                self.sink.report(CrawlEvent::DiscoveryFailed {
                    region: region.clone(),
                    error: e.to_string(),
                });
                1
            }
        }
    }
}

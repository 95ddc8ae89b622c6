//! Crawl orchestration.
//!
//! Runs discovery, collection, and detail extraction for every region in
//! turn, then writes everything that was gathered to the store as a single
//! batch.

use rental_crawl_listing_models::{ListingRecord, Region, RegionConfig};
use rental_crawl_scraper::PageFetcher;
use rental_crawl_store::RecordStore;

use crate::rules::SiteRules;
use crate::{Crawler, PipelineError};

/// What one region contributed to a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSummary {
    pub region: Region,
    /// Last index page as discovered.
    pub last_page: u32,
    /// Unique listing ids collected.
    pub listing_ids: usize,
    /// Records produced, including id-only ones.
    pub records: usize,
    /// Detail pages that could not be fetched.
    pub failed_details: usize,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub regions: Vec<RegionSummary>,
    /// Rows written to the store.
    pub stored: usize,
}

impl<F: PageFetcher> Crawler<F> {
    /// Runs all three phases for one region and returns its records.
    pub async fn crawl_region(
        &self,
        region: &Region,
        rules: &SiteRules,
    ) -> (RegionSummary, Vec<ListingRecord>) {
        log::info!("[{region}] Starting crawl");

        let last_page = self.discover_last_page(region, rules).await;
        let ids = self.collect_ids(region, last_page, rules).await;
        let listing_ids = ids.len();
        let batch = self.fetch_details(ids, rules).await;

        let summary = RegionSummary {
            region: region.clone(),
            last_page,
            listing_ids,
            records: batch.records.len(),
            failed_details: batch.failed,
        };

        log::info!(
            "[{region}] Done: {} pages, {} listings, {} detail failures",
            summary.last_page,
            summary.records,
            summary.failed_details
        );

        (summary, batch.records)
    }
}

/// Crawls every region of every config and stores the combined records.
///
/// Regions are processed one after another; within a region each phase
/// finishes before the next starts. All records are written in one
/// transaction at the end, so a failed write stores nothing.
///
/// # Errors
///
/// * [`PipelineError::Markup`] if a config has an invalid selector. Checked
///   before anything is fetched.
/// * [`PipelineError::Store`] if the final write fails.
pub async fn run<F: PageFetcher>(
    crawler: &Crawler<F>,
    configs: &[RegionConfig],
    store: &mut RecordStore,
) -> Result<RunSummary, PipelineError> {
    let compiled = configs
        .iter()
        .map(|config| {
            SiteRules::compile(config.clone()).map_err(|source| PipelineError::Markup {
                name: config.name.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut summary = RunSummary::default();
    let mut records = Vec::new();

    for rules in &compiled {
        for region in rules.config().regions() {
            let (region_summary, region_records) = crawler.crawl_region(&region, rules).await;
            summary.regions.push(region_summary);
            records.extend(region_records);
        }
    }

    crawler
        .progress
        .finish(format!("Crawled {} listings", records.len()));

    summary.stored = store.upsert_all(&records).map_err(|e| {
        log::error!("Failed to store {} listings: {e}", records.len());
        e
    })?;

    Ok(summary)
}

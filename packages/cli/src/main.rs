#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the rental listing crawler.
//!
//! Uses `indicatif-log-bridge` (via [`rental_crawl_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and the crawl progress bar never fight for the terminal.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use rental_crawl_cli_utils::{IndicatifProgress, init_logger};
use rental_crawl_crawler::pipeline::{self, RunSummary};
use rental_crawl_crawler::registry::{all_region_configs, enabled_region_configs};
use rental_crawl_crawler::{CrawlOptions, Crawler, DEFAULT_CONCURRENCY};
use rental_crawl_store::{RecordStore, paths};

#[derive(Parser)]
#[command(name = "rental_crawl", about = "Rental listing crawler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the configured regions and store every listing found
    Crawl {
        /// Comma-separated region names or ids to crawl (overrides
        /// `RENTAL_CRAWL_REGIONS` env var)
        #[arg(long)]
        regions: Option<String>,
        /// Database file (default: `data/listings.sqlite3`)
        #[arg(long)]
        db: Option<PathBuf>,
        /// Maximum number of requests in flight per phase
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
        /// Per-request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
    },
    /// List all configured regions
    Regions,
    /// Print stored listings as JSON lines
    Show {
        /// Database file (default: `data/listings.sqlite3`)
        #[arg(long)]
        db: Option<PathBuf>,
        /// Maximum number of listings to print
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl {
            regions,
            db,
            concurrency,
            timeout_secs,
        } => {
            let configs = enabled_region_configs(regions);
            if configs.is_empty() {
                log::warn!("No regions selected; nothing to crawl");
                return Ok(());
            }

            let db = db.unwrap_or_else(paths::listings_db_path);
            let mut store = RecordStore::open(&db)?;

            let options = CrawlOptions {
                concurrency,
                request_timeout: Duration::from_secs(timeout_secs),
            };
            let crawler = Crawler::http(&options)?
                .with_progress(IndicatifProgress::crawl_bar(&multi, "Crawling"));

            log::info!(
                "Crawling {} region config(s) into {}",
                configs.len(),
                db.display()
            );
            let start = Instant::now();

            let summary = tokio::select! {
                result = pipeline::run(&crawler, &configs, &mut store) => result?,
                _ = tokio::signal::ctrl_c() => {
                    log::warn!("Interrupted; nothing was stored");
                    return Err("crawl interrupted".into());
                }
            };

            print_summary(&summary, start.elapsed());
        }
        Commands::Regions => {
            println!("{:<12} {:<8} INDEX URL", "NAME", "ID");
            println!("{}", "-".repeat(60));
            for config in all_region_configs() {
                for region in config.regions() {
                    println!(
                        "{:<12} {:<8} {}",
                        region.name,
                        region.id.to_string(),
                        config.index_page_url(&region, 1)
                    );
                }
            }
        }
        Commands::Show { db, limit } => {
            let db = db.unwrap_or_else(paths::listings_db_path);
            let store = RecordStore::open(&db)?;

            for stored in store.list(limit)? {
                let mut row = serde_json::to_value(&stored.record)?;
                if let Some(fields) = row.as_object_mut() {
                    fields.insert(
                        "timestamp".to_string(),
                        stored.written_at.to_rfc3339().into(),
                    );
                }
                println!("{row}");
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary, elapsed: Duration) {
    println!();
    println!(
        "{:<16} {:>6} {:>9} {:>8} {:>7}",
        "REGION", "PAGES", "LISTINGS", "RECORDS", "FAILED"
    );
    println!("{}", "-".repeat(50));
    for region in &summary.regions {
        println!(
            "{:<16} {:>6} {:>9} {:>8} {:>7}",
            region.region.to_string(),
            region.last_page,
            region.listing_ids,
            region.records,
            region.failed_details
        );
    }
    println!(
        "\nStored {} listings in {:.1}s",
        summary.stored,
        elapsed.as_secs_f64()
    );
}

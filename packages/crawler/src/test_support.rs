//! In-memory fetcher and fixtures shared by the crawler tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rental_crawl_listing_models::{Markup, Region, RegionConfig, RegionToken};
use rental_crawl_scraper::{Identity, PageFetcher, ScrapeError};

use crate::rules::SiteRules;

/// Serves canned bodies by exact URL; unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    pages: BTreeMap<String, String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requested: Mutex<Vec<String>>,
    user_agents: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_owned(), body.to_owned());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    /// User agents presented, one per request, in arrival order.
    pub fn user_agents(&self) -> Vec<String> {
        self.user_agents.lock().unwrap().clone()
    }
}

impl PageFetcher for StaticFetcher {
    async fn fetch_text(&self, url: &str, identity: &Identity) -> Result<String, ScrapeError> {
        self.requested.lock().unwrap().push(url.to_owned());
        self.user_agents
            .lock()
            .unwrap()
            .push(identity.user_agent.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::Status {
                url: url.to_owned(),
                status: 404,
            })
    }
}

pub fn config() -> RegionConfig {
    RegionConfig {
        name: "台北市".to_string(),
        region_ids: vec![RegionToken::Number(1)],
        index_url: "https://example.com/list?region={region}&page={page}".to_string(),
        query_suffix: None,
        detail_url: "https://example.com/rent/{id}".to_string(),
        markup: Markup::default(),
    }
}

pub fn site() -> SiteRules {
    SiteRules::compile(config()).unwrap()
}

pub fn taipei() -> Region {
    config().regions().remove(0)
}

/// Index page with one listing link per id and a single pagination item.
pub fn index_page(ids: &[&str]) -> String {
    let links: String = ids
        .iter()
        .map(|id| format!(r#"<a class="link v-middle" href="/rent/{id}">{id}</a>"#))
        .collect();
    format!(r#"<html><body><ul><li data-v-779297d8="">1</li></ul>{links}</body></html>"#)
}

/// Detail page with every field present.
pub fn detail_page() -> String {
    r#"<html><head>
        <script>window.map = { latitude: 25.03, longitude: 121.56 };</script>
    </head><body>
        <span data-v-588d0396="">屋主: 王先生</span>
        <span data-v-588d0396="">35,000元/月</span>
        <span data-v-588d0396="">0912-345-678</span>
        <div class="address">台北市信義區松仁路100號</div>
        <div class="place">信義區</div>
        <div class="info">30坪</div>
        <div class="info">5F/12F</div>
        <div class="info">辦公</div>
    </body></html>"#
        .to_string()
}

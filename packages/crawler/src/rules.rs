//! Extraction rules for index and detail pages.
//!
//! [`SiteRules`] compiles a region's [`Markup`] selectors once and applies
//! them to response bodies. Documents are parsed and dropped inside each
//! call, so nothing non-`Send` outlives a single extraction.
//!
//! Every rule that picks "the first" of something works on an ordered
//! `Vec` of node texts collected in document order.

use std::sync::LazyLock;

use regex::Regex;
use rental_crawl_listing_models::{
    Coordinates, ListingId, ListingRecord, Markup, RegionConfig, UnitInfo,
};
use rental_crawl_scraper::ScrapeError;
use rental_crawl_scraper::html::{first_text, parse_selector, select_attrs, select_texts};
use scraper::{Html, Selector};

/// Owner or agent line: a role label, a colon, then free text.
static OWNER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:屋主|代理人|仲介): .+").expect("valid regex"));

/// Monthly rent with thousands separators, e.g. `35,000元/月`.
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}(?:,\d{3})*元/月").expect("valid regex"));

/// Mobile (`0912-345-678`) or landline (`02-12345678`, `02-1234567`) number.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{4}-\d{3}-\d{3}|\d{2}-\d{8}|\d{2}-\d{7})").expect("valid regex")
});

/// `latitude: <number>, longitude: <number>` literal inside a script body.
static COORDINATES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"latitude\s*:\s*(-?[\d.]+)\s*,\s*longitude\s*:\s*(-?[\d.]+)")
        .expect("valid regex")
});

/// Number of info nodes that make up the size/floor/type triple.
const INFO_NODES: usize = 3;

/// A region's URL templates plus its compiled selectors.
#[derive(Debug, Clone)]
pub struct SiteRules {
    config: RegionConfig,
    pagination: Selector,
    listing_link: Selector,
    labels: Selector,
    address: Selector,
    place: Selector,
    info: Selector,
    script: Selector,
}

impl SiteRules {
    /// Compiles the selectors in `config.markup`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Selector`] if any configured selector is not
    /// valid CSS.
    pub fn compile(config: RegionConfig) -> Result<Self, ScrapeError> {
        let Markup {
            pagination,
            listing_link,
            labels,
            address,
            place,
            info,
            script,
        } = &config.markup;

        Ok(Self {
            pagination: parse_selector(pagination)?,
            listing_link: parse_selector(listing_link)?,
            labels: parse_selector(labels)?,
            address: parse_selector(address)?,
            place: parse_selector(place)?,
            info: parse_selector(info)?,
            script: parse_selector(script)?,
            config,
        })
    }

    /// The configuration these rules were compiled from.
    #[must_use]
    pub const fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Highest page number shown in the pagination control of an index
    /// page, or 1 if there is none.
    #[must_use]
    pub fn last_page(&self, body: &str) -> u32 {
        let document = Html::parse_document(body);
        max_page_number(&select_texts(&document, &self.pagination))
    }

    /// Listing ids linked from an index page, in document order.
    #[must_use]
    pub fn listing_ids(&self, body: &str) -> Vec<ListingId> {
        let document = Html::parse_document(body);
        select_attrs(&document, &self.listing_link, "href")
            .iter()
            .filter_map(|href| listing_id_from_href(href))
            .collect()
    }

    /// Builds the record for `id` from its detail page.
    #[must_use]
    pub fn record(&self, id: ListingId, body: &str) -> ListingRecord {
        let document = Html::parse_document(body);

        let labels = label_fields(&select_texts(&document, &self.labels));

        ListingRecord {
            id,
            owner: labels.owner,
            price: labels.price,
            phone: labels.phone,
            location: first_text(&document, &self.address),
            place: first_text(&document, &self.place),
            info: unit_info(&select_texts(&document, &self.info)),
            coordinates: find_coordinates(&select_texts(&document, &self.script)),
        }
    }
}

/// Largest all-digit token in `texts`, never less than 1.
#[must_use]
pub fn max_page_number<S: AsRef<str>>(texts: &[S]) -> u32 {
    texts
        .iter()
        .map(S::as_ref)
        .filter(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|t| t.parse::<u32>().ok())
        .max()
        .unwrap_or(1)
        .max(1)
}

/// Last non-empty path segment of a detail link, ignoring any query string
/// or fragment.
#[must_use]
pub fn listing_id_from_href(href: &str) -> Option<ListingId> {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(ListingId::from)
}

/// Owner, price, and phone as found among the labeled text nodes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LabelFields {
    /// First owner/agent line.
    pub owner: Option<String>,
    /// First monthly rent.
    pub price: Option<String>,
    /// First phone number.
    pub phone: Option<String>,
}

/// Assigns labeled texts to fields.
///
/// Texts are visited in order. Each one is offered to the still-empty fields
/// in the order owner, price, phone, and is claimed by the first whose
/// pattern matches from the start of the text. A text fills at most one
/// field and the earliest matching text wins.
#[must_use]
pub fn label_fields<S: AsRef<str>>(texts: &[S]) -> LabelFields {
    let mut fields = LabelFields::default();

    for text in texts.iter().map(S::as_ref) {
        if fields.owner.is_some() && fields.price.is_some() && fields.phone.is_some() {
            break;
        }

        if fields.owner.is_none() && OWNER_RE.is_match(text) {
            fields.owner = Some(text.to_owned());
        } else if fields.price.is_none() && PRICE_RE.is_match(text) {
            fields.price = Some(text.to_owned());
        } else if fields.phone.is_none() && PHONE_RE.is_match(text) {
            fields.phone = Some(text.to_owned());
        }
    }

    fields
}

/// Size/floor/type from the first three info texts, or `None` if fewer than
/// three exist.
#[must_use]
pub fn unit_info<S: AsRef<str>>(texts: &[S]) -> Option<UnitInfo> {
    let [squaremeter, floor, kind] = texts.get(..INFO_NODES)? else {
        return None;
    };

    Some(UnitInfo {
        squaremeter: squaremeter.as_ref().to_owned(),
        floor: floor.as_ref().to_owned(),
        kind: kind.as_ref().to_owned(),
    })
}

/// First latitude/longitude literal across `scripts`, scanned in order.
#[must_use]
pub fn find_coordinates<S: AsRef<str>>(scripts: &[S]) -> Option<Coordinates> {
    scripts.iter().find_map(|script| {
        let captures = COORDINATES_RE.captures(script.as_ref())?;
        Some(Coordinates {
            latitude: captures[1].to_owned(),
            longitude: captures[2].to_owned(),
        })
    })
}

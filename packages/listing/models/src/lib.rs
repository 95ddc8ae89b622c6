#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region configuration types and the canonical listing record format.
//!
//! Every crawled listing ends up as a [`ListingRecord`]. Regions and the URL
//! templates used to reach them are described by [`RegionConfig`], which is
//! deserialized from the embedded TOML region files.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a region as the listing site knows it.
///
/// The site uses small integers, but nothing in the crawler depends on that,
/// so opaque string tokens are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegionToken {
    /// Numeric region id (e.g. `1` for Taipei City).
    Number(u64),
    /// Opaque region token.
    Text(String),
}

impl fmt::Display for RegionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A single region to crawl: the id used in index queries plus the display
/// name of the configuration it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// Region id substituted into the index URL template.
    pub id: RegionToken,
    /// Human-readable name (e.g. `"台北市"`).
    pub name: String,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Opaque listing identifier taken from the last path segment of a detail
/// link.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    /// Wraps a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListingId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ListingId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Size, floor, and property type of a unit.
///
/// These three values are read from the same group of nodes on the detail
/// page and are only ever present together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInfo {
    /// Floor area as displayed (e.g. `"30坪"`).
    pub squaremeter: String,
    /// Floor as displayed (e.g. `"5F/12F"`).
    pub floor: String,
    /// Property type as displayed (e.g. `"辦公"`).
    #[serde(rename = "type")]
    pub kind: String,
}

/// Latitude/longitude pair exactly as found in the page scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude literal.
    pub latitude: String,
    /// Longitude literal.
    pub longitude: String,
}

/// A listing parsed from its detail page.
///
/// Only `id` is guaranteed. Every other field is filled independently and
/// stays `None` when the page did not contain it or could not be fetched.
///
/// Serializes flat, one key per `listings` column (`type` for the unit
/// kind), with `null` for missing values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FlatListing", into = "FlatListing")]
pub struct ListingRecord {
    /// Listing identifier (primary key in the store).
    pub id: ListingId,
    /// Owner or agent line (e.g. `"屋主: 王先生"`).
    pub owner: Option<String>,
    /// Monthly rent as displayed (e.g. `"35,000元/月"`).
    pub price: Option<String>,
    /// Street address.
    pub location: Option<String>,
    /// District / area label.
    pub place: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Size, floor, and type.
    pub info: Option<UnitInfo>,
    /// Map coordinates.
    pub coordinates: Option<Coordinates>,
}

impl ListingRecord {
    /// Creates a record carrying only its identifier. Used when the detail
    /// page could not be fetched.
    #[must_use]
    pub const fn id_only(id: ListingId) -> Self {
        Self {
            id,
            owner: None,
            price: None,
            location: None,
            place: None,
            phone: None,
            info: None,
            coordinates: None,
        }
    }

    /// Returns `true` if nothing beyond the identifier was extracted.
    #[must_use]
    pub const fn is_id_only(&self) -> bool {
        self.owner.is_none()
            && self.price.is_none()
            && self.location.is_none()
            && self.place.is_none()
            && self.phone.is_none()
            && self.info.is_none()
            && self.coordinates.is_none()
    }

    /// Floor area, if the unit info was found.
    #[must_use]
    pub fn squaremeter(&self) -> Option<&str> {
        self.info.as_ref().map(|i| i.squaremeter.as_str())
    }

    /// Floor, if the unit info was found.
    #[must_use]
    pub fn floor(&self) -> Option<&str> {
        self.info.as_ref().map(|i| i.floor.as_str())
    }

    /// Property type, if the unit info was found.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.info.as_ref().map(|i| i.kind.as_str())
    }

    /// Latitude literal, if coordinates were found.
    #[must_use]
    pub fn latitude(&self) -> Option<&str> {
        self.coordinates.as_ref().map(|c| c.latitude.as_str())
    }

    /// Longitude literal, if coordinates were found.
    #[must_use]
    pub fn longitude(&self) -> Option<&str> {
        self.coordinates.as_ref().map(|c| c.longitude.as_str())
    }
}

/// Column-shaped wire form of [`ListingRecord`].
#[derive(Serialize, Deserialize)]
struct FlatListing {
    id: ListingId,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    place: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    squaremeter: Option<String>,
    #[serde(default)]
    floor: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    latitude: Option<String>,
    #[serde(default)]
    longitude: Option<String>,
}

impl From<ListingRecord> for FlatListing {
    fn from(record: ListingRecord) -> Self {
        let (squaremeter, floor, kind) = match record.info {
            Some(UnitInfo {
                squaremeter,
                floor,
                kind,
            }) => (Some(squaremeter), Some(floor), Some(kind)),
            None => (None, None, None),
        };
        let (latitude, longitude) = match record.coordinates {
            Some(Coordinates {
                latitude,
                longitude,
            }) => (Some(latitude), Some(longitude)),
            None => (None, None),
        };

        Self {
            id: record.id,
            owner: record.owner,
            price: record.price,
            location: record.location,
            place: record.place,
            phone: record.phone,
            squaremeter,
            floor,
            kind,
            latitude,
            longitude,
        }
    }
}

impl From<FlatListing> for ListingRecord {
    /// A partial triple or a lone coordinate is dropped.
    fn from(flat: FlatListing) -> Self {
        let info = match (flat.squaremeter, flat.floor, flat.kind) {
            (Some(squaremeter), Some(floor), Some(kind)) => Some(UnitInfo {
                squaremeter,
                floor,
                kind,
            }),
            _ => None,
        };
        let coordinates = match (flat.latitude, flat.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Self {
            id: flat.id,
            owner: flat.owner,
            price: flat.price,
            location: flat.location,
            place: flat.place,
            phone: flat.phone,
            info,
            coordinates,
        }
    }
}

// ── Region configuration ─────────────────────────────────────────────────

/// CSS selectors describing where each piece of data lives in the site's
/// markup.
///
/// Defaults match the current markup of the listing site. The `data-v-*`
/// attributes are generated by the site's frontend build and change when it
/// is redeployed, so each region file may override them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Markup {
    /// Pagination control items on an index page.
    pub pagination: String,
    /// Anchors linking to listing detail pages on an index page.
    pub listing_link: String,
    /// Labeled text nodes holding owner, price, and phone on a detail page.
    pub labels: String,
    /// Address node on a detail page.
    pub address: String,
    /// District node on a detail page.
    pub place: String,
    /// Size/floor/type nodes on a detail page.
    pub info: String,
    /// Script bodies scanned for coordinates.
    pub script: String,
}

impl Default for Markup {
    fn default() -> Self {
        Self {
            pagination: "li[data-v-779297d8]".to_owned(),
            listing_link: "a.link.v-middle".to_owned(),
            labels: "span[data-v-588d0396]".to_owned(),
            address: "div.address".to_owned(),
            place: "div.place".to_owned(),
            info: "div.info".to_owned(),
            script: "script".to_owned(),
        }
    }
}

/// A named group of regions sharing the same index and detail URL templates.
///
/// Loaded from TOML. `index_url` must contain `{page}` and `{region}`
/// placeholders; `detail_url` must contain `{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegionConfig {
    /// Display name (e.g. `"台北市"`).
    pub name: String,
    /// Region ids crawled under this name.
    pub region_ids: Vec<RegionToken>,
    /// Index page URL template.
    pub index_url: String,
    /// Extra query string appended verbatim to every index URL.
    #[serde(default)]
    pub query_suffix: Option<String>,
    /// Detail page URL template.
    pub detail_url: String,
    /// Selector overrides.
    #[serde(default)]
    pub markup: Markup,
}

impl RegionConfig {
    /// Returns one [`Region`] per configured id, in configuration order.
    #[must_use]
    pub fn regions(&self) -> Vec<Region> {
        self.region_ids
            .iter()
            .map(|id| Region {
                id: id.clone(),
                name: self.name.clone(),
            })
            .collect()
    }

    /// Builds the URL of index page `page` for `region`.
    #[must_use]
    pub fn index_page_url(&self, region: &Region, page: u32) -> String {
        let mut url = self
            .index_url
            .replace("{region}", &region.id.to_string())
            .replace("{page}", &page.to_string());
        if let Some(suffix) = &self.query_suffix {
            url.push_str(suffix);
        }
        url
    }

    /// Builds the detail page URL for a listing.
    #[must_use]
    pub fn detail_page_url(&self, id: &ListingId) -> String {
        self.detail_url.replace("{id}", id.as_str())
    }
}

//! Region registry. Loads every region config from embedded TOML.
//!
//! Each `.toml` file in `packages/crawler/regions/` is baked into the binary
//! at compile time via [`include_str!`]. Adding a region means adding a file
//! and listing it below.

use rental_crawl_listing_models::RegionConfig;

/// Environment variable consulted when no `--regions` filter is given.
pub const REGIONS_ENV_VAR: &str = "RENTAL_CRAWL_REGIONS";

/// TOML configs embedded at compile time.
const REGION_TOMLS: &[(&str, &str)] = &[
    ("taipei", include_str!("../regions/taipei.toml")),
    ("new_taipei", include_str!("../regions/new_taipei.toml")),
];

/// Parses a region config from a TOML string.
///
/// # Errors
///
/// Returns the TOML error message if the config is malformed.
pub fn parse_region_toml(toml_str: &str) -> Result<RegionConfig, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}

/// Returns all configured regions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded, so this
/// fails on the first run of any build that breaks one).
#[must_use]
pub fn all_region_configs() -> Vec<RegionConfig> {
    REGION_TOMLS
        .iter()
        .map(|(file, toml)| {
            parse_region_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {file}.toml: {e}"))
        })
        .collect()
}

/// Returns the region configs to crawl, filtered by the `--regions` CLI flag
/// or the [`REGIONS_ENV_VAR`] environment variable. If neither is set, every
/// configured region is returned.
#[must_use]
pub fn enabled_region_configs(cli_filter: Option<String>) -> Vec<RegionConfig> {
    let filter = cli_filter.or_else(|| std::env::var(REGIONS_ENV_VAR).ok());

    let all = all_region_configs();

    let Some(filter_str) = filter else {
        return all;
    };

    let tokens: Vec<&str> = filter_str
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    let selected = select_regions(all, &tokens);

    if selected.is_empty() {
        log::warn!(
            "No matching regions found for filter {:?}. Available: {}",
            tokens,
            all_region_configs()
                .iter()
                .flat_map(RegionConfig::regions)
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    selected
}

/// Narrows `configs` to the ones named by `tokens`.
///
/// A token equal to a config's name keeps the whole config. Otherwise a
/// token equal to one of its region ids keeps just that id. Configs left
/// with no ids are dropped.
#[must_use]
pub fn select_regions(configs: Vec<RegionConfig>, tokens: &[&str]) -> Vec<RegionConfig> {
    configs
        .into_iter()
        .filter_map(|mut config| {
            if tokens.contains(&config.name.as_str()) {
                return Some(config);
            }
            config
                .region_ids
                .retain(|id| tokens.contains(&id.to_string().as_str()));
            (!config.region_ids.is_empty()).then_some(config)
        })
        .collect()
}

//! Helpers for reading text out of parsed HTML documents.
//!
//! Results are always returned in document order; extraction rules
//! downstream rely on first-match semantics.

use scraper::{ElementRef, Html, Selector};

use crate::ScrapeError;

/// Parses a CSS selector string, returning a [`ScrapeError`] on failure.
///
/// # Errors
///
/// Returns [`ScrapeError::Selector`] if `selector` is not valid CSS.
pub fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_owned(),
        message: e.to_string(),
    })
}

/// Concatenates all text beneath `element` and trims surrounding whitespace.
#[must_use]
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

/// Returns the trimmed text of every element matching `selector`, in
/// document order.
#[must_use]
pub fn select_texts(document: &Html, selector: &Selector) -> Vec<String> {
    document.select(selector).map(element_text).collect()
}

/// Returns the trimmed text of the first element matching `selector`.
#[must_use]
pub fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).next().map(element_text)
}

/// Returns the value of `attr` for every matching element that has it, in
/// document order.
#[must_use]
pub fn select_attrs(document: &Html, selector: &Selector, attr: &str) -> Vec<String> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr(attr))
        .map(str::to_owned)
        .collect()
}

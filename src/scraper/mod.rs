//! Page classification and structured extraction
//!
//! This module turns raw statutes pages into typed results:
//! - Classifying a page into one of the four known layouts
//! - Extracting frontier links from the three table layouts
//! - Extracting a `Statute` with its subdivisions from a section page
//!
//! Parsing is synchronous and works on the page text, so no parsed document is
//! ever held across an await point.

mod classify;
mod statute;
mod tables;

pub use classify::classify;
pub use statute::{extract_statute, extract_subdivision, SubdivisionOutcome};
pub use tables::extract_table_urls;

use crate::model::{PageKind, Statute};
use crate::url::{canonical_origin, DEFAULT_ORIGIN};
use crate::UrlError;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Errors raised while classifying or extracting a page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    /// The page matches none of the known layouts
    #[error("Classification error: {0}")]
    Classification(String),

    /// The page matched a layout but its structure is missing or inconsistent
    #[error("Extraction format error: {0}")]
    Format(String),
}

/// Result type for scraping operations
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// Classifier and extractor seam used by the scrape orchestrator
pub trait PageScraper: Send + Sync {
    /// Determines the layout of a page
    fn classify(&self, html: &str) -> ScrapeResult<PageKind>;

    /// Extracts absolute frontier URLs from a table page
    fn extract_urls(&self, html: &str, kind: PageKind) -> ScrapeResult<Vec<String>>;

    /// Extracts the statute from a section page
    fn extract_statute(&self, html: &str) -> ScrapeResult<Statute>;
}

/// Scraper for the revisor statutes site layouts
#[derive(Debug, Clone)]
pub struct RevisorScraper {
    origin: Url,
}

impl RevisorScraper {
    /// Creates a scraper that resolves links against the given origin
    pub fn new(origin: Url) -> Self {
        Self { origin }
    }

    /// Creates a scraper for an origin given as text
    pub fn with_origin(origin: &str) -> Result<Self, UrlError> {
        Ok(Self::new(canonical_origin(origin)?))
    }

    /// Creates a scraper for the canonical statutes site
    pub fn for_default_origin() -> Result<Self, UrlError> {
        Self::with_origin(DEFAULT_ORIGIN)
    }

    /// The origin used for link normalization
    pub fn origin(&self) -> &Url {
        &self.origin
    }
}

impl PageScraper for RevisorScraper {
    fn classify(&self, html: &str) -> ScrapeResult<PageKind> {
        classify(&Html::parse_document(html))
    }

    fn extract_urls(&self, html: &str, kind: PageKind) -> ScrapeResult<Vec<String>> {
        extract_table_urls(&Html::parse_document(html), kind, &self.origin)
    }

    fn extract_statute(&self, html: &str) -> ScrapeResult<Statute> {
        extract_statute(&Html::parse_document(html))
    }
}

/// Parses a CSS selector, reporting failures as format errors
pub(crate) fn selector(css: &str) -> ScrapeResult<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Format(format!("bad selector '{}': {}", css, e)))
}

/// Collects the text of an element with surrounding whitespace trimmed
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Iterates the direct child elements of an element with the given tag name
pub(crate) fn child_elements<'a>(
    element: ElementRef<'a>,
    tag: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == tag)
}

/// Returns true if the element carries the given class
pub(crate) fn has_class(element: &ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

//! URL handling module for Statute-Crawler
//!
//! This module provides normalization of links found on statutes pages into
//! absolute URLs on the canonical site origin, and the encoding of URLs into
//! store-safe raw page keys.

mod normalize;
mod raw_key;

// Re-export main functions
pub use normalize::{canonical_origin, normalize_url};
pub use raw_key::{raw_key_for_url, url_for_raw_key, RAW_KEY_PREFIX};

/// Canonical origin of the statutes site
pub const DEFAULT_ORIGIN: &str = "https://www.revisor.mn.gov";

/// Starting point of a fresh crawl when no seeds are given
pub const DEFAULT_SEED_URL: &str = "https://www.revisor.mn.gov/statutes/";

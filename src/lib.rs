//! Statute-Crawler: a polite crawler and scraper for a statutory-code website
//!
//! This crate crawls the statutes section of a legislative revisor site, classifies
//! each fetched page into one of four known layouts, and turns statute pages into
//! retrievable text chunks. Table pages feed newly discovered links back into the
//! crawl frontier.

pub mod chunks;
pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod scraper;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Statute-Crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("Scrape error: {0}")]
    Scrape(#[from] scraper::ScrapeError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Non-success status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Timed out during {operation}")]
    Timeout { operation: &'static str },

    #[error("Failed to enqueue {failed} of {total} URLs extracted from {key}")]
    PartialEnqueue {
        key: String,
        failed: usize,
        total: usize,
    },

    #[error("Unsupported page kind: {0}")]
    UnsupportedPageKind(model::PageKind),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Malformed raw page key: {0}")]
    Malformed(String),
}

/// Result type alias for Statute-Crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use chunks::build_chunks;
pub use config::Config;
pub use model::{Chunk, PageKind, QueueMessage, Statute, Subdivision};
pub use url::{normalize_url, raw_key_for_url};

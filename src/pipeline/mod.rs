//! Scrape pipeline
//!
//! `scrape_page` turns one stored raw page into frontier entries or chunks.
//! `ScrapeWorker` drives it from the raw-event queue.

mod orchestrator;
mod worker;

pub use orchestrator::{scrape_page, ScrapeOutcome};
pub use worker::{ScrapeStep, ScrapeWorker};

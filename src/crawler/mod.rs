//! Crawler module for web page fetching and crawl-cycle control
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `WebFetcher` seam
//! - Politeness pacing between requests
//! - Cooperative cancellation
//! - The crawl loop and the trigger/reset that starts a crawl cycle

mod crawl_loop;
mod fetcher;
mod interrupt;
mod politeness;
mod timeout;
mod trigger;

pub use crawl_loop::{CrawlLoop, CrawlSummary};
pub use fetcher::{build_http_client, user_agent_string, HttpFetcher, WebFetcher};
pub use interrupt::{Interrupt, InterruptFlag, InterruptWatcher};
pub use politeness::{IterationOutcome, Politeness};
pub use timeout::bounded;
pub use trigger::{reset, ResetSettings};

//! Trigger/reset for a fresh crawl cycle
//!
//! Resetting clears both queues, wipes the seen-URL set, waits out queue purge
//! propagation, then seeds the frontier. It must finish before any crawl loop
//! starts against the same frontier, or stale seen records can suppress the
//! new crawl.

use crate::crawler::timeout::bounded;
use crate::storage::{Queue, SeenUrlStore};
use crate::url::normalize_url;
use crate::{CrawlError, Result};
use std::time::{Duration, Instant};
use url::Url;

/// Settings for one reset
#[derive(Debug, Clone)]
pub struct ResetSettings {
    /// Origin used to absolutize relative seeds
    pub origin: Url,

    /// Seed used when none are given
    pub default_seed: String,

    /// How long queue purges take to propagate
    pub purge_wait: Duration,

    /// Extra wait on top of the purge window
    pub purge_margin: Duration,

    /// Bound on each queue call
    pub operation_timeout: Duration,
}

/// Resets crawl state and seeds the frontier
///
/// Seeds are normalized before anything is cleared, so a bad seed leaves the
/// existing state untouched.
///
/// # Arguments
///
/// * `frontier` - The frontier queue
/// * `raw_events` - The raw-event queue feeding the scrape stage
/// * `seen` - The seen-URL store
/// * `seeds` - Seed URLs; the default seed is used when empty
/// * `settings` - Origin, default seed and timing
///
/// # Returns
///
/// * `Ok(Vec<String>)` - The URLs enqueued
/// * `Err(CrawlError)` - A seed was invalid or a store call failed
pub async fn reset(
    frontier: &dyn Queue,
    raw_events: &dyn Queue,
    seen: &dyn SeenUrlStore,
    seeds: &[String],
    settings: &ResetSettings,
) -> Result<Vec<String>> {
    let seeds = resolve_seeds(seeds, settings)?;
    let limit = settings.operation_timeout;

    tracing::info!("Clearing frontier and raw-event queues");
    bounded("frontier clear", limit, frontier.clear()).await?;
    bounded("raw-event clear", limit, raw_events.clear()).await?;
    let purged_at = Instant::now();

    tracing::info!("Deleting seen URLs");
    seen.delete_all().await?;

    let wait = settings.purge_wait.saturating_sub(purged_at.elapsed()) + settings.purge_margin;
    tracing::info!("Waiting {:?} for queue purge to propagate", wait);
    tokio::time::sleep(wait).await;

    for seed in &seeds {
        bounded("frontier send", limit, frontier.send_url(seed)).await?;
        tracing::info!("Seeded {}", seed);
    }

    Ok(seeds)
}

fn resolve_seeds(seeds: &[String], settings: &ResetSettings) -> Result<Vec<String>> {
    if seeds.is_empty() {
        return Ok(vec![normalize_url(&settings.default_seed, &settings.origin)?]);
    }

    seeds
        .iter()
        .map(|seed| normalize_url(seed, &settings.origin).map_err(CrawlError::from))
        .collect()
}

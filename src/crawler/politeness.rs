//! Politeness pacing for the crawl loop
//!
//! The delay before each iteration depends on what the previous iteration did:
//! a fetch attempt earns a randomized politeness interval, an already-seen URL
//! a short fixed delay, and an empty or failed poll the idle delay.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::time::Duration;

/// What one crawl-loop iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// The frontier poll returned no message
    Idle,

    /// The URL was already seen; the message was consumed without a fetch
    AlreadySeen,

    /// The page was fetched, stored, marked seen and acknowledged
    Stored,

    /// The fetch failed; the message is left for redelivery
    FetchFailed,

    /// Storing, marking or acknowledging failed after a fetch
    PersistFailed,

    /// The frontier or seen store could not be consulted
    Unavailable,
}

impl IterationOutcome {
    /// Returns true when the iteration sent a request to the site
    pub fn fetch_attempted(&self) -> bool {
        matches!(self, Self::Stored | Self::FetchFailed | Self::PersistFailed)
    }
}

/// Computes the sleep before each crawl-loop iteration
#[derive(Debug, Clone, PartialEq)]
pub struct Politeness {
    min: Duration,
    delta: Duration,
    seen_delay: Duration,
    idle_delay: Duration,
}

impl Politeness {
    /// Creates pacing with a politeness window of `[min, min + delta)`
    pub fn new(min: Duration, delta: Duration, seen_delay: Duration, idle_delay: Duration) -> Self {
        Self {
            min,
            delta,
            seen_delay,
            idle_delay,
        }
    }

    /// Pacing from the `[crawler]` configuration section
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            Duration::from_secs_f64(config.min_sleep_seconds),
            Duration::from_secs_f64(config.sleep_delta_seconds),
            config.seen_delay(),
            config.idle_delay(),
        )
    }

    /// No delays at all
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }

    /// The delay to sleep before the iteration following `previous`
    ///
    /// `None` means the loop has not run an iteration yet.
    pub fn delay_after(&self, previous: Option<IterationOutcome>) -> Duration {
        match previous {
            Some(IterationOutcome::AlreadySeen) => self.seen_delay,
            Some(outcome) if outcome.fetch_attempted() => self.politeness_interval(),
            _ => self.idle_delay,
        }
    }

    /// A uniform random interval in `[min, min + delta)`
    pub fn politeness_interval(&self) -> Duration {
        if self.delta.is_zero() {
            return self.min;
        }
        let jitter = rand::rng().random_range(0.0..self.delta.as_secs_f64());
        self.min + Duration::from_secs_f64(jitter)
    }
}

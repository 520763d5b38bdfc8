use crate::storage::BatchDeletePolicy;
use crate::url::{DEFAULT_ORIGIN, DEFAULT_SEED_URL};
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Statute-Crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default, rename = "seen-store")]
    pub seen_store: SeenStoreConfig,
    pub storage: StorageConfig,
}

/// Crawl loop pacing and timeouts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Lower bound of the politeness interval (seconds)
    #[serde(rename = "min-sleep-seconds")]
    pub min_sleep_seconds: f64,

    /// Width of the random politeness window above the lower bound (seconds)
    #[serde(rename = "sleep-delta-seconds")]
    pub sleep_delta_seconds: f64,

    /// Delay after an already-seen URL (milliseconds)
    #[serde(rename = "seen-sleep-millis")]
    pub seen_sleep_millis: u64,

    /// Delay after an empty poll (milliseconds)
    #[serde(rename = "idle-sleep-millis")]
    pub idle_sleep_millis: u64,

    /// Bound on every network and store call (seconds)
    #[serde(rename = "operation-timeout-seconds")]
    pub operation_timeout_seconds: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            min_sleep_seconds: 3.0,
            sleep_delta_seconds: 2.0,
            seen_sleep_millis: 100,
            idle_sleep_millis: 1000,
            operation_timeout_seconds: 59,
        }
    }
}

impl CrawlerConfig {
    pub fn seen_delay(&self) -> Duration {
        Duration::from_millis(self.seen_sleep_millis)
    }

    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_millis)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_seconds)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// The crawled site
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin used to absolutize scheme- and root-relative links
    pub origin: String,

    /// Seed used when the trigger is given no URLs
    #[serde(rename = "default-seed")]
    pub default_seed: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            default_seed: DEFAULT_SEED_URL.to_string(),
        }
    }
}

/// Trigger/reset timing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// How long a queue purge takes to propagate (seconds)
    #[serde(rename = "purge-wait-seconds")]
    pub purge_wait_seconds: u64,

    /// Extra wait on top of the purge window (seconds)
    #[serde(rename = "purge-margin-seconds")]
    pub purge_margin_seconds: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            purge_wait_seconds: 120,
            purge_margin_seconds: 2,
        }
    }
}

impl TriggerConfig {
    pub fn purge_wait(&self) -> Duration {
        Duration::from_secs(self.purge_wait_seconds)
    }

    pub fn purge_margin(&self) -> Duration {
        Duration::from_secs(self.purge_margin_seconds)
    }
}

/// Seen-URL store write pacing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeenStoreConfig {
    /// Records per delete batch
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Delay before each delete batch (milliseconds)
    #[serde(rename = "batch-delay-millis")]
    pub batch_delay_millis: u64,

    /// Delay before retrying a throttled batch (milliseconds)
    #[serde(rename = "backoff-millis")]
    pub backoff_millis: u64,
}

impl Default for SeenStoreConfig {
    fn default() -> Self {
        Self {
            batch_size: 25,
            batch_delay_millis: 1000,
            backoff_millis: 5000,
        }
    }
}

impl SeenStoreConfig {
    pub fn batch_policy(&self) -> BatchDeletePolicy {
        BatchDeletePolicy {
            batch_size: self.batch_size,
            batch_delay: Duration::from_millis(self.batch_delay_millis),
            backoff: Duration::from_millis(self.backoff_millis),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// How long a received message stays hidden from other consumers (seconds)
    #[serde(rename = "visibility-timeout-seconds", default = "default_visibility_timeout")]
    pub visibility_timeout_seconds: u64,

    /// Deliveries after which a message moves to its dead-letter queue
    #[serde(rename = "max-receive-count", default = "default_max_receive_count")]
    pub max_receive_count: u32,
}

fn default_visibility_timeout() -> u64 {
    180
}

fn default_max_receive_count() -> u32 {
    2
}

impl StorageConfig {
    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_seconds)
    }
}

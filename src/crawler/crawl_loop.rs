//! The crawl loop
//!
//! Each iteration pulls one URL from the frontier and runs it through
//! dedupe, fetch, store, mark-seen and acknowledge. Any failure leaves the
//! frontier message unacknowledged so the queue redelivers it; no step is
//! retried in-process.

use crate::crawler::fetcher::WebFetcher;
use crate::crawler::interrupt::Interrupt;
use crate::crawler::politeness::{IterationOutcome, Politeness};
use crate::crawler::timeout::bounded;
use crate::model::QueueMessage;
use crate::storage::{Queue, RawPageStore, SeenUrlStore};
use crate::url::raw_key_for_url;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Counts of iteration outcomes over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub iterations: u64,
    pub stored: u64,
    pub already_seen: u64,
    pub idle: u64,
    pub failed: u64,
}

impl CrawlSummary {
    fn record(&mut self, outcome: IterationOutcome) {
        self.iterations += 1;
        match outcome {
            IterationOutcome::Stored => self.stored += 1,
            IterationOutcome::AlreadySeen => self.already_seen += 1,
            IterationOutcome::Idle => self.idle += 1,
            IterationOutcome::FetchFailed
            | IterationOutcome::PersistFailed
            | IterationOutcome::Unavailable => self.failed += 1,
        }
    }
}

/// A single crawl worker
///
/// Many workers may run against the same stores. Two workers racing on one
/// URL can both fetch it before either marks it seen.
pub struct CrawlLoop {
    frontier: Arc<dyn Queue>,
    seen: Arc<dyn SeenUrlStore>,
    raw: Arc<dyn RawPageStore>,
    fetcher: Arc<dyn WebFetcher>,
    interrupt: Arc<dyn Interrupt>,
    politeness: Politeness,
    operation_timeout: Duration,
}

impl CrawlLoop {
    /// Creates a crawl worker over the given collaborators
    pub fn new(
        frontier: Arc<dyn Queue>,
        seen: Arc<dyn SeenUrlStore>,
        raw: Arc<dyn RawPageStore>,
        fetcher: Arc<dyn WebFetcher>,
        interrupt: Arc<dyn Interrupt>,
    ) -> Self {
        Self {
            frontier,
            seen,
            raw,
            fetcher,
            interrupt,
            politeness: Politeness::none(),
            operation_timeout: Duration::from_secs(59),
        }
    }

    /// Sets the pacing between iterations
    pub fn with_politeness(mut self, politeness: Politeness) -> Self {
        self.politeness = politeness;
        self
    }

    /// Sets the bound on every fetch and store call
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Runs iterations until interrupted
    ///
    /// The interrupt flag is checked once per iteration, before its sleep.
    pub async fn run(&self) -> CrawlSummary {
        tracing::info!("Crawl loop started");

        let mut summary = CrawlSummary::default();
        let mut previous = None;

        while !self.interrupt.is_interrupted() {
            tokio::time::sleep(self.politeness.delay_after(previous)).await;

            let outcome = self.step().await;
            summary.record(outcome);
            previous = Some(outcome);
        }

        tracing::info!(
            "Crawl loop stopped after {} iterations ({} stored, {} already seen, {} failed)",
            summary.iterations,
            summary.stored,
            summary.already_seen,
            summary.failed
        );
        summary
    }

    /// Runs one iteration without sleeping
    pub async fn step(&self) -> IterationOutcome {
        // Poll frontier
        let message = match self.receive().await {
            Ok(message) => message,
            Err(e) => {
                tracing::error!("Failed to poll frontier: {}", e);
                return IterationOutcome::Unavailable;
            }
        };

        if message.is_empty {
            tracing::debug!("Frontier empty");
            return IterationOutcome::Idle;
        }

        let url = message.body.as_str();

        // Dedupe against the seen set
        match bounded("seen-url lookup", self.operation_timeout, self.seen.has_url(url)).await {
            Ok(true) => {
                tracing::debug!("Already seen {}", url);
                if let Err(e) = self.acknowledge(&message).await {
                    tracing::error!("Failed to delete message for seen URL {}: {}", url, e);
                }
                return IterationOutcome::AlreadySeen;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!("Failed to check seen store for {}: {}", url, e);
                return IterationOutcome::Unavailable;
            }
        }

        // Fetch page
        let body = match bounded("page fetch", self.operation_timeout, self.fetcher.get_html(url))
            .await
        {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to fetch {}, leaving for redelivery: {}", url, e);
                return IterationOutcome::FetchFailed;
            }
        };

        if let Err(e) = self.persist(&message, &body).await {
            tracing::error!("Failed to persist {}, leaving for redelivery: {}", url, e);
            return IterationOutcome::PersistFailed;
        }

        tracing::info!("Stored {} ({} bytes)", url, body.len());
        IterationOutcome::Stored
    }

    async fn receive(&self) -> Result<QueueMessage> {
        bounded(
            "frontier receive",
            self.operation_timeout,
            self.frontier.receive_message(),
        )
        .await
    }

    async fn acknowledge(&self, message: &QueueMessage) -> Result<()> {
        bounded(
            "frontier delete",
            self.operation_timeout,
            self.frontier.delete_message(message),
        )
        .await
    }

    /// Store the body, mark the URL seen, then acknowledge
    async fn persist(&self, message: &QueueMessage, body: &str) -> Result<()> {
        let url = message.body.as_str();
        let key = raw_key_for_url(url);

        // The raw write must land before the URL counts as seen
        bounded(
            "raw page write",
            self.operation_timeout,
            self.raw.put_text_file(&key, body),
        )
        .await?;
        bounded("seen-url write", self.operation_timeout, self.seen.put_url(url)).await?;

        // Acknowledge last so any earlier failure means redelivery
        self.acknowledge(message).await
    }
}

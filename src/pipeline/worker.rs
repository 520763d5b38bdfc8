//! Raw-event scrape worker
//!
//! Receives raw-page events, scrapes the page each one names, and deletes the
//! event by handle only when the scrape fully succeeded. Anything else leaves
//! the event for redelivery.

use crate::crawler::{bounded, Interrupt};
use crate::pipeline::orchestrator::{scrape_page, ScrapeOutcome};
use crate::scraper::PageScraper;
use crate::storage::{ChunkStore, Queue, RawPageStore};
use std::sync::Arc;
use std::time::Duration;

/// What one worker iteration did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeStep {
    /// No event was available
    Idle,

    /// The page was scraped and the event acknowledged
    Scraped(ScrapeOutcome),

    /// Scraping or acknowledging failed; the event is left for redelivery
    Failed,
}

/// A single scrape worker
pub struct ScrapeWorker {
    events: Arc<dyn Queue>,
    raw: Arc<dyn RawPageStore>,
    chunks: Arc<dyn ChunkStore>,
    frontier: Arc<dyn Queue>,
    scraper: Arc<dyn PageScraper>,
    interrupt: Arc<dyn Interrupt>,
    idle_delay: Duration,
    operation_timeout: Duration,
}

impl ScrapeWorker {
    /// Creates a worker over the given collaborators
    pub fn new(
        events: Arc<dyn Queue>,
        raw: Arc<dyn RawPageStore>,
        chunks: Arc<dyn ChunkStore>,
        frontier: Arc<dyn Queue>,
        scraper: Arc<dyn PageScraper>,
        interrupt: Arc<dyn Interrupt>,
    ) -> Self {
        Self {
            events,
            raw,
            chunks,
            frontier,
            scraper,
            interrupt,
            idle_delay: Duration::from_secs(1),
            operation_timeout: Duration::from_secs(59),
        }
    }

    /// Sets the sleep after an empty poll or a failed iteration
    pub fn with_idle_delay(mut self, delay: Duration) -> Self {
        self.idle_delay = delay;
        self
    }

    /// Sets the bound on every store call
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Processes events until interrupted
    ///
    /// # Returns
    ///
    /// The number of events scraped successfully
    pub async fn run(&self) -> u64 {
        tracing::info!("Scrape worker started");
        let mut scraped = 0;
        let mut back_off = false;

        while !self.interrupt.is_interrupted() {
            // Pause after an empty poll or a failure so an outage cannot spin
            if back_off {
                tokio::time::sleep(self.idle_delay).await;
            }

            let step = self.step().await;
            back_off = !matches!(step, ScrapeStep::Scraped(_));
            if !back_off {
                scraped += 1;
            }
        }

        tracing::info!("Scrape worker stopped after {} pages", scraped);
        scraped
    }

    /// Processes at most one event
    pub async fn step(&self) -> ScrapeStep {
        let limit = self.operation_timeout;

        let event = match bounded("raw-event receive", limit, self.events.receive_message()).await {
            Ok(event) => event,
            Err(e) => {
                tracing::error!("Failed to poll raw events: {}", e);
                return ScrapeStep::Failed;
            }
        };

        if event.is_empty {
            return ScrapeStep::Idle;
        }

        let raw_key = event.body.as_str();
        let outcome = match scrape_page(
            raw_key,
            self.raw.as_ref(),
            self.chunks.as_ref(),
            self.frontier.as_ref(),
            self.scraper.as_ref(),
            limit,
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Failed to scrape {}, leaving for redelivery: {}", raw_key, e);
                return ScrapeStep::Failed;
            }
        };

        if let Err(e) = bounded(
            "raw-event delete",
            limit,
            self.events.delete_message_by_handle(&event.handle),
        )
        .await
        {
            tracing::error!("Scraped {} but failed to delete its event: {}", raw_key, e);
            return ScrapeStep::Failed;
        }

        tracing::info!("Scraped {}: {:?}", raw_key, outcome);
        ScrapeStep::Scraped(outcome)
    }
}

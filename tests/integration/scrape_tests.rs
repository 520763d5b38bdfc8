//! Integration tests for the scrape stage
//!
//! These tests drive the scrape orchestrator and worker against the HTML
//! fixtures, using fault-injecting stores to check that failed side effects
//! always leave the raw page in place for a retry.

use async_trait::async_trait;
use statute_crawler::crawler::InterruptFlag;
use statute_crawler::model::{Chunk, PageKind, QueueMessage, Statute};
use statute_crawler::pipeline::{scrape_page, ScrapeOutcome, ScrapeStep, ScrapeWorker};
use statute_crawler::scraper::{PageScraper, RevisorScraper, ScrapeResult};
use statute_crawler::storage::{
    dead_letter_queue_name, ChunkStore, MemoryChunkStore, MemoryQueue, MemoryRawStore, Queue, RawPageStore, SqliteStorage,
    StoreError, StoreResult, CHUNK_PATH_PREFIX, FRONTIER_QUEUE, RAW_EVENTS_QUEUE,
};
use statute_crawler::CrawlError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);
const RAW_KEY: &str = "url=aHR0cHM6Ly93d3cucmV2aXNvci5tbi5nb3Yvc3RhdHV0ZXMvY2l0ZS8x";

fn scraper() -> RevisorScraper {
    RevisorScraper::for_default_origin().unwrap()
}

/// A frontier that rejects one particular URL
struct RejectingQueue {
    inner: MemoryQueue,
    reject: String,
}

#[async_trait]
impl Queue for RejectingQueue {
    async fn clear(&self) -> StoreResult<()> {
        self.inner.clear().await
    }

    async fn send_message(&self, message: QueueMessage) -> StoreResult<()> {
        if message.body == self.reject {
            return Err(StoreError::Unavailable("injected send failure".to_string()));
        }
        self.inner.send_message(message).await
    }

    async fn receive_message(&self) -> StoreResult<QueueMessage> {
        self.inner.receive_message().await
    }

    async fn delete_message_by_handle(&self, handle: &str) -> StoreResult<()> {
        self.inner.delete_message_by_handle(handle).await
    }
}

/// A chunk store that fails the nth write
struct FlakyChunkStore {
    inner: MemoryChunkStore,
    writes: AtomicUsize,
    fail_on: usize,
}

#[async_trait]
impl ChunkStore for FlakyChunkStore {
    async fn put_chunk(&self, chunk: &Chunk) -> StoreResult<()> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        self.inner.put_chunk(chunk).await
    }

    async fn get_chunk(&self, id: &str) -> StoreResult<Chunk> {
        self.inner.get_chunk(id).await
    }
}

/// A scraper whose classifier never recognizes anything
struct UnrecognizingScraper;

impl PageScraper for UnrecognizingScraper {
    fn classify(&self, _html: &str) -> ScrapeResult<PageKind> {
        Ok(PageKind::Unrecognized)
    }

    fn extract_urls(&self, _html: &str, _kind: PageKind) -> ScrapeResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn extract_statute(&self, _html: &str) -> ScrapeResult<Statute> {
        Ok(Statute::default())
    }
}

async fn raw_store_with(html: &str) -> MemoryRawStore {
    let raw = MemoryRawStore::new();
    raw.put_text_file(RAW_KEY, html).await.unwrap();
    raw
}

#[tokio::test]
async fn test_partial_enqueue_failure_retains_raw_page() {
    let raw = raw_store_with(include_str!("../fixtures/sections_table.html")).await;
    let chunks = MemoryChunkStore::new();
    let frontier = RejectingQueue {
        inner: MemoryQueue::new(),
        reject: "https://www.revisor.mn.gov/statutes/cite/1.02".to_string(),
    };

    let result = scrape_page(RAW_KEY, &raw, &chunks, &frontier, &scraper(), TIMEOUT).await;

    match result {
        Err(CrawlError::PartialEnqueue { key, failed, total }) => {
            assert_eq!(key, RAW_KEY);
            assert_eq!(failed, 1);
            assert_eq!(total, 3);
        }
        other => panic!("expected partial enqueue failure, got {:?}", other),
    }

    // The other URLs still went out
    assert_eq!(
        frontier.inner.pending(),
        vec![
            "https://www.revisor.mn.gov/statutes/cite/1.01".to_string(),
            "https://www.revisor.mn.gov/statutes/cite/1.041".to_string(),
        ]
    );
    assert!(raw.contains(RAW_KEY));
}

#[tokio::test]
async fn test_chunk_write_failure_is_retried_idempotently() {
    let html = include_str!("../fixtures/section_with_subdivisions.html");
    let raw = raw_store_with(html).await;
    let frontier = MemoryQueue::new();
    let flaky = FlakyChunkStore {
        inner: MemoryChunkStore::new(),
        writes: AtomicUsize::new(0),
        fail_on: 2,
    };

    let first = scrape_page(RAW_KEY, &raw, &flaky, &frontier, &scraper(), TIMEOUT).await;
    assert!(matches!(first, Err(CrawlError::Store(_))));
    assert!(raw.contains(RAW_KEY));

    let second = scrape_page(RAW_KEY, &raw, &flaky, &frontier, &scraper(), TIMEOUT).await;
    assert_eq!(
        second.unwrap(),
        ScrapeOutcome::Chunked {
            statute_id: "1.02".to_string(),
            chunks: 3
        }
    );
    assert!(!raw.contains(RAW_KEY));

    let stored = flaky.inner.chunks();
    assert_eq!(stored.len(), 3);
    assert_eq!(
        flaky.inner.get_chunk("1.02.1").await.unwrap().body,
        stored[0].body
    );
    assert!(stored[0].body.starts_with("1.02.1: DEFINITIONS. -- Scope.\n"));
    assert!(stored[1].body.ends_with("Point,Latitude\nA,49.0\nB,43.5\n"));
}

#[tokio::test]
async fn test_unrecognized_kind_retains_raw_page() {
    let raw = raw_store_with("<html></html>").await;
    let chunks = MemoryChunkStore::new();
    let frontier = MemoryQueue::new();

    let result = scrape_page(
        RAW_KEY,
        &raw,
        &chunks,
        &frontier,
        &UnrecognizingScraper,
        TIMEOUT,
    )
    .await;

    assert!(matches!(
        result,
        Err(CrawlError::UnsupportedPageKind(PageKind::Unrecognized))
    ));
    assert!(raw.contains(RAW_KEY));
}

#[tokio::test]
async fn test_worker_feeds_frontier_from_sqlite_events() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let visibility = Duration::from_secs(30);
    let writer = storage.raw_store(Some(RAW_EVENTS_QUEUE));

    writer
        .put_text_file(RAW_KEY, include_str!("../fixtures/chapters_short_table.html"))
        .await
        .unwrap();
    writer
        .put_text_file(
            "url=c2VjdGlvbg==",
            include_str!("../fixtures/section_no_subdivisions.html"),
        )
        .await
        .unwrap();

    let worker = ScrapeWorker::new(
        Arc::new(storage.queue(RAW_EVENTS_QUEUE, visibility)),
        Arc::new(storage.raw_store(None)),
        Arc::new(storage.chunk_store(CHUNK_PATH_PREFIX)),
        Arc::new(storage.queue(FRONTIER_QUEUE, visibility)),
        Arc::new(scraper()),
        Arc::new(InterruptFlag::new()),
    )
    .with_operation_timeout(TIMEOUT);

    assert_eq!(
        worker.step().await,
        ScrapeStep::Scraped(ScrapeOutcome::Enqueued {
            kind: PageKind::ChaptersShortTable,
            urls: 3
        })
    );
    assert_eq!(
        worker.step().await,
        ScrapeStep::Scraped(ScrapeOutcome::Chunked {
            statute_id: "1.01".to_string(),
            chunks: 1
        })
    );
    assert_eq!(worker.step().await, ScrapeStep::Idle);

    assert_eq!(storage.queue_depth(FRONTIER_QUEUE).unwrap(), (3, 0));
    assert_eq!(storage.queue_depth(RAW_EVENTS_QUEUE).unwrap(), (0, 0));
    assert_eq!(storage.count_raw_pages().unwrap(), 0);
    assert_eq!(storage.count_chunks().unwrap(), 1);

    let chunk = storage.chunk_store(CHUNK_PATH_PREFIX).get_chunk("1.01").await.unwrap();
    assert!(chunk.body.starts_with("1.01: EXTENT OF JURISDICTION.\n"));
}

#[tokio::test]
async fn test_worker_leaves_failed_event() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let writer = storage.raw_store(Some(RAW_EVENTS_QUEUE));
    writer
        .put_text_file(RAW_KEY, include_str!("../fixtures/unknown_page.html"))
        .await
        .unwrap();

    let worker = ScrapeWorker::new(
        Arc::new(storage.queue(RAW_EVENTS_QUEUE, Duration::from_secs(30))),
        Arc::new(storage.raw_store(None)),
        Arc::new(storage.chunk_store(CHUNK_PATH_PREFIX)),
        Arc::new(storage.queue(FRONTIER_QUEUE, Duration::from_secs(30))),
        Arc::new(scraper()),
        Arc::new(InterruptFlag::new()),
    );

    assert_eq!(worker.step().await, ScrapeStep::Failed);
    assert_eq!(storage.queue_depth(RAW_EVENTS_QUEUE).unwrap(), (0, 1));
    assert_eq!(storage.count_raw_pages().unwrap(), 1);
}

#[tokio::test]
async fn test_duplicate_event_is_dead_lettered() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let writer = storage.raw_store(Some(RAW_EVENTS_QUEUE));
    let page = include_str!("../fixtures/section_no_subdivisions.html");

    // A crawl retried after its mark-seen failed writes the same page twice
    writer.put_text_file(RAW_KEY, page).await.unwrap();
    writer.put_text_file(RAW_KEY, page).await.unwrap();

    let worker = ScrapeWorker::new(
        Arc::new(
            storage
                .queue(RAW_EVENTS_QUEUE, Duration::ZERO)
                .with_max_receive_count(2),
        ),
        Arc::new(storage.raw_store(None)),
        Arc::new(storage.chunk_store(CHUNK_PATH_PREFIX)),
        Arc::new(storage.queue(FRONTIER_QUEUE, Duration::from_secs(30))),
        Arc::new(scraper()),
        Arc::new(InterruptFlag::new()),
    )
    .with_operation_timeout(TIMEOUT);

    assert!(matches!(
        worker.step().await,
        ScrapeStep::Scraped(ScrapeOutcome::Chunked { .. })
    ));

    // The second event names a page that is already gone
    assert_eq!(worker.step().await, ScrapeStep::Failed);
    assert_eq!(worker.step().await, ScrapeStep::Failed);
    assert_eq!(worker.step().await, ScrapeStep::Idle);
    assert_eq!(worker.step().await, ScrapeStep::Idle);

    assert_eq!(storage.queue_depth(RAW_EVENTS_QUEUE).unwrap(), (0, 0));
    assert_eq!(
        storage
            .queue_depth(&dead_letter_queue_name(RAW_EVENTS_QUEUE))
            .unwrap(),
        (1, 0)
    );
    assert_eq!(storage.count_chunks().unwrap(), 1);
}

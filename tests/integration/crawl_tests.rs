//! Integration tests for the crawl stage
//!
//! These tests use wiremock to stand in for the statutes site and a SQLite
//! database in a temporary directory for the shared stores.

use statute_crawler::config::UserAgentConfig;
use statute_crawler::crawler::{
    reset, CrawlLoop, HttpFetcher, InterruptFlag, IterationOutcome, ResetSettings, WebFetcher,
};
use statute_crawler::storage::{
    BatchDeletePolicy, Queue, RawPageStore, SeenUrlStore, SqliteStorage, FRONTIER_QUEUE,
    RAW_EVENTS_QUEUE,
};
use statute_crawler::url::{canonical_origin, url_for_raw_key};
use statute_crawler::{raw_key_for_url, CrawlError};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_AGENT: &str = "TestBot/1.0.0 (+https://example.com/contact; test@example.com)";

fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(&user_agent(), Duration::from_secs(5)).unwrap()
}

fn fast_policy() -> BatchDeletePolicy {
    BatchDeletePolicy {
        batch_size: 25,
        batch_delay: Duration::ZERO,
        backoff: Duration::ZERO,
    }
}

/// A SQLite database in a temporary directory
struct TestDb {
    _dir: TempDir,
    storage: SqliteStorage,
}

impl TestDb {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::open(&dir.path().join("crawl.db")).unwrap();
        Self { _dir: dir, storage }
    }

    fn crawl_loop(&self, visibility: Duration) -> CrawlLoop {
        CrawlLoop::new(
            Arc::new(self.storage.queue(FRONTIER_QUEUE, visibility)),
            Arc::new(self.storage.seen_store(fast_policy())),
            Arc::new(self.storage.raw_store(Some(RAW_EVENTS_QUEUE))),
            Arc::new(fetcher()),
            Arc::new(InterruptFlag::new()),
        )
        .with_operation_timeout(Duration::from_secs(5))
    }
}

#[tokio::test]
async fn test_fetcher_sends_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statutes/"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>toc</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let body = fetcher()
        .get_html(&format!("{}/statutes/", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "<html>toc</html>");
}

#[tokio::test]
async fn test_fetcher_rejects_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statutes/cite/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = fetcher()
        .get_html(&format!("{}/statutes/cite/404", server.uri()))
        .await;
    assert!(matches!(result, Err(CrawlError::HttpStatus { status: 404, .. })));
}

#[tokio::test]
async fn test_crawl_stores_page_and_emits_raw_event() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statutes/cite/1.01"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>1.01</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let db = TestDb::new();
    let url = format!("{}/statutes/cite/1.01", server.uri());
    let frontier = db.storage.queue(FRONTIER_QUEUE, Duration::from_secs(30));
    frontier.send_url(&url).await.unwrap();

    let outcome = db.crawl_loop(Duration::from_secs(30)).step().await;
    assert_eq!(outcome, IterationOutcome::Stored);

    let key = raw_key_for_url(&url);
    let raw = db.storage.raw_store(None);
    assert_eq!(raw.get_text_file(&key).await.unwrap(), "<html>1.01</html>");
    assert!(db.storage.seen_store(fast_policy()).has_url(&url).await.unwrap());
    assert_eq!(db.storage.queue_depth(FRONTIER_QUEUE).unwrap(), (0, 0));

    let event = db
        .storage
        .queue(RAW_EVENTS_QUEUE, Duration::from_secs(30))
        .receive_message()
        .await
        .unwrap();
    assert_eq!(event.body, key);
    assert_eq!(url_for_raw_key(&event.body).unwrap(), url);
}

#[tokio::test]
async fn test_seen_url_is_never_fetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let db = TestDb::new();
    let url = format!("{}/statutes/cite/1.01", server.uri());
    db.storage.seen_store(fast_policy()).put_url(&url).await.unwrap();
    db.storage
        .queue(FRONTIER_QUEUE, Duration::from_secs(30))
        .send_url(&url)
        .await
        .unwrap();

    let outcome = db.crawl_loop(Duration::from_secs(30)).step().await;

    assert_eq!(outcome, IterationOutcome::AlreadySeen);
    assert_eq!(db.storage.count_raw_pages().unwrap(), 0);
    assert_eq!(db.storage.queue_depth(FRONTIER_QUEUE).unwrap(), (0, 0));
    assert_eq!(db.storage.queue_depth(RAW_EVENTS_QUEUE).unwrap(), (0, 0));
}

#[tokio::test]
async fn test_failed_fetch_is_redelivered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statutes/cite/1.01"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/statutes/cite/1.01"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let db = TestDb::new();
    let url = format!("{}/statutes/cite/1.01", server.uri());
    db.storage
        .queue(FRONTIER_QUEUE, Duration::ZERO)
        .send_url(&url)
        .await
        .unwrap();

    // Zero visibility timeout makes the unacknowledged message visible again at once
    let crawl_loop = db.crawl_loop(Duration::ZERO);
    assert_eq!(crawl_loop.step().await, IterationOutcome::FetchFailed);
    assert_eq!(db.storage.count_seen_urls().unwrap(), 0);

    assert_eq!(crawl_loop.step().await, IterationOutcome::Stored);
    assert_eq!(db.storage.count_raw_pages().unwrap(), 1);
    assert_eq!(db.storage.queue_depth(FRONTIER_QUEUE).unwrap(), (0, 0));
}

#[tokio::test]
async fn test_trigger_resets_sqlite_state() {
    let db = TestDb::new();
    let visibility = Duration::from_secs(30);
    let frontier = db.storage.queue(FRONTIER_QUEUE, visibility);
    let events = db.storage.queue(RAW_EVENTS_QUEUE, visibility);
    let seen = db.storage.seen_store(BatchDeletePolicy {
        batch_size: 3,
        batch_delay: Duration::ZERO,
        backoff: Duration::ZERO,
    });

    for i in 0..10 {
        seen.put_url(&format!("https://www.revisor.mn.gov/statutes/cite/{}", i))
            .await
            .unwrap();
    }
    frontier
        .send_url("https://www.revisor.mn.gov/statutes/cite/99")
        .await
        .unwrap();
    events.send_url("url=stale").await.unwrap();

    let settings = ResetSettings {
        origin: canonical_origin("https://www.revisor.mn.gov").unwrap(),
        default_seed: "https://www.revisor.mn.gov/statutes/".to_string(),
        purge_wait: Duration::ZERO,
        purge_margin: Duration::ZERO,
        operation_timeout: Duration::from_secs(5),
    };
    let seeded = reset(&frontier, &events, &seen, &[], &settings).await.unwrap();

    assert_eq!(seeded, vec!["https://www.revisor.mn.gov/statutes/".to_string()]);
    assert_eq!(db.storage.count_seen_urls().unwrap(), 0);
    assert_eq!(db.storage.queue_depth(RAW_EVENTS_QUEUE).unwrap(), (0, 0));
    assert_eq!(db.storage.queue_depth(FRONTIER_QUEUE).unwrap(), (1, 0));
    assert_eq!(
        frontier.receive_message().await.unwrap().body,
        "https://www.revisor.mn.gov/statutes/"
    );
}

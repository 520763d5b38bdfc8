//! Statistics generation from the crawl database
//!
//! This module provides functionality for extracting and displaying queue
//! depths and store sizes from the SQLite backend.

use crate::storage::{
    dead_letter_queue_name, SqliteStorage, StoreResult, FRONTIER_QUEUE, RAW_EVENTS_QUEUE,
};
use std::fmt::Write;

/// Snapshot of crawl and scrape state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Frontier messages ready for delivery
    pub frontier_visible: u64,

    /// Frontier messages received but not yet acknowledged
    pub frontier_in_flight: u64,

    /// Frontier messages dead-lettered after too many deliveries
    pub frontier_dead: u64,

    /// Raw-event messages ready for delivery
    pub events_visible: u64,

    /// Raw-event messages received but not yet acknowledged
    pub events_in_flight: u64,

    /// Raw-event messages dead-lettered after too many deliveries
    pub events_dead: u64,

    /// URLs fetched and stored this crawl cycle
    pub seen_urls: u64,

    /// Raw pages not yet scraped, or retained after a failed scrape
    pub raw_pages: u64,

    /// Chunks written
    pub chunks: u64,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The SQLite backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(StoreError)` - Failed to query statistics
pub fn load_statistics(storage: &SqliteStorage) -> StoreResult<CrawlStatistics> {
    let (frontier_visible, frontier_in_flight) = storage.queue_depth(FRONTIER_QUEUE)?;
    let (events_visible, events_in_flight) = storage.queue_depth(RAW_EVENTS_QUEUE)?;

    // Dead letters are never received, so every one counts as visible
    let (frontier_dead, _) = storage.queue_depth(&dead_letter_queue_name(FRONTIER_QUEUE))?;
    let (events_dead, _) = storage.queue_depth(&dead_letter_queue_name(RAW_EVENTS_QUEUE))?;

    Ok(CrawlStatistics {
        frontier_visible,
        frontier_in_flight,
        frontier_dead,
        events_visible,
        events_in_flight,
        events_dead,
        seen_urls: storage.count_seen_urls()?,
        raw_pages: storage.count_raw_pages()?,
        chunks: storage.count_chunks()?,
    })
}

/// Formats statistics for display
pub fn render_statistics(stats: &CrawlStatistics) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "=== Crawl Statistics ===\n");
    let _ = writeln!(out, "Queues:");
    let _ = writeln!(
        out,
        "  {}: {} waiting, {} in flight, {} dead-lettered",
        FRONTIER_QUEUE, stats.frontier_visible, stats.frontier_in_flight, stats.frontier_dead
    );
    let _ = writeln!(
        out,
        "  {}: {} waiting, {} in flight, {} dead-lettered",
        RAW_EVENTS_QUEUE, stats.events_visible, stats.events_in_flight, stats.events_dead
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Stores:");
    let _ = writeln!(out, "  Seen URLs: {}", stats.seen_urls);
    let _ = writeln!(out, "  Raw pages pending: {}", stats.raw_pages);
    let _ = writeln!(out, "  Chunks: {}", stats.chunks);

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    print!("{}", render_statistics(stats));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Chunk;
    use crate::storage::{ChunkStore, Queue, RawPageStore, SeenUrlStore, BatchDeletePolicy};
    use std::time::Duration;

    #[tokio::test]
    async fn test_load_statistics() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let frontier = storage.queue(FRONTIER_QUEUE, Duration::from_secs(30));
        let events = storage
            .queue(RAW_EVENTS_QUEUE, Duration::ZERO)
            .with_max_receive_count(1);
        let raw = storage.raw_store(Some(RAW_EVENTS_QUEUE));

        frontier.send_url("https://www.revisor.mn.gov/statutes/").await.unwrap();
        frontier.send_url("https://www.revisor.mn.gov/statutes/cite/1").await.unwrap();
        let _ = frontier.receive_message().await.unwrap();
        raw.put_text_file("url=abc", "<html></html>").await.unwrap();
        // One delivery exhausts the event, the next receive moves it aside
        let _ = events.receive_message().await.unwrap();
        assert!(events.receive_message().await.unwrap().is_empty);
        storage
            .seen_store(BatchDeletePolicy::default())
            .put_url("https://www.revisor.mn.gov/statutes/")
            .await
            .unwrap();
        storage
            .chunk_store("chunk")
            .put_chunk(&Chunk {
                id: "1.01".to_string(),
                body: "1.01: EXTENT.\ntext\n".to_string(),
            })
            .await
            .unwrap();

        let stats = load_statistics(&storage).unwrap();
        assert_eq!(
            stats,
            CrawlStatistics {
                frontier_visible: 1,
                frontier_in_flight: 1,
                frontier_dead: 0,
                events_visible: 0,
                events_in_flight: 0,
                events_dead: 1,
                seen_urls: 1,
                raw_pages: 1,
                chunks: 1,
            }
        );
    }

    #[test]
    fn test_render_statistics() {
        let text = render_statistics(&CrawlStatistics {
            frontier_visible: 4,
            chunks: 9,
            ..CrawlStatistics::default()
        });
        assert!(text.contains("frontier: 4 waiting, 0 in flight, 0 dead-lettered"));
        assert!(text.contains("Chunks: 9"));
    }
}

//! The scrape orchestrator
//!
//! Glues classification, extraction and chunk building to the stores. The raw
//! page is deleted only after every side effect succeeded; on any failure it
//! stays in place so the triggering event can be redelivered and the whole
//! page reprocessed. Reprocessing re-derives identical chunks and re-enqueues
//! the same URLs, which downstream dedup absorbs.

use crate::chunks::build_chunks;
use crate::crawler::bounded;
use crate::model::PageKind;
use crate::scraper::PageScraper;
use crate::storage::{ChunkStore, Queue, RawPageStore};
use crate::{CrawlError, Result};
use std::time::Duration;

/// What a successful scrape produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    /// A table page whose links were all enqueued
    Enqueued { kind: PageKind, urls: usize },

    /// A statute page whose chunks were all written
    Chunked { statute_id: String, chunks: usize },

    /// A statute page for a repealed section; nothing was written
    Repealed,
}

/// Scrapes one raw page
///
/// # Arguments
///
/// * `raw_key` - Key of the raw page
/// * `raw` - Raw page store
/// * `chunks` - Chunk store receiving statute chunks
/// * `frontier` - Frontier receiving table links
/// * `scraper` - Classifier and extractor
/// * `timeout` - Bound on each store call
///
/// # Returns
///
/// * `Ok(ScrapeOutcome)` - Every side effect succeeded and the raw page was deleted
/// * `Err(CrawlError)` - Something failed; the raw page is retained
pub async fn scrape_page(
    raw_key: &str,
    raw: &dyn RawPageStore,
    chunks: &dyn ChunkStore,
    frontier: &dyn Queue,
    scraper: &dyn PageScraper,
    timeout: Duration,
) -> Result<ScrapeOutcome> {
    let html = bounded("raw page read", timeout, raw.get_text_file(raw_key)).await?;
    let kind = scraper.classify(&html)?;
    tracing::debug!("Classified {} as {}", raw_key, kind);

    let outcome = match kind {
        PageKind::ChaptersTable | PageKind::ChaptersShortTable | PageKind::SectionsTable => {
            let urls = scraper.extract_urls(&html, kind)?;
            enqueue_all(raw_key, &urls, frontier, timeout).await?;
            ScrapeOutcome::Enqueued {
                kind,
                urls: urls.len(),
            }
        }
        PageKind::Statutes => {
            let statute = scraper.extract_statute(&html)?;
            if statute.is_empty() {
                tracing::info!("{} is a repealed section, no chunks", raw_key);
                ScrapeOutcome::Repealed
            } else {
                let built = build_chunks(&statute);
                for chunk in &built {
                    bounded("chunk write", timeout, chunks.put_chunk(chunk)).await?;
                }
                ScrapeOutcome::Chunked {
                    statute_id: statute.id(),
                    chunks: built.len(),
                }
            }
        }
        PageKind::Unrecognized => return Err(CrawlError::UnsupportedPageKind(kind)),
    };

    bounded("raw page delete", timeout, raw.delete_text_file(raw_key)).await?;
    Ok(outcome)
}

/// Enqueues every URL, then fails if any single send failed
async fn enqueue_all(
    raw_key: &str,
    urls: &[String],
    frontier: &dyn Queue,
    timeout: Duration,
) -> Result<()> {
    let mut failed = 0;

    for url in urls {
        if let Err(e) = bounded("frontier send", timeout, frontier.send_url(url)).await {
            tracing::error!("Failed to enqueue {} from {}: {}", url, raw_key, e);
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(CrawlError::PartialEnqueue {
            key: raw_key.to_string(),
            failed,
            total: urls.len(),
        });
    }

    tracing::debug!("Enqueued {} URLs from {}", urls.len(), raw_key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::RevisorScraper;
    use crate::storage::{MemoryChunkStore, MemoryQueue, MemoryRawStore};

    const TIMEOUT: Duration = Duration::from_secs(5);

    async fn run(
        html: &str,
    ) -> (Result<ScrapeOutcome>, MemoryRawStore, MemoryChunkStore, MemoryQueue) {
        let raw = MemoryRawStore::new();
        let chunks = MemoryChunkStore::new();
        let frontier = MemoryQueue::new();
        let scraper = RevisorScraper::for_default_origin().unwrap();

        raw.put_text_file("raw-key", html).await.unwrap();
        let result = scrape_page("raw-key", &raw, &chunks, &frontier, &scraper, TIMEOUT).await;
        (result, raw, chunks, frontier)
    }

    #[tokio::test]
    async fn test_sections_table_enqueues_links() {
        let html = include_str!("../../tests/fixtures/sections_table.html");
        let (result, raw, _chunks, frontier) = run(html).await;

        assert_eq!(
            result.unwrap(),
            ScrapeOutcome::Enqueued {
                kind: PageKind::SectionsTable,
                urls: 3
            }
        );
        assert_eq!(frontier.pending().len(), 3);
        assert!(!raw.contains("raw-key"));
    }

    #[tokio::test]
    async fn test_statute_page_writes_chunks() {
        let html = include_str!("../../tests/fixtures/section_with_subdivisions.html");
        let (result, raw, chunks, frontier) = run(html).await;

        assert_eq!(
            result.unwrap(),
            ScrapeOutcome::Chunked {
                statute_id: "1.02".to_string(),
                chunks: 3
            }
        );
        let ids: Vec<String> = chunks.chunks().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["1.02.1", "1.02.2a", "1.02.3"]);
        assert!(frontier.pending().is_empty());
        assert!(!raw.contains("raw-key"));
    }

    #[tokio::test]
    async fn test_repealed_section_is_deleted_without_chunks() {
        let html = include_str!("../../tests/fixtures/section_repealed.html");
        let (result, raw, chunks, _frontier) = run(html).await;

        assert_eq!(result.unwrap(), ScrapeOutcome::Repealed);
        assert!(chunks.chunks().is_empty());
        assert!(!raw.contains("raw-key"));
    }

    #[tokio::test]
    async fn test_unknown_page_retains_raw() {
        let html = include_str!("../../tests/fixtures/unknown_page.html");
        let (result, raw, _chunks, _frontier) = run(html).await;

        assert!(matches!(result, Err(CrawlError::Scrape(_))));
        assert!(raw.contains("raw-key"));
    }

    #[tokio::test]
    async fn test_missing_raw_page_is_error() {
        let raw = MemoryRawStore::new();
        let chunks = MemoryChunkStore::new();
        let frontier = MemoryQueue::new();
        let scraper = RevisorScraper::for_default_origin().unwrap();

        let result = scrape_page("absent", &raw, &chunks, &frontier, &scraper, TIMEOUT).await;
        assert!(matches!(result, Err(CrawlError::Store(_))));
    }
}

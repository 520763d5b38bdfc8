//! Page inspection
//!
//! Runs the classifier and extractor over a local HTML file without touching
//! any store, so operators can see why a page keeps failing to scrape.

use crate::chunks::build_chunks;
use crate::model::{Chunk, PageKind};
use crate::scraper::{PageScraper, ScrapeResult};

/// What the scraper makes of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    /// A table page and the frontier URLs it yields
    Table { kind: PageKind, urls: Vec<String> },

    /// A statute page and the chunks it yields (empty when repealed)
    Statute { chunks: Vec<Chunk> },
}

/// Classifies and extracts a page
pub fn inspect_page(html: &str, scraper: &dyn PageScraper) -> ScrapeResult<Inspection> {
    let kind = scraper.classify(html)?;

    if kind.is_statute() {
        let statute = scraper.extract_statute(html)?;
        return Ok(Inspection::Statute {
            chunks: build_chunks(&statute),
        });
    }

    let urls = scraper.extract_urls(html, kind)?;
    Ok(Inspection::Table { kind, urls })
}

/// Prints an inspection to stdout
pub fn print_inspection(inspection: &Inspection) {
    match inspection {
        Inspection::Table { kind, urls } => {
            println!("Page kind: {} ({} links)", kind, urls.len());
            for url in urls {
                println!("  {}", url);
            }
        }
        Inspection::Statute { chunks } if chunks.is_empty() => {
            println!("Page kind: {} (repealed, no chunks)", PageKind::Statutes);
        }
        Inspection::Statute { chunks } => {
            println!("Page kind: {} ({} chunks)", PageKind::Statutes, chunks.len());
            for chunk in chunks {
                println!("--- {} ---", chunk.id);
                print!("{}", chunk.body);
            }
        }
    }
}

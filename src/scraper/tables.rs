//! Link extraction from the three table layouts
//!
//! Each table layout has its own row set. Rows follow one shape: the first
//! cell holds the link, the second the title. Only rows whose title is fully
//! upper-case are live entries; mixed-case titles mark repealed or renamed
//! chapters and sections and are skipped.

use super::{child_elements, element_text, selector, ScrapeError, ScrapeResult};
use crate::model::PageKind;
use crate::url::normalize_url;
use scraper::{ElementRef, Html};
use url::Url;

/// Row selector and name of the table for each table layout
fn row_set(kind: PageKind) -> ScrapeResult<(&'static str, &'static str)> {
    match kind {
        PageKind::ChaptersTable => Ok(("table#toc_table > tbody > tr", "toc_table")),
        PageKind::ChaptersShortTable => Ok(("table#chapters_table > tbody > tr", "chapters_table")),
        PageKind::SectionsTable => Ok((
            "div#chapter_analysis > table > tbody > tr",
            "chapter_analysis",
        )),
        other => Err(ScrapeError::Format(format!(
            "page kind {} has no link table",
            other
        ))),
    }
}

/// What a single table row contributes
#[derive(Debug, PartialEq, Eq)]
enum RowOutcome {
    /// A live entry with its absolute URL
    Link(String),
    /// A sub-heading row with no title cell
    SubHeading,
    /// A mixed-case title (repealed or otherwise not live)
    NotLive(String),
}

/// Extracts frontier URLs from a table page
///
/// # Row Rules
///
/// - No title cell and a class attribute: sub-heading row, skipped
/// - No title cell and no class attribute: format error
/// - Title not fully upper-case: skipped
/// - Live row without a link `href`: format error
///
/// # Arguments
///
/// * `document` - The parsed page
/// * `kind` - One of the three table kinds
/// * `origin` - Canonical origin for link normalization
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Absolute URLs in row order
/// * `Err(ScrapeError::Format)` - Missing rows or a malformed row
pub fn extract_table_urls(
    document: &Html,
    kind: PageKind,
    origin: &Url,
) -> ScrapeResult<Vec<String>> {
    let (rows_css, table_name) = row_set(kind)?;
    let rows_selector = selector(rows_css)?;

    let rows: Vec<ElementRef<'_>> = document.select(&rows_selector).collect();
    if rows.is_empty() {
        return Err(ScrapeError::Format(format!(
            "could not find '{}' table rows",
            table_name
        )));
    }

    let mut urls = Vec::new();
    for row in rows {
        match read_row(row, origin)? {
            RowOutcome::Link(url) => urls.push(url),
            RowOutcome::SubHeading => {
                tracing::trace!("Skipping sub-heading row in '{}'", table_name);
            }
            RowOutcome::NotLive(title) => {
                tracing::debug!("Skipping row '{}' in '{}': title is not upper-case", title, table_name);
            }
        }
    }

    Ok(urls)
}

fn read_row(row: ElementRef<'_>, origin: &Url) -> ScrapeResult<RowOutcome> {
    let cells: Vec<ElementRef<'_>> = child_elements(row, "td").collect();

    let Some(title_cell) = cells.get(1) else {
        if row.value().attr("class").is_none() {
            return Err(ScrapeError::Format(format!(
                "table row matches no expected format: '{}'",
                element_text(&row)
            )));
        }
        return Ok(RowOutcome::SubHeading);
    };

    let title = element_text(title_cell);
    if title.to_uppercase() != title {
        return Ok(RowOutcome::NotLive(title));
    }

    let link_selector = selector("a")?;
    let href = cells[0]
        .select(&link_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or_else(|| {
            ScrapeError::Format(format!("could not find 'href' attribute for row '{}'", title))
        })?;

    let url = normalize_url(href, origin)
        .map_err(|e| ScrapeError::Format(format!("invalid link for row '{}': {}", title, e)))?;

    Ok(RowOutcome::Link(url))
}

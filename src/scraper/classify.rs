//! Page classification
//!
//! Decision procedure, first match wins:
//!
//! 1. A heading beside a table (other than a subdivision heading) is the
//!    chapters-table marker. "Table of Chapters" is the full table and
//!    "Table of Chapters, ..." a short table; any other text is an error.
//! 2. A chapter-title heading marks a sections table.
//! 3. A section container marks a statute page.
//! 4. Otherwise the page is unrecognized.
//!
//! The chapters-table marker is checked first because it can co-occur with
//! structures the later checks would match.

use super::{element_text, has_class, selector, ScrapeError, ScrapeResult};
use crate::model::PageKind;
use scraper::{ElementRef, Html};

const TABLE_OF_CHAPTERS_HEADING: &str = "Table of Chapters";
const SHORT_TABLE_OF_CHAPTERS_PREFIX: &str = "Table of Chapters, ";
const SUBDIVISION_HEADING_CLASS: &str = "subd_no";
const CHAPTER_TITLE_SELECTOR: &str = "h2.chapter_title";
const SECTION_SELECTOR: &str = "div.section";

/// Classifies a parsed page into its layout
///
/// # Returns
///
/// * `Ok(PageKind)` - The page layout
/// * `Err(ScrapeError::Classification)` - Unrecognized heading or no known marker
pub fn classify(document: &Html) -> ScrapeResult<PageKind> {
    if let Some(heading) = find_table_of_chapters_heading(document)? {
        let text = element_text(&heading);
        return if text == TABLE_OF_CHAPTERS_HEADING {
            Ok(PageKind::ChaptersTable)
        } else if text.starts_with(SHORT_TABLE_OF_CHAPTERS_PREFIX) {
            Ok(PageKind::ChaptersShortTable)
        } else {
            Err(ScrapeError::Classification(format!(
                "could not determine page kind from table heading '{}'",
                text
            )))
        };
    }

    if document
        .select(&selector(CHAPTER_TITLE_SELECTOR)?)
        .next()
        .is_some()
    {
        return Ok(PageKind::SectionsTable);
    }

    if document.select(&selector(SECTION_SELECTOR)?).next().is_some() {
        return Ok(PageKind::Statutes);
    }

    Err(ScrapeError::Classification(
        "could not determine page kind".to_string(),
    ))
}

/// Finds the first `h2` that sits beside a `table` and is not a subdivision heading
fn find_table_of_chapters_heading(document: &Html) -> ScrapeResult<Option<ElementRef<'_>>> {
    let headings = selector("h2")?;

    Ok(document.select(&headings).find(|heading| {
        if has_class(heading, SUBDIVISION_HEADING_CLASS) {
            return false;
        }
        heading
            .parent()
            .and_then(ElementRef::wrap)
            .map(|parent| {
                parent
                    .children()
                    .filter_map(ElementRef::wrap)
                    .any(|sibling| sibling.value().name() == "table")
            })
            .unwrap_or(false)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_str(html: &str) -> ScrapeResult<PageKind> {
        classify(&Html::parse_document(html))
    }

    #[test]
    fn test_chapters_table() {
        let html = include_str!("../../tests/fixtures/chapters_table.html");
        assert_eq!(classify_str(html), Ok(PageKind::ChaptersTable));
    }

    #[test]
    fn test_chapters_short_table() {
        let html = include_str!("../../tests/fixtures/chapters_short_table.html");
        assert_eq!(classify_str(html), Ok(PageKind::ChaptersShortTable));
    }

    #[test]
    fn test_sections_table() {
        let html = include_str!("../../tests/fixtures/sections_table.html");
        assert_eq!(classify_str(html), Ok(PageKind::SectionsTable));
    }

    #[test]
    fn test_statute_pages() {
        for html in [
            include_str!("../../tests/fixtures/section_with_subdivisions.html"),
            include_str!("../../tests/fixtures/section_no_subdivisions.html"),
            include_str!("../../tests/fixtures/section_repealed.html"),
        ] {
            assert_eq!(classify_str(html), Ok(PageKind::Statutes));
        }
    }

    #[test]
    fn test_heading_text_is_trimmed() {
        let html = r#"<html><body><div><h2>
            Table of Chapters
        </h2><table><tbody><tr><td></td></tr></tbody></table></div></body></html>"#;
        assert_eq!(classify_str(html), Ok(PageKind::ChaptersTable));
    }

    #[test]
    fn test_unrecognized_table_heading() {
        let html = r#"<html><body><div><h2>Table of Contents</h2><table></table></div></body></html>"#;
        assert!(matches!(
            classify_str(html),
            Err(ScrapeError::Classification(_))
        ));
    }

    #[test]
    fn test_table_marker_wins_over_section() {
        let html = r#"<html><body>
            <div><h2>Table of Chapters, 3 - 5</h2><table></table></div>
            <div class="section"><h1>3.01 X.</h1><p>text</p></div>
        </body></html>"#;
        assert_eq!(classify_str(html), Ok(PageKind::ChaptersShortTable));
    }

    #[test]
    fn test_subdivision_heading_beside_table_is_not_a_marker() {
        let html = r#"<html><body><div class="section"><h1>1.02 X.</h1>
            <div class="subd"><h2 class="subd_no">Subd. 1.<span class="headnote">A.</span></h2>
            <table><tr><td>x</td></tr></table></div></div></body></html>"#;
        assert_eq!(classify_str(html), Ok(PageKind::Statutes));
    }

    #[test]
    fn test_no_markers() {
        let html = include_str!("../../tests/fixtures/unknown_page.html");
        assert_eq!(
            classify_str(html),
            Err(ScrapeError::Classification(
                "could not determine page kind".to_string()
            ))
        );
    }
}

//! Statute extraction from section pages

use super::{child_elements, element_text, selector, ScrapeError, ScrapeResult};
use crate::model::{Statute, Subdivision};
use scraper::{ElementRef, Html};
use std::collections::HashSet;

const SECTION_SELECTOR: &str = "div.section";
const TITLE_SELECTOR: &str = "h1";
const SUBDIVISION_SELECTOR: &str = "div.subd";
const SUBDIVISION_HEADING_SELECTOR: &str = "h2.subd_no";
const HEADNOTE_SELECTOR: &str = "span.headnote";

/// Accepted subdivision label prefixes, longest first
const SUBDIVISION_PREFIXES: &[&str] = &["Subdivision ", "Subd. ", "Subd "];

/// Marker text of a repealed section
const REPEALED_MARKER: &str = "repealed";

/// Leading text of a repealed subdivision body
const REPEALED_PREFIX: &str = "[Repealed,";

/// What a single subdivision container contributes to its statute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubdivisionOutcome {
    /// A live subdivision
    Included(Subdivision),
    /// A repealed subdivision, dropped without error
    SkippedRepealed,
    /// A subdivision whose structure is missing or inconsistent
    Malformed(String),
}

/// Extracts the statute from a parsed section page
///
/// # Extraction Rules
///
/// - No section container: format error
/// - No title heading: a lone "repealed" paragraph yields `Statute::default()`,
///   anything else is a format error
/// - The title reads `<chapter>.<section> <title>`
/// - Subdivision containers are extracted in order; repealed ones are skipped
/// - Two subdivisions sharing a number are a format error
/// - Without subdivision containers, the section paragraph becomes a single
///   unnumbered subdivision
///
/// # Returns
///
/// * `Ok(Statute)` - The statute, or the empty statute for a repealed section
/// * `Err(ScrapeError::Format)` - Missing or inconsistent structure
pub fn extract_statute(document: &Html) -> ScrapeResult<Statute> {
    let section = document
        .select(&selector(SECTION_SELECTOR)?)
        .next()
        .ok_or_else(|| ScrapeError::Format("could not find 'section' div".to_string()))?;

    let paragraph_selector = selector("p")?;

    let Some(title) = section.select(&selector(TITLE_SELECTOR)?).next() else {
        let paragraphs: Vec<ElementRef<'_>> = section.select(&paragraph_selector).collect();
        if let [lone] = paragraphs.as_slice() {
            let text = element_text(lone);
            if is_repealed(&text) {
                tracing::debug!("Section is repealed: {}", text);
                return Ok(Statute::default());
            }
        }
        return Err(ScrapeError::Format(
            "could not find statute title".to_string(),
        ));
    };

    let (chapter, section_number, title_text) = parse_title(&element_text(&title))?;

    let containers: Vec<ElementRef<'_>> = section.select(&selector(SUBDIVISION_SELECTOR)?).collect();

    let subdivisions = if containers.is_empty() {
        let paragraph = section.select(&paragraph_selector).next().ok_or_else(|| {
            ScrapeError::Format(format!(
                "could not find subdivisions or a paragraph for {}.{}",
                chapter, section_number
            ))
        })?;
        vec![Subdivision::whole_section(element_text(&paragraph))]
    } else {
        let mut subdivisions = Vec::with_capacity(containers.len());
        let mut seen_numbers = HashSet::new();
        for container in containers {
            match extract_subdivision(container) {
                SubdivisionOutcome::Included(subdivision) => {
                    // Chunk ids are keyed by number, a repeat would overwrite
                    if !seen_numbers.insert(subdivision.number.clone()) {
                        return Err(ScrapeError::Format(format!(
                            "{}.{}: duplicate subdivision {}",
                            chapter, section_number, subdivision.number
                        )));
                    }
                    subdivisions.push(subdivision);
                }
                SubdivisionOutcome::SkippedRepealed => {
                    tracing::debug!(
                        "Skipping repealed subdivision in {}.{}",
                        chapter,
                        section_number
                    );
                }
                SubdivisionOutcome::Malformed(reason) => {
                    return Err(ScrapeError::Format(format!(
                        "{}.{}: {}",
                        chapter, section_number, reason
                    )));
                }
            }
        }
        subdivisions
    };

    Ok(Statute {
        chapter,
        section: section_number,
        title: title_text,
        subdivisions,
    })
}

/// Extracts one subdivision container
///
/// # Rules
///
/// 1. The heading label must start with "Subdivision ", "Subd. " or "Subd "
/// 2. The rest splits on the first `.` into number and heading text; the
///    number must not be empty
/// 3. A heading without a headnote marks a repealed subdivision
/// 4. The headnote text must equal the parsed heading text
/// 5. Content is the first paragraph, else a flattened data table
/// 6. An empty heading is only accepted for content starting with `[Repealed,`
pub fn extract_subdivision(container: ElementRef<'_>) -> SubdivisionOutcome {
    match try_extract_subdivision(container) {
        Ok(outcome) => outcome,
        Err(ScrapeError::Format(reason)) | Err(ScrapeError::Classification(reason)) => {
            SubdivisionOutcome::Malformed(reason)
        }
    }
}

fn try_extract_subdivision(container: ElementRef<'_>) -> ScrapeResult<SubdivisionOutcome> {
    let Some(heading_node) = container
        .select(&selector(SUBDIVISION_HEADING_SELECTOR)?)
        .next()
    else {
        return Ok(SubdivisionOutcome::Malformed(
            "could not find subdivision heading".to_string(),
        ));
    };

    let label = element_text(&heading_node);
    let Some(rest) = SUBDIVISION_PREFIXES
        .iter()
        .find_map(|prefix| label.strip_prefix(prefix))
    else {
        return Ok(SubdivisionOutcome::Malformed(format!(
            "could not determine the subdivision format of '{}'",
            label
        )));
    };

    let Some((number, heading)) = rest.split_once('.') else {
        return Ok(SubdivisionOutcome::Malformed(format!(
            "could not parse subdivision number from '{}'",
            label
        )));
    };
    let number = number.trim();
    let heading = heading.trim();
    if number.is_empty() {
        return Ok(SubdivisionOutcome::Malformed(format!(
            "subdivision heading '{}' has no number",
            label
        )));
    }

    let Some(headnote) = heading_node.select(&selector(HEADNOTE_SELECTOR)?).next() else {
        return Ok(SubdivisionOutcome::SkippedRepealed);
    };

    let headnote_text = element_text(&headnote);
    if headnote_text != heading {
        return Ok(SubdivisionOutcome::Malformed(format!(
            "headnote '{}' does not match heading '{}'",
            headnote_text, heading
        )));
    }

    let Some(content) = read_content(container)? else {
        return Ok(SubdivisionOutcome::Malformed(format!(
            "could not determine the body of subdivision {}",
            number
        )));
    };

    if heading.is_empty() {
        if content.starts_with(REPEALED_PREFIX) {
            return Ok(SubdivisionOutcome::SkippedRepealed);
        }
        return Ok(SubdivisionOutcome::Malformed(format!(
            "subdivision {} has an empty heading but is not repealed",
            number
        )));
    }

    Ok(SubdivisionOutcome::Included(Subdivision {
        number: number.to_string(),
        heading: heading.to_string(),
        content,
    }))
}

/// Reads subdivision content from the first paragraph or a data table
fn read_content(container: ElementRef<'_>) -> ScrapeResult<Option<String>> {
    if let Some(paragraph) = child_elements(container, "p").next() {
        return Ok(Some(element_text(&paragraph)));
    }

    if let Some(table) = container.select(&selector("table")?).next() {
        return Ok(Some(flatten_table(table)?));
    }

    Ok(None)
}

/// Flattens a table into CSV-like text: rows joined by newlines, cells by commas
fn flatten_table(table: ElementRef<'_>) -> ScrapeResult<String> {
    let row_selector = selector("tr")?;
    let cell_selector = selector("td, th")?;

    let rows: Vec<String> = table
        .select(&row_selector)
        .map(|row| {
            row.select(&cell_selector)
                .map(|cell| element_text(&cell))
                .collect::<Vec<_>>()
                .join(",")
        })
        .filter(|row| !row.is_empty())
        .collect();

    Ok(rows.join("\n"))
}

/// Splits `<chapter>.<section> <title>` into its parts
fn parse_title(text: &str) -> ScrapeResult<(String, String, String)> {
    let (id, title) = text
        .split_once(' ')
        .ok_or_else(|| ScrapeError::Format(format!("could not split statute title '{}'", text)))?;

    let (chapter, section) = id
        .split_once('.')
        .ok_or_else(|| ScrapeError::Format(format!("could not split statute id '{}'", id)))?;

    Ok((
        chapter.to_string(),
        section.to_string(),
        title.trim().to_string(),
    ))
}

fn is_repealed(text: &str) -> bool {
    text.to_lowercase().contains(REPEALED_MARKER)
}

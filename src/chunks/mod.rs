//! Chunk building for parsed statutes
//!
//! A statute becomes one chunk per subdivision, in source order. Chunk ids are
//! deterministic, so re-scraping the same page rewrites identical chunks.

use crate::model::{Chunk, Statute};

/// Separator between the statute title and a subdivision heading in a chunk body
const HEADING_SEPARATOR: &str = " -- ";

/// File extension used for chunk objects in an object store
const CHUNK_EXTENSION: &str = "txt";

/// Builds the chunks for a statute
///
/// # Chunk Format
///
/// - `id` is `<chapter>.<section>`, suffixed with `.<number>` when the
///   subdivision number is non-empty
/// - `body` is `<id>: <title>[ -- <heading>]\n<content>` ending in exactly one
///   trailing newline (added only when the content lacks one)
///
/// # Example
///
/// ```
/// use statute_crawler::chunks::build_chunks;
/// use statute_crawler::model::{Statute, Subdivision};
///
/// let statute = Statute {
///     chapter: "2b".to_string(),
///     section: "34".to_string(),
///     title: "statute without any subdivisions".to_string(),
///     subdivisions: vec![Subdivision::whole_section("not really a subdivision")],
/// };
/// let chunks = build_chunks(&statute);
/// assert_eq!(chunks[0].id, "2b.34");
/// ```
pub fn build_chunks(statute: &Statute) -> Vec<Chunk> {
    let statute_id = statute.id();

    statute
        .subdivisions
        .iter()
        .map(|subdivision| {
            let id = if subdivision.number.is_empty() {
                statute_id.clone()
            } else {
                format!("{}.{}", statute_id, subdivision.number)
            };

            let mut body = format!("{}: {}", id, statute.title);
            if !subdivision.heading.is_empty() {
                body.push_str(HEADING_SEPARATOR);
                body.push_str(&subdivision.heading);
            }
            body.push('\n');
            body.push_str(&subdivision.content);
            if !subdivision.content.ends_with('\n') {
                body.push('\n');
            }

            Chunk { id, body }
        })
        .collect()
}

/// Returns the object key under which a chunk is stored
///
/// Keys have the form `<prefix>/<id>.txt`.
pub fn chunk_object_key(prefix: &str, chunk_id: &str) -> String {
    format!("{}/{}.{}", prefix, chunk_id, CHUNK_EXTENSION)
}

/// Recovers a chunk id from its object key
///
/// Takes the last path segment and drops its final extension, so ids that
/// contain dots survive intact.
///
/// # Examples
///
/// ```
/// use statute_crawler::chunks::chunk_key_to_id;
///
/// assert_eq!(chunk_key_to_id("bucket/chunk/1.2.3.txt"), "1.2.3");
/// ```
pub fn chunk_key_to_id(key: &str) -> &str {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    match file_name.rfind('.') {
        Some(pos) => &file_name[..pos],
        None => file_name,
    }
}

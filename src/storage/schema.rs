//! Database schema definitions
//!
//! One database file holds every named queue, the seen-URL set, raw pages and
//! chunks, so a single path is enough to run the trigger, crawl and scrape
//! stages against shared state.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Messages for every named queue
CREATE TABLE IF NOT EXISTS queue_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    queue TEXT NOT NULL,
    body TEXT NOT NULL,
    handle TEXT UNIQUE,
    visible_at INTEGER NOT NULL,
    receive_count INTEGER NOT NULL DEFAULT 0,
    sent_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_queue_messages_visible ON queue_messages(queue, visible_at);

-- URLs that have been fetched and stored
CREATE TABLE IF NOT EXISTS seen_urls (
    url TEXT PRIMARY KEY,
    seen_at TEXT NOT NULL
);

-- Raw page bodies keyed by raw key
CREATE TABLE IF NOT EXISTS raw_pages (
    key TEXT PRIMARY KEY,
    body TEXT NOT NULL,
    stored_at TEXT NOT NULL
);

-- Chunks awaiting indexing
CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    object_key TEXT NOT NULL,
    body TEXT NOT NULL,
    stored_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}

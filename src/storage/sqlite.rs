//! SQLite storage implementation
//!
//! `SqliteStorage` owns one connection and hands out lightweight handles that
//! implement the store traits. Handles are cheap to clone and share the
//! connection behind a mutex; no lock is held across an await point.

use crate::chunks::chunk_object_key;
use crate::model::{Chunk, QueueMessage};
use crate::storage::batch::{delete_in_batches, throughput_exceeded, BatchDeletePolicy};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    ChunkStore, Queue, RawPageStore, SeenUrlStore, StoreError, StoreResult,
};
use crate::storage::lock;
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type SharedConnection = Arc<Mutex<Connection>>;

/// SQLite storage backend
#[derive(Clone)]
pub struct SqliteStorage {
    conn: SharedConnection,
}

impl SqliteStorage {
    /// Opens or creates a database file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StoreError)` - Failed to open database
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        // Stages run as separate processes against one file
        conn.busy_timeout(Duration::from_secs(5))?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// A handle on the named queue
    ///
    /// Received messages stay hidden from other consumers for `visibility_timeout`.
    /// The handle never dead-letters until `with_max_receive_count` is set.
    pub fn queue(&self, name: &str, visibility_timeout: Duration) -> SqliteQueue {
        SqliteQueue {
            conn: self.conn.clone(),
            name: name.to_string(),
            visibility_timeout,
            max_receive_count: None,
        }
    }

    /// A handle on the seen-URL set
    pub fn seen_store(&self, policy: BatchDeletePolicy) -> SqliteSeenStore {
        SqliteSeenStore {
            conn: self.conn.clone(),
            policy,
        }
    }

    /// A handle on the raw page store
    ///
    /// When `events_queue` is set, every write also sends the written key to
    /// that queue in the same transaction.
    pub fn raw_store(&self, events_queue: Option<&str>) -> SqliteRawStore {
        SqliteRawStore {
            conn: self.conn.clone(),
            events_queue: events_queue.map(str::to_string),
        }
    }

    /// A handle on the chunk store, publishing objects under `prefix`
    pub fn chunk_store(&self, prefix: &str) -> SqliteChunkStore {
        SqliteChunkStore {
            conn: self.conn.clone(),
            prefix: prefix.to_string(),
        }
    }

    /// Counts messages in a queue
    ///
    /// # Returns
    ///
    /// * `Ok((visible, in_flight))` - Messages ready for delivery and messages
    ///   currently hidden by a visibility timeout
    pub fn queue_depth(&self, name: &str) -> StoreResult<(u64, u64)> {
        let conn = lock(&self.conn)?;
        let now = now_millis();
        let (visible, in_flight): (i64, i64) = conn.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN visible_at <= ?2 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN visible_at > ?2 THEN 1 ELSE 0 END), 0)
             FROM queue_messages WHERE queue = ?1",
            params![name, now],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((visible as u64, in_flight as u64))
    }

    /// Counts seen URLs
    pub fn count_seen_urls(&self) -> StoreResult<u64> {
        self.count("SELECT COUNT(*) FROM seen_urls")
    }

    /// Counts stored raw pages
    pub fn count_raw_pages(&self) -> StoreResult<u64> {
        self.count("SELECT COUNT(*) FROM raw_pages")
    }

    /// Counts stored chunks
    pub fn count_chunks(&self) -> StoreResult<u64> {
        self.count("SELECT COUNT(*) FROM chunks")
    }

    fn count(&self, sql: &str) -> StoreResult<u64> {
        let conn = lock(&self.conn)?;
        let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

/// Name of the queue that receives messages dead-lettered from `queue`
pub fn dead_letter_queue_name(queue: &str) -> String {
    format!("{}-dlq", queue)
}

/// A named queue stored in SQLite
#[derive(Clone)]
pub struct SqliteQueue {
    conn: SharedConnection,
    name: String,
    visibility_timeout: Duration,
    max_receive_count: Option<u32>,
}

impl SqliteQueue {
    /// Moves messages already delivered `max` times to the dead-letter queue
    /// instead of delivering them again
    pub fn with_max_receive_count(mut self, max: u32) -> Self {
        self.max_receive_count = Some(max);
        self
    }

    /// The queue's name
    pub fn name(&self) -> &str {
        &self.name
    }

    fn receive(&self) -> StoreResult<QueueMessage> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        let now = now_millis();

        let (id, body) = loop {
            let next: Option<(i64, String, i64)> = tx
                .query_row(
                    "SELECT id, body, receive_count FROM queue_messages
                     WHERE queue = ?1 AND visible_at <= ?2
                     ORDER BY visible_at, id LIMIT 1",
                    params![self.name, now],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            let Some((id, body, receive_count)) = next else {
                tx.commit()?;
                return Ok(QueueMessage::empty());
            };

            // Exhausted messages leave the queue rather than being delivered
            match self.max_receive_count {
                Some(max) if receive_count >= i64::from(max) => {
                    let dead_letters = dead_letter_queue_name(&self.name);
                    tx.execute(
                        "UPDATE queue_messages SET queue = ?1, handle = NULL, visible_at = ?2
                         WHERE id = ?3",
                        params![dead_letters, now, id],
                    )?;
                    tracing::warn!(
                        "Moved message '{}' to {} after {} receives",
                        body,
                        dead_letters,
                        receive_count
                    );
                }
                _ => break (id, body),
            }
        };

        let handle = new_receipt_handle();
        let hidden_until = now + self.visibility_timeout.as_millis() as i64;
        tx.execute(
            "UPDATE queue_messages
             SET handle = ?1, visible_at = ?2, receive_count = receive_count + 1
             WHERE id = ?3",
            params![handle, hidden_until, id],
        )?;
        tx.commit()?;

        Ok(QueueMessage::received(body, handle))
    }
}

#[async_trait]
impl Queue for SqliteQueue {
    async fn clear(&self) -> StoreResult<()> {
        let conn = lock(&self.conn)?;
        let removed = conn.execute(
            "DELETE FROM queue_messages WHERE queue = ?1",
            params![self.name],
        )?;
        tracing::debug!("Cleared {} messages from queue {}", removed, self.name);
        Ok(())
    }

    async fn send_message(&self, message: QueueMessage) -> StoreResult<()> {
        let conn = lock(&self.conn)?;
        insert_message(&conn, &self.name, &message.body)?;
        Ok(())
    }

    async fn receive_message(&self) -> StoreResult<QueueMessage> {
        self.receive()
    }

    async fn delete_message_by_handle(&self, handle: &str) -> StoreResult<()> {
        let conn = lock(&self.conn)?;
        let removed = conn.execute(
            "DELETE FROM queue_messages WHERE queue = ?1 AND handle = ?2",
            params![self.name, handle],
        )?;
        if removed == 0 {
            return Err(StoreError::UnknownHandle(handle.to_string()));
        }
        Ok(())
    }
}

/// The seen-URL set stored in SQLite
#[derive(Clone)]
pub struct SqliteSeenStore {
    conn: SharedConnection,
    policy: BatchDeletePolicy,
}

impl SqliteSeenStore {
    fn all_urls(&self) -> StoreResult<Vec<String>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare("SELECT url FROM seen_urls")?;
        let urls = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }

    fn delete_urls(&self, urls: &[String]) -> StoreResult<()> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction().map_err(classify_write_error)?;
        for url in urls {
            tx.execute("DELETE FROM seen_urls WHERE url = ?1", params![url])
                .map_err(classify_write_error)?;
        }
        tx.commit().map_err(classify_write_error)
    }
}

#[async_trait]
impl SeenUrlStore for SqliteSeenStore {
    async fn put_url(&self, url: &str) -> StoreResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT OR REPLACE INTO seen_urls (url, seen_at) VALUES (?1, ?2)",
            params![url, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    async fn has_url(&self, url: &str) -> StoreResult<bool> {
        let conn = lock(&self.conn)?;
        let found = conn
            .query_row(
                "SELECT 1 FROM seen_urls WHERE url = ?1",
                params![url],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    async fn delete_all(&self) -> StoreResult<()> {
        let urls = self.all_urls()?;
        let total = urls.len();

        let batches = delete_in_batches(urls, &self.policy, |batch| {
            std::future::ready(self.delete_urls(&batch))
        })
        .await?;

        tracing::info!("Deleted {} seen URLs in {} batches", total, batches);
        Ok(())
    }
}

/// Raw page bodies stored in SQLite
#[derive(Clone)]
pub struct SqliteRawStore {
    conn: SharedConnection,
    events_queue: Option<String>,
}

#[async_trait]
impl RawPageStore for SqliteRawStore {
    async fn get_text_file(&self, key: &str) -> StoreResult<String> {
        let conn = lock(&self.conn)?;
        conn.query_row(
            "SELECT body FROM raw_pages WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn put_text_file(&self, key: &str, body: &str) -> StoreResult<()> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO raw_pages (key, body, stored_at) VALUES (?1, ?2, ?3)",
            params![key, body, Utc::now().to_rfc3339()],
        )?;
        if let Some(queue) = &self.events_queue {
            insert_message(&tx, queue, key)?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn delete_text_file(&self, key: &str) -> StoreResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute("DELETE FROM raw_pages WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Chunks stored in SQLite
#[derive(Clone)]
pub struct SqliteChunkStore {
    conn: SharedConnection,
    prefix: String,
}

#[async_trait]
impl ChunkStore for SqliteChunkStore {
    async fn put_chunk(&self, chunk: &Chunk) -> StoreResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT OR REPLACE INTO chunks (id, object_key, body, stored_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                chunk.id,
                chunk_object_key(&self.prefix, &chunk.id),
                chunk.body,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    async fn get_chunk(&self, id: &str) -> StoreResult<Chunk> {
        let conn = lock(&self.conn)?;
        conn.query_row(
            "SELECT id, body FROM chunks WHERE id = ?1",
            params![id],
            |row| {
                Ok(Chunk {
                    id: row.get(0)?,
                    body: row.get(1)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

fn insert_message(conn: &Connection, queue: &str, body: &str) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO queue_messages (queue, body, visible_at, sent_at) VALUES (?1, ?2, ?3, ?4)",
        params![queue, body, now_millis(), Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn new_receipt_handle() -> String {
    let mut rng = rand::rng();
    format!("{:016x}{:016x}", rng.random::<u64>(), rng.random::<u64>())
}

/// Maps lock contention on a write to a throughput condition
fn classify_write_error(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(
                failure.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ) =>
        {
            throughput_exceeded(err.to_string())
        }
        _ => StoreError::Sqlite(err),
    }
}

//! Store traits and error types
//!
//! This module defines the capability sets the crawl loop, trigger and scrape
//! orchestrator depend on. Implementations must be safe to share between
//! concurrently running workers.

use crate::model::{Chunk, QueueMessage};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown receipt handle: {0}")]
    UnknownHandle(String),

    #[error("Provisioned throughput exceeded: {0}")]
    ThroughputExceeded(String),

    #[error("Retry quota exceeded: {0}")]
    RetryQuotaExceeded(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns true for write-throughput conditions that clear after a backoff
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ThroughputExceeded(_) | Self::RetryQuotaExceeded(_))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A durable queue with at-least-once delivery
///
/// Received messages stay invisible to other consumers until their visibility
/// timeout lapses; deleting a message by its handle acknowledges it.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Removes every message from the queue
    async fn clear(&self) -> StoreResult<()>;

    /// Sends a message body
    async fn send_message(&self, message: QueueMessage) -> StoreResult<()>;

    /// Receives one message, or an empty message when none is available
    async fn receive_message(&self) -> StoreResult<QueueMessage>;

    /// Acknowledges a message by its receipt handle
    async fn delete_message_by_handle(&self, handle: &str) -> StoreResult<()>;

    /// Sends a URL to the queue
    async fn send_url(&self, url: &str) -> StoreResult<()> {
        self.send_message(QueueMessage::new(url)).await
    }

    /// Acknowledges a received message
    async fn delete_message(&self, message: &QueueMessage) -> StoreResult<()> {
        self.delete_message_by_handle(&message.handle).await
    }
}

/// A durable set of URLs that have been fetched and stored
#[async_trait]
pub trait SeenUrlStore: Send + Sync {
    /// Marks a URL as seen
    async fn put_url(&self, url: &str) -> StoreResult<()>;

    /// Checks whether a URL has been seen
    async fn has_url(&self, url: &str) -> StoreResult<bool>;

    /// Deletes every record, in rate-limited batches
    async fn delete_all(&self) -> StoreResult<()>;
}

/// A key/value store for raw page bodies
#[async_trait]
pub trait RawPageStore: Send + Sync {
    /// Reads the text stored under a key
    async fn get_text_file(&self, key: &str) -> StoreResult<String>;

    /// Writes text under a key, replacing any previous value
    async fn put_text_file(&self, key: &str, body: &str) -> StoreResult<()>;

    /// Deletes the text stored under a key
    async fn delete_text_file(&self, key: &str) -> StoreResult<()>;
}

/// A store for chunks awaiting indexing
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Writes a chunk, replacing any chunk with the same id
    async fn put_chunk(&self, chunk: &Chunk) -> StoreResult<()>;

    /// Reads a chunk by id
    async fn get_chunk(&self, id: &str) -> StoreResult<Chunk>;
}

//! Storage module for the crawl and scrape collaborators
//!
//! This module defines the stores the crawl and scrape stages talk to, and
//! provides two backends for them:
//! - A SQLite backend holding named queues, the seen-URL set, raw pages and chunks
//! - An in-memory backend for tests and embedding
//!
//! All cross-component communication goes through these stores; no component
//! reaches into another's state directly.

mod batch;
mod memory;
mod schema;
mod sqlite;
mod traits;

pub use batch::{delete_in_batches, BatchDeletePolicy};
pub use memory::{MemoryChunkStore, MemoryQueue, MemoryRawStore, MemorySeenStore};
pub use sqlite::{
    dead_letter_queue_name, SqliteChunkStore, SqliteQueue, SqliteRawStore, SqliteSeenStore, SqliteStorage,
};
pub use traits::{ChunkStore, Queue, RawPageStore, SeenUrlStore, StoreError, StoreResult};

use std::sync::{Mutex, MutexGuard};

/// Name of the queue holding URLs waiting to be crawled
pub const FRONTIER_QUEUE: &str = "frontier";

/// Name of the queue holding raw-page events waiting to be scraped
pub const RAW_EVENTS_QUEUE: &str = "raw-events";

/// Key prefix under which chunk objects are published
pub const CHUNK_PATH_PREFIX: &str = "chunk";

/// Locks a mutex, reporting a poisoned lock as an unavailable store
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> StoreResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
}

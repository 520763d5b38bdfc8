//! In-memory store implementations
//!
//! These keep everything in process memory behind mutexes. They honour the
//! same contracts as the SQLite backend, except that in-flight messages are
//! only redelivered when `requeue_in_flight` is called.

use crate::model::{Chunk, QueueMessage};
use crate::storage::lock;
use crate::storage::traits::{
    ChunkStore, Queue, RawPageStore, SeenUrlStore, StoreError, StoreResult,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<String>,
    in_flight: BTreeMap<String, String>,
    next_handle: u64,
}

/// An in-memory queue
#[derive(Debug, Default)]
pub struct MemoryQueue {
    state: Mutex<QueueState>,
}

impl MemoryQueue {
    /// Creates an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Bodies waiting for delivery, in delivery order
    pub fn pending(&self) -> Vec<String> {
        lock(&self.state)
            .map(|state| state.pending.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of received but unacknowledged messages
    pub fn in_flight_len(&self) -> usize {
        lock(&self.state)
            .map(|state| state.in_flight.len())
            .unwrap_or_default()
    }

    /// Makes every unacknowledged message deliverable again
    ///
    /// Simulates the visibility timeout lapsing.
    pub fn requeue_in_flight(&self) -> StoreResult<()> {
        let mut state = lock(&self.state)?;
        let expired = std::mem::take(&mut state.in_flight);
        state.pending.extend(expired.into_values());
        Ok(())
    }
}

#[async_trait]
impl Queue for MemoryQueue {
    async fn clear(&self) -> StoreResult<()> {
        let mut state = lock(&self.state)?;
        state.pending.clear();
        state.in_flight.clear();
        Ok(())
    }

    async fn send_message(&self, message: QueueMessage) -> StoreResult<()> {
        lock(&self.state)?.pending.push_back(message.body);
        Ok(())
    }

    async fn receive_message(&self) -> StoreResult<QueueMessage> {
        let mut state = lock(&self.state)?;
        let Some(body) = state.pending.pop_front() else {
            return Ok(QueueMessage::empty());
        };

        state.next_handle += 1;
        let handle = format!("h-{}", state.next_handle);
        state.in_flight.insert(handle.clone(), body.clone());
        Ok(QueueMessage::received(body, handle))
    }

    async fn delete_message_by_handle(&self, handle: &str) -> StoreResult<()> {
        lock(&self.state)?
            .in_flight
            .remove(handle)
            .map(|_| ())
            .ok_or_else(|| StoreError::UnknownHandle(handle.to_string()))
    }
}

/// An in-memory seen-URL set
#[derive(Debug, Default)]
pub struct MemorySeenStore {
    urls: Mutex<HashSet<String>>,
}

impl MemorySeenStore {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of seen URLs
    pub fn len(&self) -> usize {
        lock(&self.urls).map(|urls| urls.len()).unwrap_or_default()
    }

    /// Returns true when no URL has been seen
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SeenUrlStore for MemorySeenStore {
    async fn put_url(&self, url: &str) -> StoreResult<()> {
        lock(&self.urls)?.insert(url.to_string());
        Ok(())
    }

    async fn has_url(&self, url: &str) -> StoreResult<bool> {
        Ok(lock(&self.urls)?.contains(url))
    }

    async fn delete_all(&self) -> StoreResult<()> {
        lock(&self.urls)?.clear();
        Ok(())
    }
}

/// An in-memory raw page store
#[derive(Debug, Default)]
pub struct MemoryRawStore {
    pages: Mutex<HashMap<String, String>>,
}

impl MemoryRawStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when a page is stored under `key`
    pub fn contains(&self, key: &str) -> bool {
        lock(&self.pages)
            .map(|pages| pages.contains_key(key))
            .unwrap_or_default()
    }

    /// Sorted keys of every stored page
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.pages)
            .map(|pages| pages.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[async_trait]
impl RawPageStore for MemoryRawStore {
    async fn get_text_file(&self, key: &str) -> StoreResult<String> {
        lock(&self.pages)?
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn put_text_file(&self, key: &str, body: &str) -> StoreResult<()> {
        lock(&self.pages)?.insert(key.to_string(), body.to_string());
        Ok(())
    }

    async fn delete_text_file(&self, key: &str) -> StoreResult<()> {
        lock(&self.pages)?.remove(key);
        Ok(())
    }
}

/// An in-memory chunk store
#[derive(Debug, Default)]
pub struct MemoryChunkStore {
    chunks: Mutex<BTreeMap<String, Chunk>>,
}

impl MemoryChunkStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored chunk, ordered by id
    pub fn chunks(&self) -> Vec<Chunk> {
        lock(&self.chunks)
            .map(|chunks| chunks.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn put_chunk(&self, chunk: &Chunk) -> StoreResult<()> {
        lock(&self.chunks)?.insert(chunk.id.clone(), chunk.clone());
        Ok(())
    }

    async fn get_chunk(&self, id: &str) -> StoreResult<Chunk> {
        lock(&self.chunks)?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

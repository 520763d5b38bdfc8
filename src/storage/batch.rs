//! Batched deletion with write-throughput backoff
//!
//! Wiping the seen-URL set can touch many thousands of records. Deletes are
//! issued in batches no larger than the store's batch limit, with a fixed delay
//! before each batch. A batch that fails with a throughput condition is retried
//! after an extended backoff; any other failure aborts the wipe.

use super::{StoreError, StoreResult};
use std::future::Future;
use std::time::Duration;

/// Pacing for batched deletes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDeletePolicy {
    /// Maximum records per delete request
    pub batch_size: usize,

    /// Delay before each batch is written
    pub batch_delay: Duration,

    /// Delay before retrying a batch rejected for throughput
    pub backoff: Duration,
}

impl Default for BatchDeletePolicy {
    fn default() -> Self {
        Self {
            batch_size: 25,
            batch_delay: Duration::from_secs(1),
            backoff: Duration::from_secs(5),
        }
    }
}

/// Deletes `keys` in batches, retrying throughput failures
///
/// # Arguments
///
/// * `keys` - Every key to delete
/// * `policy` - Batch size and pacing
/// * `delete_batch` - Deletes one batch of keys
///
/// # Returns
///
/// * `Ok(usize)` - Number of batches written
/// * `Err(StoreError)` - A batch failed with a non-retryable error
pub async fn delete_in_batches<K, F, Fut>(
    keys: Vec<K>,
    policy: &BatchDeletePolicy,
    mut delete_batch: F,
) -> StoreResult<usize>
where
    K: Clone,
    F: FnMut(Vec<K>) -> Fut,
    Fut: Future<Output = StoreResult<()>>,
{
    let batch_size = policy.batch_size.max(1);
    let mut written = 0;

    for batch in keys.chunks(batch_size) {
        tokio::time::sleep(policy.batch_delay).await;
        written += 1;
        tracing::debug!("Writing delete batch {} ({} records)", written, batch.len());

        loop {
            match delete_batch(batch.to_vec()).await {
                Ok(()) => break,
                Err(e) if e.is_retryable() => {
                    tracing::warn!(
                        "Delete batch {} rejected ({}), retrying in {:?}",
                        written,
                        e,
                        policy.backoff
                    );
                    tokio::time::sleep(policy.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(written)
}

/// Builds the error reported when a batch is rejected for throughput
pub(crate) fn throughput_exceeded(detail: impl Into<String>) -> StoreError {
    StoreError::ThroughputExceeded(detail.into())
}

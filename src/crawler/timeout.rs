//! Bounded execution of collaborator calls

use crate::{CrawlError, Result};
use std::future::Future;
use std::time::Duration;

/// Runs `fut` under `limit`, reporting expiry as `CrawlError::Timeout`
///
/// # Arguments
///
/// * `operation` - Short name of the call, used in the error
/// * `limit` - Time allowed for the call
/// * `fut` - The call itself
pub async fn bounded<T, E, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: Into<CrawlError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(CrawlError::Timeout { operation }),
    }
}

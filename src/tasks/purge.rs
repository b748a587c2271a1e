//! Expired Entry Purge Task
//!
//! Background task that periodically deletes rows whose TTL has elapsed.
//! Reads already hide expired entries; this only reclaims space.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::store::StoreHandle;

/// Spawns a background task that periodically purges expired entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between runs. Storage errors (a busy database, for instance) are logged
/// and the next run tries again.
///
/// # Arguments
/// * `handle` - Shared store handle; the store is opened on the first run if needed
/// * `purge_interval_secs` - Interval in seconds between purge runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = StoreHandle::new(Config::from_env());
/// let purge_handle = spawn_purge_task(handle.clone(), 60);
/// // Later, during shutdown:
/// purge_handle.abort();
/// ```
pub fn spawn_purge_task(handle: StoreHandle, purge_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(purge_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expired-entry purge task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = match handle.store().await {
                Ok(store) => store.purge_expired().await,
                Err(e) => Err(e),
            };

            match removed {
                Ok(0) => debug!("Purge: no expired entries found"),
                Ok(n) => info!("Purge: removed {} expired entries", n),
                Err(e) => warn!("Purge failed: {}", e),
            }
        }
    })
}

//! Maintenance Tasks
//!
//! Background tasks that periodically sweep expired cache entries and
//! garbage-collect old terminal job records.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::jobs::JobManager;

// == Cache Cleanup ==
/// Spawns a background task that periodically removes expired cache
/// entries.
///
/// Returns a JoinHandle for the spawned task, which is aborted during
/// graceful shutdown.
pub fn spawn_cache_cleanup_task(
    cache: Arc<RwLock<CacheStore<Value>>>,
    interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting cache TTL cleanup task with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.cleanup_expired()
            };

            if removed > 0 {
                info!("Cache cleanup: removed {} expired entries", removed);
            } else {
                debug!("Cache cleanup: no expired entries found");
            }
        }
    })
}

// == Job Retention Cleanup ==
/// Spawns a background task that periodically removes terminal job
/// records older than the retention period.
///
/// Process-wide maintenance, not per-request; the retention window is a
/// configuration input.
pub fn spawn_job_cleanup_task(
    jobs: Arc<JobManager>,
    interval_secs: u64,
    retention_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);
    let retention = Duration::from_secs(retention_secs);

    tokio::spawn(async move {
        info!(
            "Starting job retention task: interval {}s, retention {}s",
            interval_secs, retention_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = jobs.cleanup(retention).await;
            if removed == 0 {
                debug!("Job cleanup: nothing to remove");
            }
        }
    })
}

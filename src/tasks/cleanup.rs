//! Cleanup Task
//!
//! Background task that periodically sweeps expired cache entries and drops
//! rate-limiter clients whose windows have emptied.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::ratelimit::RateLimiter;

/// Spawns the periodic cleanup loop.
///
/// `get` already evicts lazily; the sweep bounds memory held by keys that
/// are never read again.
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(state.cache.clone(), state.limiter.clone(), interval);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task(
    cache: Arc<RwLock<CacheStore>>,
    limiter: Arc<Mutex<RateLimiter>>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs_f64(), "Starting cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let expired = cache.write().await.cleanup_expired();
            let idle = limiter.lock().await.prune_idle();

            if expired > 0 || idle > 0 {
                info!(expired, idle_clients = idle, "cleanup pass finished");
            } else {
                debug!("cleanup pass: nothing to remove");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shared_state() -> (Arc<RwLock<CacheStore>>, Arc<Mutex<RateLimiter>>) {
        (
            Arc::new(RwLock::new(CacheStore::new(Duration::from_secs(300)))),
            Arc::new(Mutex::new(RateLimiter::new(60, 1000))),
        )
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let (cache, limiter) = shared_state();
        cache
            .write()
            .await
            .set("expire_soon", json!("value"), Some(Duration::from_millis(20)));

        let handle = spawn_cleanup_task(cache.clone(), limiter, Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(200)).await;

        // size() does not evict, so only the sweep can have removed it
        assert_eq!(cache.read().await.size(), 0);
        assert_eq!(cache.read().await.stats().expirations, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let (cache, limiter) = shared_state();
        cache
            .write()
            .await
            .set("long_lived", json!("value"), Some(Duration::from_secs(3600)));

        let handle = spawn_cleanup_task(cache.clone(), limiter, Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.write().await.get("long_lived"), Some(json!("value")));

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let (cache, limiter) = shared_state();
        let handle = spawn_cleanup_task(cache, limiter, Duration::from_secs(1));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}

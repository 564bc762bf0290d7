//! Expiry Sweep Task
//!
//! Lookups only notice expiry for the key they ask about. Entries for queries
//! that never come back would otherwise stay resident until evicted, so a
//! background task drops them on a fixed period.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::ResponseCache;

/// Starts the expiry sweep over `cache`, once every `interval_secs` seconds
/// (at least one). Abort the returned handle on shutdown.
pub fn spawn_cleanup_task(cache: Arc<RwLock<ResponseCache>>, interval_secs: u64) -> JoinHandle<()> {
    spawn_sweep(cache, Duration::from_secs(interval_secs.max(1)))
}

fn spawn_sweep(cache: Arc<RwLock<ResponseCache>>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick fires immediately; nothing can have expired yet
        ticker.tick().await;
        info!("Expiry sweep running every {:?}", period);

        loop {
            ticker.tick().await;
            sweep_once(&cache).await;
        }
    })
}

/// One pass over the cache. Returns the number of entries removed.
async fn sweep_once(cache: &RwLock<ResponseCache>) -> usize {
    let mut cache = cache.write().await;
    let removed = cache.cleanup_expired();
    if removed > 0 {
        info!("Swept {} expired entries, {} remain", removed, cache.len());
    } else {
        debug!("Expiry sweep found nothing to remove");
    }
    removed
}

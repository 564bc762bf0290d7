//! Worker pools
//!
//! Bounds the number of simultaneous upstream calls per backend. Work beyond
//! a pool's capacity queues on its semaphore.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::config::Config;
use crate::error::{ReconcileError, Result};
use crate::sources::Backend;

// == Worker Pool ==
#[derive(Debug, Clone)]
pub struct WorkerPool {
    name: &'static str,
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    /// Creates a pool running at most `capacity` tasks at once (minimum 1).
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            name,
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Runs `task` once a slot is free. The slot is returned when `task`
    /// finishes or the returned future is dropped.
    pub async fn run<F, T>(&self, task: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _permit = self.semaphore.acquire().await.map_err(|e| {
            ReconcileError::Internal(format!("{} pool closed: {}", self.name, e))
        })?;
        debug!(
            "{} pool slot acquired ({} of {} free)",
            self.name,
            self.semaphore.available_permits(),
            self.capacity
        );
        task.await
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not currently in use.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

// == Worker Pools ==
/// One pool per backend.
#[derive(Debug, Clone)]
pub struct WorkerPools {
    viaf: WorkerPool,
    orcid: WorkerPool,
    solr: WorkerPool,
}

impl WorkerPools {
    pub fn new(viaf_concurrency: usize, orcid_concurrency: usize, solr_concurrency: usize) -> Self {
        Self {
            viaf: WorkerPool::new("VIAF", viaf_concurrency),
            orcid: WorkerPool::new("ORCID", orcid_concurrency),
            solr: WorkerPool::new("Solr", solr_concurrency),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.viaf_concurrency,
            config.orcid_concurrency,
            config.solr_concurrency,
        )
    }

    pub fn for_backend(&self, backend: Backend) -> &WorkerPool {
        match backend {
            Backend::Viaf => &self.viaf,
            Backend::Orcid => &self.orcid,
            Backend::Solr => &self.solr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_pools_from_config() {
        let pools = WorkerPools::from_config(&Config::default());
        assert_eq!(pools.for_backend(Backend::Viaf).capacity(), 4);
        assert_eq!(pools.for_backend(Backend::Orcid).capacity(), 8);
        assert_eq!(pools.for_backend(Backend::Solr).capacity(), 4);
    }

    #[tokio::test]
    async fn test_backends_do_not_share_slots() {
        let pools = WorkerPools::new(1, 1, 1);
        let viaf = pools.for_backend(Backend::Viaf);
        let solr = pools.for_backend(Backend::Solr).clone();

        viaf.run(async {
            assert_eq!(solr.available(), 1);
            solr.run(async { Ok(()) }).await
        })
        .await
        .unwrap();
        assert_eq!(viaf.available(), 1);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        assert_eq!(WorkerPool::new("test", 0).capacity(), 1);
    }

    #[tokio::test]
    async fn test_run_bounds_concurrency() {
        let pool = WorkerPool::new("test", 2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks = (0..6).map(|_| {
            let pool = pool.clone();
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            tokio::spawn(async move {
                pool.run(async {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
            })
        });

        for task in tasks.collect::<Vec<_>>() {
            task.await.unwrap().unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_slot_released_on_error() {
        let pool = WorkerPool::new("test", 1);
        let result: Result<()> = pool
            .run(async { Err(ReconcileError::Connection("down".to_string())) })
            .await;

        assert!(result.is_err());
        assert_eq!(pool.available(), 1);
    }
}

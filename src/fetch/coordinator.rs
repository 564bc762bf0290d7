//! Fetch Coordinator Module
//!
//! Runs one query end to end: cache lookup, coalescing of identical
//! in-flight requests, the pooled upstream fetch, parsing and cache fill.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{CacheKey, Flight, ResponseCache, SingleFlight};
use crate::config::Config;
use crate::error::{ReconcileError, Result};
use crate::fetch::{ConnectionFactory, OpenConnection, WorkerPools};
use crate::models::{ExtraParams, Record, SearchQuery, ServiceMetadata};
use crate::sources::{Source, SourceResolver};

// == Fetch Coordinator ==
pub struct FetchCoordinator {
    resolver: SourceResolver,
    cache: Arc<RwLock<ResponseCache>>,
    flights: Arc<SingleFlight>,
    pools: WorkerPools,
    connections: Arc<dyn ConnectionFactory>,
    timeout: Duration,
}

impl FetchCoordinator {
    /// Builds a coordinator with its own cache.
    pub fn new(config: &Config, connections: Arc<dyn ConnectionFactory>) -> Self {
        let cache = Arc::new(RwLock::new(ResponseCache::from_config(config)));
        Self::with_cache(config, cache, connections)
    }

    /// Builds a coordinator around an existing shared cache.
    ///
    /// # Arguments
    /// * `config` - Pool sizes, fetch timeout and backend URLs
    /// * `cache` - Cache shared with the cleanup task and stats endpoint
    /// * `connections` - Factory used for every upstream call
    pub fn with_cache(
        config: &Config,
        cache: Arc<RwLock<ResponseCache>>,
        connections: Arc<dyn ConnectionFactory>,
    ) -> Self {
        Self {
            resolver: SourceResolver::new(config),
            cache,
            flights: SingleFlight::new(),
            pools: WorkerPools::from_config(config),
            connections,
            timeout: config.fetch_timeout(),
        }
    }

    pub fn cache(&self) -> &Arc<RwLock<ResponseCache>> {
        &self.cache
    }

    pub fn resolver(&self) -> &SourceResolver {
        &self.resolver
    }

    pub fn pools(&self) -> &WorkerPools {
        &self.pools
    }

    pub fn flights(&self) -> &Arc<SingleFlight> {
        &self.flights
    }

    pub fn describe_metadata(&self, params: &ExtraParams) -> Result<ServiceMetadata> {
        self.resolver.describe_metadata(params)
    }

    // == Search ==
    /// Returns the records for `query`, from cache or upstream.
    ///
    /// Concurrent calls for the same key share one upstream fetch. Failures
    /// are returned to every caller of that fetch and never cached.
    pub async fn search(&self, query: &SearchQuery) -> Result<Arc<Vec<Record>>> {
        let source = self.resolver.resolve(query.extra_params())?;
        let key = CacheKey::new(&source.endpoint_id(), query);

        loop {
            if let Some(records) = self.cache.write().await.get(&key) {
                debug!("Cache hit: {}", key);
                return Ok(records);
            }

            match self.flights.join(&key) {
                Flight::Leader(guard) => {
                    // A previous leader may have filled the entry since our lookup
                    if let Some(records) = self.cache.read().await.peek(&key) {
                        guard.complete(Ok(Arc::clone(&records)));
                        return Ok(records);
                    }

                    debug!("Cache miss, fetching upstream: {}", key);
                    let outcome = self.fetch(source.as_ref(), query).await.map(Arc::new);
                    match &outcome {
                        Ok(records) => {
                            self.cache
                                .write()
                                .await
                                .put(key.clone(), Arc::clone(records));
                        }
                        Err(err) => warn!("Fetch failed for {}: {}", key, err),
                    }
                    guard.complete(outcome.clone());
                    return outcome;
                }
                Flight::Follower(waiter) => {
                    self.cache.write().await.record_coalesced();
                    debug!("Waiting on in-flight fetch: {}", key);
                    match waiter.wait().await {
                        Some(outcome) => return outcome,
                        None => continue,
                    }
                }
            }
        }
    }

    // == Fetch ==
    /// One pooled upstream call. The connection is closed on every path,
    /// including timeout.
    async fn fetch(&self, source: &dyn Source, query: &SearchQuery) -> Result<Vec<Record>> {
        let url = source.resolve_endpoint(query);
        let pool = self.pools.for_backend(source.backend());

        pool.run(async {
            let body = tokio::time::timeout(self.timeout, self.read(&url))
                .await
                .map_err(|_| {
                    ReconcileError::Connection(format!(
                        "Timed out after {}ms: {}",
                        self.timeout.as_millis(),
                        url
                    ))
                })??;

            let started = Instant::now();
            let records = source.parse(query, &body)?;
            debug!(
                "Parsed {} bytes into {} records in {:?}",
                body.len(),
                records.len(),
                started.elapsed()
            );
            Ok::<_, ReconcileError>(records)
        })
        .await
    }

    /// Connects and buffers the full body; see [`crate::fetch::Connection::read_body`].
    async fn read(&self, url: &str) -> Result<Vec<u8>> {
        let mut connection = OpenConnection::new(self.connections.connect(url).await?);
        connection.read_body().await
    }
}

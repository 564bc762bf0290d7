//! Response Cache Module
//!
//! Maps request fingerprints to previously fetched record lists, with
//! lifetime expiry and oldest-first eviction.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheEntry, CacheKey, CacheStats, InsertionOrder};
use crate::config::Config;
use crate::models::Record;

// == Response Cache ==
/// Bounded response cache.
///
/// When disabled, lookups always miss and writes are dropped, but existing
/// entries and statistics are kept so the cache can be switched back on.
#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<CacheKey, CacheEntry>,
    order: InsertionOrder,
    stats: CacheStats,
    max_entries: usize,
    lifetime_ms: u64,
    enabled: bool,
}

impl ResponseCache {
    // == Constructor ==
    /// Creates an enabled cache.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries the cache can hold
    /// * `lifetime_ms` - Entry lifetime in milliseconds
    pub fn new(max_entries: usize, lifetime_ms: u64) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            stats: CacheStats::new(),
            max_entries,
            lifetime_ms,
            enabled: true,
        }
    }

    /// Creates a cache sized and enabled per configuration.
    pub fn from_config(config: &Config) -> Self {
        let mut cache = Self::new(config.cache_max_size, config.cache_lifetime_ms);
        cache.set_enabled(config.cache_enabled);
        cache
    }

    // == Get ==
    /// Returns the cached records if present and younger than the lifetime.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<Vec<Record>>> {
        if !self.enabled {
            self.stats.record_miss();
            return None;
        }

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(self.lifetime_ms),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            debug!("Cache entry expired: {}", key);
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.touch();
        self.stats.record_hit();
        Some(Arc::clone(&entry.records))
    }

    /// Like `get`, but leaves entries and statistics untouched.
    pub fn peek(&self, key: &CacheKey) -> Option<Arc<Vec<Record>>> {
        if !self.enabled {
            return None;
        }
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(self.lifetime_ms))
            .map(|entry| Arc::clone(&entry.records))
    }

    // == Put ==
    /// Stores records under `key`, overwriting any previous entry.
    ///
    /// If the cache is full, the oldest entry by creation time is evicted first.
    pub fn put(&mut self, key: CacheKey, records: Arc<Vec<Record>>) {
        if !self.enabled || self.max_entries == 0 {
            return;
        }

        let is_overwrite = self.entries.contains_key(&key);
        while !is_overwrite && self.entries.len() >= self.max_entries {
            match self.order.pop_oldest() {
                Some(evicted) => {
                    self.entries.remove(&evicted);
                    self.stats.record_eviction();
                    debug!("Evicted oldest cache entry: {}", evicted);
                }
                None => break,
            }
        }

        self.entries.insert(key.clone(), CacheEntry::new(records));
        self.order.record_write(&key);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let lifetime_ms = self.lifetime_ms;
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(lifetime_ms))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        self.stats.record_expirations(expired.len());
        expired.len()
    }

    fn remove(&mut self, key: &CacheKey) {
        self.entries.remove(key);
        self.order.remove(key);
        self.stats.set_total_entries(self.entries.len());
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record_coalesced(&mut self) {
        self.stats.record_coalesced();
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn lifetime_ms(&self) -> u64 {
        self.lifetime_ms
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchQuery;
    use std::thread::sleep;
    use std::time::Duration;

    fn key(text: &str) -> CacheKey {
        CacheKey::new("viaf", &SearchQuery::new(text, 3).unwrap())
    }

    fn records(id: &str) -> Arc<Vec<Record>> {
        Arc::new(vec![Record::new(id, format!("label {}", id))])
    }

    #[test]
    fn test_cache_new() {
        let cache = ResponseCache::new(100, 60_000);
        assert!(cache.is_empty());
        assert!(cache.is_enabled());
    }

    #[test]
    fn test_put_and_get() {
        let mut cache = ResponseCache::new(100, 60_000);
        cache.put(key("austen"), records("1"));

        let hit = cache.get(&key("austen")).unwrap();
        assert_eq!(hit[0].id, "1");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let mut cache = ResponseCache::new(100, 60_000);
        assert!(cache.get(&key("nothing")).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_overwrite() {
        let mut cache = ResponseCache::new(100, 60_000);
        cache.put(key("austen"), records("1"));
        cache.put(key("austen"), records("2"));

        assert_eq!(cache.get(&key("austen")).unwrap()[0].id, "2");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_miss_and_removed() {
        let mut cache = ResponseCache::new(100, 50);
        cache.put(key("austen"), records("1"));
        assert!(cache.get(&key("austen")).is_some());

        sleep(Duration::from_millis(80));

        assert!(cache.get(&key("austen")).is_none());
        assert!(!cache.contains_key(&key("austen")));
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_eviction_drops_oldest_inserted() {
        let mut cache = ResponseCache::new(3, 60_000);
        cache.put(key("a"), records("a"));
        cache.put(key("b"), records("b"));
        cache.put(key("c"), records("c"));
        cache.put(key("d"), records("d"));

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains_key(&key("a")));
        assert!(cache.contains_key(&key("d")));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_reads_do_not_protect_from_eviction() {
        let mut cache = ResponseCache::new(3, 60_000);
        cache.put(key("a"), records("a"));
        cache.put(key("b"), records("b"));
        cache.put(key("c"), records("c"));

        // Reading "a" does not refresh it
        cache.get(&key("a")).unwrap();
        cache.put(key("d"), records("d"));

        assert!(!cache.contains_key(&key("a")));
        assert!(cache.contains_key(&key("b")));
    }

    #[test]
    fn test_disabled_cache_is_pass_through() {
        let mut cache = ResponseCache::new(100, 60_000);
        cache.put(key("kept"), records("1"));
        cache.set_enabled(false);

        cache.put(key("dropped"), records("2"));
        assert!(cache.get(&key("dropped")).is_none());
        assert!(cache.get(&key("kept")).is_none());
        assert_eq!(cache.len(), 1);

        cache.set_enabled(true);
        assert!(cache.get(&key("kept")).is_some());
    }

    #[test]
    fn test_peek_leaves_stats_alone() {
        let mut cache = ResponseCache::new(100, 60_000);
        cache.put(key("a"), records("a"));

        assert!(cache.peek(&key("a")).is_some());
        assert!(cache.peek(&key("b")).is_none());
        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.stats().misses, 0);

        cache.set_enabled(false);
        assert!(cache.peek(&key("a")).is_none());
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut cache = ResponseCache::new(0, 60_000);
        cache.put(key("a"), records("a"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cleanup_expired() {
        let mut cache = ResponseCache::new(100, 50);
        cache.put(key("a"), records("a"));
        cache.put(key("b"), records("b"));

        sleep(Duration::from_millis(80));

        assert_eq!(cache.cleanup_expired(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            cache_enabled: false,
            cache_max_size: 7,
            cache_lifetime_ms: 1_000,
            ..Config::default()
        };
        let cache = ResponseCache::from_config(&config);
        assert!(!cache.is_enabled());
        assert_eq!(cache.max_entries(), 7);
        assert_eq!(cache.lifetime_ms(), 1_000);
    }
}

//! Cache Entry Module
//!
//! Defines the structure for individual cached responses.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::Record;

// == Cache Entry ==
/// A cached record list with its creation time and access bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached records, shared with every caller that reads them
    pub records: Arc<Vec<Record>>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Last successful lookup (Unix milliseconds)
    pub last_accessed_at: u64,
    /// Number of successful lookups
    pub hits: u64,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(records: Arc<Vec<Record>>) -> Self {
        let now = current_timestamp_ms();
        Self {
            records,
            created_at: now,
            last_accessed_at: now,
            hits: 0,
        }
    }

    // == Age ==
    /// Milliseconds since the entry was created.
    pub fn age_ms(&self) -> u64 {
        current_timestamp_ms().saturating_sub(self.created_at)
    }

    // == Is Expired ==
    /// An entry expires once its age reaches the lifetime.
    pub fn is_expired(&self, lifetime_ms: u64) -> bool {
        self.age_ms() >= lifetime_ms
    }

    /// Records a successful lookup.
    pub fn touch(&mut self) {
        self.hits += 1;
        self.last_accessed_at = current_timestamp_ms();
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

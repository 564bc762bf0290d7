//! Insertion Order Module
//!
//! Tracks the order in which cache entries were written, for oldest-first eviction.

use std::collections::VecDeque;

use crate::cache::CacheKey;

// == Insertion Order ==
/// Keys ordered by the time their current entry was written.
///
/// - Front = Oldest entry
/// - Back = Newest entry
///
/// Lookups never reorder keys; only writes do.
#[derive(Debug, Default)]
pub struct InsertionOrder {
    order: VecDeque<CacheKey>,
}

impl InsertionOrder {
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Record Write ==
    /// Marks a key as freshly written (moves to back).
    pub fn record_write(&mut self, key: &CacheKey) {
        self.remove(key);
        self.order.push_back(key.clone());
    }

    // == Remove ==
    pub fn remove(&mut self, key: &CacheKey) {
        self.order.retain(|k| k != key);
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest key, or None if empty.
    pub fn pop_oldest(&mut self) -> Option<CacheKey> {
        self.order.pop_front()
    }

    // == Peek Oldest ==
    pub fn peek_oldest(&self) -> Option<&CacheKey> {
        self.order.front()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.order.iter().any(|k| k == key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchQuery;

    fn key(text: &str) -> CacheKey {
        CacheKey::new("viaf", &SearchQuery::new(text, 3).unwrap())
    }

    #[test]
    fn test_order_new() {
        let order = InsertionOrder::new();
        assert!(order.is_empty());
        assert_eq!(order.len(), 0);
    }

    #[test]
    fn test_oldest_is_first_written() {
        let mut order = InsertionOrder::new();
        order.record_write(&key("a"));
        order.record_write(&key("b"));
        order.record_write(&key("c"));

        assert_eq!(order.len(), 3);
        assert_eq!(order.peek_oldest(), Some(&key("a")));
    }

    #[test]
    fn test_rewrite_moves_to_back() {
        let mut order = InsertionOrder::new();
        order.record_write(&key("a"));
        order.record_write(&key("b"));
        order.record_write(&key("a"));

        assert_eq!(order.len(), 2);
        assert_eq!(order.pop_oldest(), Some(key("b")));
        assert_eq!(order.pop_oldest(), Some(key("a")));
        assert_eq!(order.pop_oldest(), None);
    }

    #[test]
    fn test_remove() {
        let mut order = InsertionOrder::new();
        order.record_write(&key("a"));
        order.record_write(&key("b"));
        order.remove(&key("a"));

        assert!(!order.contains(&key("a")));
        assert!(order.contains(&key("b")));
    }
}

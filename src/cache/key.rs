//! Cache Key Module
//!
//! Deterministic fingerprint of an upstream request.

use std::fmt;

use crate::models::SearchQuery;

/// Separator between key components; cannot appear in normalized query text.
const SEPARATOR: char = '\u{1f}';

// == Cache Key ==
/// Identifies a cacheable upstream request.
///
/// Two requests share a key iff endpoint, normalized query text, name type,
/// limit and extra parameters all match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds the key for `query` sent to the backend identified by `endpoint`.
    pub fn new(endpoint: &str, query: &SearchQuery) -> Self {
        let extras = query
            .extra_params()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let key = [
            endpoint.to_string(),
            query.normalized_query(),
            query.name_type().unwrap_or_default().to_string(),
            query.limit().to_string(),
            extras,
        ]
        .join(&SEPARATOR.to_string());

        Self(key)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.replace(SEPARATOR, "|"))
    }
}

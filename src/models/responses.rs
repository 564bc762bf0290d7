//! Response DTOs for the reconciliation API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::models::{Record, TypeLabel};

/// Result list for one query of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub result: Vec<Record>,
    /// Set when the query failed; `result` is then empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    pub fn ok(records: Vec<Record>) -> Self {
        Self {
            result: records,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            result: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// URL template for viewing an entity; `{{id}}` is replaced by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewTemplate {
    pub url: String,
}

/// Service metadata returned when a reconciliation endpoint is called without queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetadata {
    pub name: String,
    pub identifier_space: String,
    pub schema_space: String,
    pub view: ViewTemplate,
    pub default_types: Vec<TypeLabel>,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Number of entries dropped after their lifetime elapsed
    pub expirations: u64,
    /// Number of callers that waited on another caller's fetch
    pub coalesced: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            coalesced: stats.coalesced,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_result_omits_absent_error() {
        let json = serde_json::to_string(&QueryResult::ok(Vec::new())).unwrap();
        assert_eq!(json, r#"{"result":[]}"#);
    }

    #[test]
    fn test_query_result_failed() {
        let resp = QueryResult::failed("Connection error: refused");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["result"].as_array().unwrap().len(), 0);
        assert_eq!(json["error"], "Connection error: refused");
    }

    #[test]
    fn test_metadata_camel_case() {
        let meta = ServiceMetadata {
            name: "VIAF".to_string(),
            identifier_space: "http://viaf.org/viaf".to_string(),
            schema_space: "http://viaf.org/viaf".to_string(),
            view: ViewTemplate {
                url: "https://viaf.org/viaf/{{id}}".to_string(),
            },
            default_types: Vec::new(),
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("identifierSpace").is_some());
        assert!(json.get("defaultTypes").is_some());
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..CacheStats::default()
        };
        let resp = StatsResponse::from(stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}

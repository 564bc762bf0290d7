//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{DEFAULT_LIFETIME_MS, DEFAULT_MAX_SIZE};

/// Default VIAF SRU search endpoint
pub const DEFAULT_VIAF_BASE_URL: &str = "https://www.viaf.org/viaf/search";

/// Default ORCID expanded-search endpoint
pub const DEFAULT_ORCID_BASE_URL: &str = "https://pub.orcid.org/v3.0/expanded-search/";

/// Default Solr select handler
pub const DEFAULT_SOLR_URL: &str = "http://localhost:8983/solr/select";

/// Service configuration parameters.
///
/// Assembled once at startup and handed to the components that need it.
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether the response cache stores and serves entries
    pub cache_enabled: bool,
    /// Lifetime of a cached response in milliseconds
    pub cache_lifetime_ms: u64,
    /// Maximum number of cached responses
    pub cache_max_size: usize,
    /// Maximum simultaneous requests to VIAF
    pub viaf_concurrency: usize,
    /// Maximum simultaneous requests to ORCID
    pub orcid_concurrency: usize,
    /// Maximum simultaneous requests to Solr
    pub solr_concurrency: usize,
    /// Upstream fetch timeout in milliseconds
    pub fetch_timeout_ms: u64,
    /// VIAF SRU search endpoint
    pub viaf_base_url: String,
    /// ORCID expanded-search endpoint
    pub orcid_base_url: String,
    /// Solr select handler
    pub solr_url: String,
    /// Service name reported by the Solr endpoint
    pub solr_name: String,
    /// Solr field holding the record identifier
    pub solr_id_field: String,
    /// Solr field holding the record label
    pub solr_name_field: String,
    /// View URL template for Solr records, with an `{{id}}` placeholder
    pub solr_view_url: String,
    /// Result limit applied when a query does not give one
    pub default_limit: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ENABLED` - Enable the response cache (default: true)
    /// - `CACHE_LIFETIME_MS` - Cache entry lifetime in ms (default: 3600000)
    /// - `CACHE_MAX_SIZE` - Maximum cached responses (default: 20000)
    /// - `VIAF_CONCURRENCY` - VIAF request ceiling (default: 4)
    /// - `ORCID_CONCURRENCY` - ORCID request ceiling (default: 8)
    /// - `FETCH_TIMEOUT_MS` - Upstream timeout in ms (default: 20000)
    /// - `SOLR_CONCURRENCY` - Solr request ceiling (default: 4)
    /// - `VIAF_BASE_URL` / `ORCID_BASE_URL` / `SOLR_URL` - Upstream endpoints
    /// - `SOLR_NAME`, `SOLR_ID_FIELD`, `SOLR_NAME_FIELD`, `SOLR_VIEW_URL` - Solr
    ///   service name, id and label fields, and record view template
    /// - `DEFAULT_LIMIT` - Result limit when none is given (default: 3)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_enabled: env_or("CACHE_ENABLED", defaults.cache_enabled),
            cache_lifetime_ms: env_or("CACHE_LIFETIME_MS", defaults.cache_lifetime_ms),
            cache_max_size: env_or("CACHE_MAX_SIZE", defaults.cache_max_size),
            viaf_concurrency: env_or("VIAF_CONCURRENCY", defaults.viaf_concurrency).max(1),
            orcid_concurrency: env_or("ORCID_CONCURRENCY", defaults.orcid_concurrency).max(1),
            solr_concurrency: env_or("SOLR_CONCURRENCY", defaults.solr_concurrency).max(1),
            fetch_timeout_ms: env_or("FETCH_TIMEOUT_MS", defaults.fetch_timeout_ms),
            viaf_base_url: env::var("VIAF_BASE_URL").unwrap_or(defaults.viaf_base_url),
            orcid_base_url: env::var("ORCID_BASE_URL").unwrap_or(defaults.orcid_base_url),
            solr_url: env::var("SOLR_URL").unwrap_or(defaults.solr_url),
            solr_name: env::var("SOLR_NAME").unwrap_or(defaults.solr_name),
            solr_id_field: env::var("SOLR_ID_FIELD").unwrap_or(defaults.solr_id_field),
            solr_name_field: env::var("SOLR_NAME_FIELD").unwrap_or(defaults.solr_name_field),
            solr_view_url: env::var("SOLR_VIEW_URL").unwrap_or(defaults.solr_view_url),
            default_limit: env_or("DEFAULT_LIMIT", defaults.default_limit).max(1),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    /// Upstream fetch timeout as a Duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_lifetime_ms: DEFAULT_LIFETIME_MS,
            cache_max_size: DEFAULT_MAX_SIZE,
            viaf_concurrency: 4,
            orcid_concurrency: 8,
            solr_concurrency: 4,
            fetch_timeout_ms: 20_000,
            viaf_base_url: DEFAULT_VIAF_BASE_URL.to_string(),
            orcid_base_url: DEFAULT_ORCID_BASE_URL.to_string(),
            solr_url: DEFAULT_SOLR_URL.to_string(),
            solr_name: "Solr".to_string(),
            solr_id_field: "id".to_string(),
            solr_name_field: "name".to_string(),
            solr_view_url: "http://localhost:8983/solr/get?id={{id}}".to_string(),
            default_limit: 3,
            server_port: 8080,
            cleanup_interval: 60,
        }
    }
}

/// Reads and parses an environment variable, falling back on absence or parse failure.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.cache_enabled);
        assert_eq!(config.cache_lifetime_ms, 3_600_000);
        assert_eq!(config.cache_max_size, 20_000);
        assert_eq!(config.viaf_concurrency, 4);
        assert_eq!(config.solr_concurrency, 4);
        assert_eq!(config.solr_name_field, "name");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_ENABLED");
        env::remove_var("CACHE_LIFETIME_MS");
        env::remove_var("CACHE_MAX_SIZE");
        env::remove_var("VIAF_CONCURRENCY");

        let config = Config::from_env();
        assert!(config.cache_enabled);
        assert_eq!(config.cache_lifetime_ms, 3_600_000);
        assert_eq!(config.cache_max_size, 20_000);
        assert_eq!(config.viaf_concurrency, 4);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        env::set_var("AUTHORITY_RECONCILE_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("AUTHORITY_RECONCILE_TEST_GARBAGE", 7usize), 7);
        env::remove_var("AUTHORITY_RECONCILE_TEST_GARBAGE");
    }
}

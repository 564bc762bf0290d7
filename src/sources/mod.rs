//! Sources Module
//!
//! Backend sources a query can be reconciled against. Each source knows how
//! to build its upstream URL, parse the upstream response and describe
//! itself to reconciliation clients.

pub mod dialect;
pub mod orcid;
mod resolver;
pub mod solr;
pub mod viaf;

use crate::error::Result;
use crate::models::{Record, SearchQuery, ServiceMetadata};

pub use dialect::NameTypeEntry;
pub use orcid::{parse_name, OrcidSource};
pub use resolver::SourceResolver;
pub use solr::SolrSource;
pub use viaf::{ProxiedSource, ViafSearch, ViafSource};

/// Upstream service a source talks to. Worker pools are sized per backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Viaf,
    Orcid,
    Solr,
}

// == Source Trait ==
/// Capability interface shared by all backend variants.
pub trait Source: Send + Sync {
    /// Stable identity of the endpoint, used in cache keys (e.g. `viafproxy/LC`).
    fn endpoint_id(&self) -> String;

    fn backend(&self) -> Backend;

    /// Backend query clause for `query`.
    fn build_query(&self, query: &SearchQuery) -> String;

    /// Full upstream URL for `query`.
    fn resolve_endpoint(&self, query: &SearchQuery) -> String;

    /// Metadata returned to clients that call the endpoint without queries.
    fn describe_metadata(&self, source_from_path: Option<&str>) -> ServiceMetadata;

    /// Parses one upstream response body into records.
    fn parse(&self, query: &SearchQuery, body: &[u8]) -> Result<Vec<Record>>;
}

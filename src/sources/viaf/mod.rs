//! VIAF sources
//!
//! The canonical VIAF source returns VIAF cluster ids; proxied sources
//! (see [`proxy`]) return the ids of one VIAF contributor instead. Both talk
//! to the same SRU endpoint through a shared [`ViafSearch`].
//!
//! VIAF tolerates only a handful of simultaneous requests, so its worker pool
//! defaults to 4.

mod parser;
mod proxy;

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::models::{Record, SearchQuery, ServiceMetadata, ViewTemplate};
use crate::parser::StreamingRecordParser;
use crate::sources::{dialect, Backend, Source};

pub use parser::{viaf_parser, ViafScratch};
pub use proxy::{contributor, Contributor, ProxiedSource, CONTRIBUTORS};

// == VIAF Search ==
/// SRU endpoint and parser shared by every VIAF source.
pub struct ViafSearch {
    base_url: String,
    parser: StreamingRecordParser<ViafScratch>,
}

impl ViafSearch {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            parser: viaf_parser(),
        }
    }

    /// SRU search URL: percent-encoded CQL, holdings-count ordering, record limit.
    pub fn search_url(&self, cql: &str, limit: usize) -> String {
        format!(
            "{}?query={}&sortKeys=holdingscount&maximumRecords={}&httpAccept=application/xml",
            self.base_url,
            urlencoding::encode(cql),
            limit
        )
    }

    pub fn parse(
        &self,
        query: &SearchQuery,
        body: &[u8],
        preferred_source: Option<&str>,
        proxy: bool,
    ) -> Result<Vec<Record>> {
        let scratch = ViafScratch::new(&query.normalized_query(), preferred_source, proxy);
        let records = self.parser.parse_with(body, scratch)?;
        debug!(
            "VIAF query {:?} parsed {} records",
            query.query(),
            records.len()
        );
        Ok(records)
    }
}

// == Canonical VIAF Source ==
/// Default backend: VIAF cluster ids, optionally restricted to one contributor.
pub struct ViafSource {
    search: Arc<ViafSearch>,
}

impl ViafSource {
    pub fn new(search: Arc<ViafSearch>) -> Self {
        Self { search }
    }
}

impl Source for ViafSource {
    fn endpoint_id(&self) -> String {
        "viaf".to_string()
    }

    fn backend(&self) -> Backend {
        Backend::Viaf
    }

    fn build_query(&self, query: &SearchQuery) -> String {
        dialect::build_cql(query)
    }

    fn resolve_endpoint(&self, query: &SearchQuery) -> String {
        self.search.search_url(&self.build_query(query), query.limit())
    }

    fn describe_metadata(&self, source_from_path: Option<&str>) -> ServiceMetadata {
        let name = match source_from_path {
            Some(code) => {
                let display = contributor(code).map(|c| c.name).unwrap_or(code);
                format!("VIAF - {}", display)
            }
            None => "VIAF".to_string(),
        };

        ServiceMetadata {
            name,
            identifier_space: "http://viaf.org/viaf".to_string(),
            schema_space: "http://viaf.org/viaf/terms".to_string(),
            view: ViewTemplate {
                url: "https://viaf.org/viaf/{{id}}".to_string(),
            },
            default_types: dialect::default_types(),
        }
    }

    fn parse(&self, query: &SearchQuery, body: &[u8]) -> Result<Vec<Record>> {
        self.search.parse(query, body, query.source_from_path(), false)
    }
}

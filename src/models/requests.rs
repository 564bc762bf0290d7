//! Request DTOs for the reconciliation API
//!
//! Defines the structure of incoming reconciliation parameters.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{ReconcileError, Result};
use crate::models::{ExtraParams, SearchQuery};

/// Query-string / form parameters of a reconciliation request.
///
/// Neither parameter present means the client wants service metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconcileParams {
    /// A single query, either plain text or a JSON query object
    #[serde(default)]
    pub query: Option<String>,
    /// A JSON batch of queries keyed by client-chosen ids
    #[serde(default)]
    pub queries: Option<String>,
}

/// One query object of the reconciliation protocol.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileQuery {
    pub query: String,
    /// Name-type identifier
    #[serde(default, rename = "type")]
    pub name_type: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Batch of queries keyed by id ("q0", "q1", ...).
pub type QueryBatch = BTreeMap<String, ReconcileQuery>;

impl ReconcileParams {
    /// Returns the queries in this request, or None for a metadata request.
    pub fn to_batch(&self) -> Result<Option<QueryBatch>> {
        if let Some(queries) = &self.queries {
            let batch: QueryBatch = serde_json::from_str(queries)
                .map_err(|e| ReconcileError::InvalidRequest(format!("Bad queries JSON: {}", e)))?;
            return Ok(Some(batch));
        }

        if let Some(query) = &self.query {
            let single = if query.trim_start().starts_with('{') {
                serde_json::from_str(query).map_err(|e| {
                    ReconcileError::InvalidRequest(format!("Bad query JSON: {}", e))
                })?
            } else {
                ReconcileQuery {
                    query: query.clone(),
                    name_type: None,
                    limit: None,
                }
            };
            let mut batch = QueryBatch::new();
            batch.insert("q0".to_string(), single);
            return Ok(Some(batch));
        }

        Ok(None)
    }
}

impl ReconcileQuery {
    /// Converts to a validated SearchQuery carrying the request-path parameters.
    pub fn to_search_query(&self, default_limit: usize, extra: &ExtraParams) -> Result<SearchQuery> {
        let mut query = SearchQuery::new(self.query.clone(), self.limit.unwrap_or(default_limit))?
            .with_extra_params(extra.clone());
        if let Some(name_type) = self.name_type.as_deref().filter(|t| !t.is_empty()) {
            query = query.with_name_type(name_type);
        }
        Ok(query)
    }
}

//! Search query model
//!
//! A `SearchQuery` is built once per inbound query and stays immutable for
//! the rest of its processing.

use std::collections::BTreeMap;

use crate::error::{ReconcileError, Result};

/// Extra parameter naming the data source segment of the request path
pub const EXTRA_PARAM_DATA_SOURCE: &str = "dataSource";

/// Extra parameter carrying the source code that follows the data source in the path
pub const EXTRA_PARAM_SOURCE_FROM_PATH: &str = "sourceFromPath";

/// Extra parameter flagging proxy mode ("true" / "false")
pub const EXTRA_PARAM_PROXY_MODE: &str = "proxyMode";

/// Request-context parameters. Ordered so that cache keys built from them are stable.
pub type ExtraParams = BTreeMap<String, String>;

// == Search Query ==
/// A single reconciliation query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    query: String,
    name_type: Option<String>,
    limit: usize,
    extra_params: ExtraParams,
}

impl SearchQuery {
    // == Constructor ==
    /// Creates a query, rejecting blank text and a zero limit.
    pub fn new(query: impl Into<String>, limit: usize) -> Result<Self> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(ReconcileError::InvalidRequest(
                "Query text cannot be empty".to_string(),
            ));
        }
        if limit == 0 {
            return Err(ReconcileError::InvalidRequest(
                "Limit must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            query,
            name_type: None,
            limit,
            extra_params: ExtraParams::new(),
        })
    }

    /// Sets the name-type identifier (e.g. `/people/person`).
    pub fn with_name_type(mut self, name_type: impl Into<String>) -> Self {
        self.name_type = Some(name_type.into());
        self
    }

    /// Adds one extra parameter, replacing any previous value for the key.
    pub fn with_extra_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.insert(key.into(), value.into());
        self
    }

    /// Merges a set of extra parameters.
    pub fn with_extra_params(mut self, params: ExtraParams) -> Self {
        self.extra_params.extend(params);
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Query text trimmed, with runs of whitespace collapsed to one space.
    pub fn normalized_query(&self) -> String {
        self.query.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn name_type(&self) -> Option<&str> {
        self.name_type.as_deref()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn extra_params(&self) -> &ExtraParams {
        &self.extra_params
    }

    pub fn extra_param(&self, key: &str) -> Option<&str> {
        self.extra_params.get(key).map(String::as_str)
    }

    /// Source code extracted from the request path, if any.
    pub fn source_from_path(&self) -> Option<&str> {
        self.extra_param(EXTRA_PARAM_SOURCE_FROM_PATH)
            .filter(|s| !s.is_empty())
    }

    pub fn is_proxy_mode(&self) -> bool {
        is_flag_set(&self.extra_params, EXTRA_PARAM_PROXY_MODE)
    }
}

/// True when the parameter holds "true" (case-insensitive).
pub(crate) fn is_flag_set(params: &ExtraParams, key: &str) -> bool {
    params
        .get(key)
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

// == Path Parsing ==
/// Derives extra parameters from a reconciliation request path.
///
/// `/reconcile/<dataSource>[/<source>]`; the `viafproxy` data source turns
/// proxy mode on.
pub fn extra_params_from_path(path: &str) -> Result<ExtraParams> {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    let data_source = parts.get(1).ok_or_else(|| {
        ReconcileError::InvalidRequest(format!("No data source in path: {}", path))
    })?;

    let mut params = ExtraParams::new();
    params.insert(EXTRA_PARAM_DATA_SOURCE.to_string(), data_source.to_string());
    if let Some(source) = parts.get(2) {
        params.insert(EXTRA_PARAM_SOURCE_FROM_PATH.to_string(), source.to_string());
    }
    params.insert(
        EXTRA_PARAM_PROXY_MODE.to_string(),
        (*data_source == "viafproxy").to_string(),
    );
    Ok(params)
}

//! Source resolution
//!
//! Maps request-context parameters to the backend source that serves them.
//! Proxied VIAF sources are created on first use and reused afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::config::Config;
use crate::error::{ReconcileError, Result};
use crate::models::{
    ExtraParams, ServiceMetadata, EXTRA_PARAM_DATA_SOURCE, EXTRA_PARAM_PROXY_MODE,
    EXTRA_PARAM_SOURCE_FROM_PATH,
};
use crate::models::query::is_flag_set;
use crate::sources::{OrcidSource, ProxiedSource, SolrSource, Source, ViafSearch, ViafSource};

const SMART_NAMES: &str = "smartnames";

// == Source Resolver ==
pub struct SourceResolver {
    viaf: Arc<ViafSource>,
    viaf_search: Arc<ViafSearch>,
    /// Proxied sources keyed by upper-cased contributor code
    proxied: Mutex<HashMap<String, Arc<ProxiedSource>>>,
    orcid: Arc<OrcidSource>,
    orcid_smart: Arc<OrcidSource>,
    solr: Arc<SolrSource>,
}

impl SourceResolver {
    pub fn new(config: &Config) -> Self {
        let viaf_search = Arc::new(ViafSearch::new(config.viaf_base_url.clone()));
        Self {
            viaf: Arc::new(ViafSource::new(Arc::clone(&viaf_search))),
            viaf_search,
            proxied: Mutex::new(HashMap::new()),
            orcid: Arc::new(OrcidSource::new(config.orcid_base_url.clone(), false)),
            orcid_smart: Arc::new(OrcidSource::new(config.orcid_base_url.clone(), true)),
            solr: Arc::new(SolrSource::from_config(config)),
        }
    }

    /// Picks the source for a request.
    ///
    /// # Arguments
    /// * `params` - Extra parameters derived from the request path
    ///
    /// # Returns
    /// * `Err(InvalidRequest)` - Proxy mode without a contributor code
    /// * `Err(Lookup)` - Unknown data source or contributor
    pub fn resolve(&self, params: &ExtraParams) -> Result<Arc<dyn Source>> {
        let data_source = params
            .get(EXTRA_PARAM_DATA_SOURCE)
            .map(String::as_str)
            .unwrap_or("");
        let source_from_path = params
            .get(EXTRA_PARAM_SOURCE_FROM_PATH)
            .map(String::as_str)
            .filter(|s| !s.is_empty());

        match data_source {
            "viaf" | "viafproxy" => {
                if is_flag_set(params, EXTRA_PARAM_PROXY_MODE) {
                    let code = source_from_path.ok_or_else(|| {
                        ReconcileError::InvalidRequest(
                            "Proxy mode requires a source code".to_string(),
                        )
                    })?;
                    let source: Arc<dyn Source> = self.proxied(code)?;
                    Ok(source)
                } else {
                    Ok(self.viaf.clone())
                }
            }
            "orcid" => {
                let smart = source_from_path
                    .map(|s| s.eq_ignore_ascii_case(SMART_NAMES))
                    .unwrap_or(false);
                if smart {
                    Ok(self.orcid_smart.clone())
                } else {
                    Ok(self.orcid.clone())
                }
            }
            "solr" => Ok(self.solr.clone()),
            other => Err(ReconcileError::Lookup(format!("Data source {}", other))),
        }
    }

    /// Proxied source for `code`, created on first request.
    pub fn proxied(&self, code: &str) -> Result<Arc<ProxiedSource>> {
        let code = code.to_uppercase();
        let mut proxied = self.proxied.lock();
        if let Some(source) = proxied.get(&code) {
            return Ok(Arc::clone(source));
        }

        let source = Arc::new(ProxiedSource::new(&code, Arc::clone(&self.viaf_search))?);
        info!("Created proxied VIAF source for {}", code);
        proxied.insert(code, Arc::clone(&source));
        Ok(source)
    }

    /// Number of proxied sources created so far.
    pub fn proxied_count(&self) -> usize {
        self.proxied.lock().len()
    }

    pub fn describe_metadata(&self, params: &ExtraParams) -> Result<ServiceMetadata> {
        let source = self.resolve(params)?;
        let source_from_path = params
            .get(EXTRA_PARAM_SOURCE_FROM_PATH)
            .map(String::as_str)
            .filter(|s| !s.is_empty());
        Ok(source.describe_metadata(source_from_path))
    }
}

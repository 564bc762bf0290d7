//! Request, record and response models for the reconciliation service
//!
//! `SearchQuery` and `Record` are the domain values flowing through the
//! fetch pipeline; `requests`/`responses` are the DTOs used for
//! serializing/deserializing HTTP request and response bodies.

pub mod query;
pub mod record;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use query::{
    extra_params_from_path, ExtraParams, SearchQuery, EXTRA_PARAM_DATA_SOURCE,
    EXTRA_PARAM_PROXY_MODE, EXTRA_PARAM_SOURCE_FROM_PATH,
};
pub use record::{similarity, Record, TypeLabel};
pub use requests::{QueryBatch, ReconcileParams, ReconcileQuery};
pub use responses::{
    ErrorResponse, HealthResponse, QueryResult, ServiceMetadata, StatsResponse, ViewTemplate,
};

//! Authority Reconcile - name reconciliation against VIAF, ORCID and Solr
//!
//! Matches free-text names against authority files and returns ranked
//! candidate records, with response caching and request coalescing.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod parser;
pub mod sources;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{ReconcileError, Result};
pub use fetch::{FetchCoordinator, HttpConnectionFactory, SimulatedConnectionFactory};
pub use tasks::spawn_cleanup_task;

//! API Module
//!
//! HTTP handlers and routing for the reconciliation service.
//!
//! # Endpoints
//! - `GET|POST /reconcile/viaf[/<source>]` - Reconcile against VIAF
//! - `GET|POST /reconcile/viafproxy/<source>` - VIAF, reported in a contributor's ids
//! - `GET|POST /reconcile/orcid[/smartnames]` - Reconcile against ORCID
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

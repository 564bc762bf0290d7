//! Error types for the reconciliation service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Reconcile Error Enum ==
/// Unified error type for the reconciliation service.
///
/// Every variant carries a plain message so the error can be cloned and
/// handed to every caller waiting on the same upstream fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Upstream unreachable, timed out, or failed at the transport level
    #[error("Connection error: {0}")]
    Connection(String),

    /// Malformed or unexpected response body
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unknown name-type identifier, backend code or source code
    #[error("Not found: {0}")]
    Lookup(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<quick_xml::Error> for ReconcileError {
    fn from(err: quick_xml::Error) -> Self {
        ReconcileError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for ReconcileError {
    fn from(err: reqwest::Error) -> Self {
        ReconcileError::Connection(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ReconcileError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReconcileError::Connection(_) | ReconcileError::Parse(_) => StatusCode::BAD_GATEWAY,
            ReconcileError::Lookup(_) => StatusCode::NOT_FOUND,
            ReconcileError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ReconcileError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the reconciliation service.
pub type Result<T> = std::result::Result<T, ReconcileError>;

//! API Handlers
//!
//! HTTP request handlers for the reconciliation endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    http::Uri,
    response::{IntoResponse, Response},
    Json,
};
use tokio::task::JoinSet;
use tracing::{error, warn};

use crate::config::Config;
use crate::error::Result;
use crate::fetch::{ConnectionFactory, FetchCoordinator};
use crate::models::{
    extra_params_from_path, ExtraParams, HealthResponse, QueryBatch, QueryResult,
    ReconcileParams, StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<FetchCoordinator>,
    /// Result limit for queries that do not set one
    pub default_limit: usize,
}

impl AppState {
    pub fn new(coordinator: FetchCoordinator, default_limit: usize) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            default_limit: default_limit.max(1),
        }
    }

    /// Creates the state from configuration, fetching through `connections`.
    pub fn from_config(config: &Config, connections: Arc<dyn ConnectionFactory>) -> Self {
        Self::new(
            FetchCoordinator::new(config, connections),
            config.default_limit,
        )
    }
}

/// Handler for GET /reconcile/...
pub async fn reconcile_get_handler(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ReconcileParams>,
) -> Result<Response> {
    reconcile(&state, uri.path(), &params).await
}

/// Handler for POST /reconcile/... with a form-encoded body
pub async fn reconcile_post_handler(
    State(state): State<AppState>,
    uri: Uri,
    Form(params): Form<ReconcileParams>,
) -> Result<Response> {
    reconcile(&state, uri.path(), &params).await
}

/// Answers with service metadata when no queries are given, otherwise with
/// one result list per query id.
async fn reconcile(state: &AppState, path: &str, params: &ReconcileParams) -> Result<Response> {
    let extra = extra_params_from_path(path)?;

    match params.to_batch()? {
        None => {
            let metadata = state.coordinator.describe_metadata(&extra)?;
            Ok(Json(metadata).into_response())
        }
        Some(batch) => {
            // An unknown endpoint fails the whole request, not each query
            state.coordinator.resolver().resolve(&extra)?;
            let results = run_batch(state, batch, &extra).await;
            Ok(Json(results).into_response())
        }
    }
}

/// Runs every query of a batch concurrently. A failing query yields an
/// empty result with an error message and does not affect the others.
async fn run_batch(
    state: &AppState,
    batch: QueryBatch,
    extra: &ExtraParams,
) -> BTreeMap<String, QueryResult> {
    let mut results = BTreeMap::new();
    let mut tasks = JoinSet::new();

    for (id, query) in batch {
        match query.to_search_query(state.default_limit, extra) {
            Ok(search) => {
                let coordinator = Arc::clone(&state.coordinator);
                tasks.spawn(async move {
                    let outcome = coordinator.search(&search).await;
                    (id, outcome)
                });
            }
            Err(err) => {
                results.insert(id, QueryResult::failed(err.to_string()));
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, Ok(records))) => {
                results.insert(id, QueryResult::ok(records.as_ref().clone()));
            }
            Ok((id, Err(err))) => {
                warn!("Query {} failed: {}", id, err);
                results.insert(id, QueryResult::failed(err.to_string()));
            }
            Err(err) => error!("Query task aborted: {}", err),
        }
    }

    results
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.coordinator.cache().read().await;
    Json(StatsResponse::from(cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;
    use crate::fetch::SimulatedConnectionFactory;
    use axum::http::StatusCode;

    const ORCID_BODY: &str = r#"<expanded-search:expanded-search xmlns:expanded-search="http://www.orcid.org/ns/expanded-search">
  <expanded-search:expanded-result>
    <expanded-search:orcid-id>0000-0001-5839-7854</expanded-search:orcid-id>
    <expanded-search:given-names>Igor</expanded-search:given-names>
    <expanded-search:family-names>OZEROV</expanded-search:family-names>
  </expanded-search:expanded-result>
</expanded-search:expanded-search>"#;

    fn state() -> AppState {
        let factory = SimulatedConnectionFactory::new().with_body("Ozerov", ORCID_BODY);
        AppState::from_config(&Config::default(), Arc::new(factory))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_metadata_without_queries() {
        let response = reconcile_get_handler(
            State(state()),
            Uri::from_static("/reconcile/orcid/smartnames"),
            Query(ReconcileParams::default()),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["name"], "ORCID - Smart Names Mode");
    }

    #[tokio::test]
    async fn test_batch_with_failing_query() {
        let params = ReconcileParams {
            query: None,
            queries: Some(
                r#"{"q0":{"query":"Igor Ozerov"},"q1":{"query":"Nobody Known"}}"#.to_string(),
            ),
        };
        let response = reconcile_post_handler(
            State(state()),
            Uri::from_static("/reconcile/orcid"),
            Form(params),
        )
        .await
        .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["q0"]["result"][0]["id"], "0000-0001-5839-7854");
        assert!(json["q0"].get("error").is_none());
        assert_eq!(json["q1"]["result"].as_array().unwrap().len(), 0);
        assert!(json["q1"]["error"].as_str().unwrap().starts_with("Connection error"));
    }

    #[tokio::test]
    async fn test_unknown_data_source() {
        let params = ReconcileParams {
            query: Some("Igor Ozerov".to_string()),
            queries: None,
        };
        let result =
            reconcile_get_handler(State(state()), Uri::from_static("/reconcile/nowhere"), Query(params))
                .await;
        assert!(matches!(result, Err(ReconcileError::Lookup(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let response = stats_handler(State(state())).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}

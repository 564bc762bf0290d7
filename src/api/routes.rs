//! API Routes
//!
//! Configures the Axum router with the reconciliation endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, reconcile_get_handler, reconcile_post_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET|POST /reconcile/:data_source` - `viaf`, `orcid`
/// - `GET|POST /reconcile/:data_source/:source` - `viaf/<code>`,
///   `viafproxy/<code>`, `orcid/smartnames`
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: reconciliation clients run in the browser, so any origin is allowed
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let reconcile = get(reconcile_get_handler).post(reconcile_post_handler);

    Router::new()
        .route("/reconcile/:data_source", reconcile.clone())
        .route("/reconcile/:data_source/:source", reconcile)
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fetch::SimulatedConnectionFactory;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let factory = SimulatedConnectionFactory::new().with_failure("viaf", "unreachable");
        let state = AppState::from_config(&Config::default(), Arc::new(factory));
        create_router(state)
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        create_test_app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let request = Request::builder().uri("/stats").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metadata_endpoints() {
        for uri in [
            "/reconcile/viaf",
            "/reconcile/viaf/LC",
            "/reconcile/viafproxy/DNB",
            "/reconcile/orcid",
            "/reconcile/orcid/smartnames",
        ] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            assert_eq!(status_of(request).await, StatusCode::OK, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_post_form_queries() {
        let request = Request::builder()
            .method("POST")
            .uri("/reconcile/viaf")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("queries=%7B%22q0%22%3A%7B%22query%22%3A%22Jane%20Austen%22%7D%7D"))
            .unwrap();

        // Upstream failure is reported per query, not as a request failure
        assert_eq!(status_of(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_proxy_source_not_found() {
        let request = Request::builder()
            .uri("/reconcile/viafproxy/NOPE")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_queries_bad_request() {
        let request = Request::builder()
            .uri("/reconcile/viaf?queries=%7Bnope")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::BAD_REQUEST);
    }
}

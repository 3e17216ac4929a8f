//! Dashboard — Axum web server for read-only monitoring.
//!
//! Serves the market catalog, parlay candidates, and CLV board as a
//! REST API. CORS enabled for local development.

pub mod routes;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

pub use routes::{AppState, DashboardState};

/// Start the dashboard web server.
///
/// This spawns a background task — it doesn't block.
pub fn spawn_dashboard(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);

    tokio::spawn(async move {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        info!(port, "Dashboard server starting on http://localhost:{port}");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind dashboard port");

        axum::serve(listener, app)
            .await
            .expect("Dashboard server error");
    });

    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/markets", get(routes::get_markets))
        .route("/api/parlays", get(routes::get_parlays))
        .route("/api/clv", get(routes::get_clv))
        .route("/api/report", get(routes::get_report))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        Arc::new(DashboardState::new())
    }

    async fn get_ok(app: Router, uri: &str) -> axum::response::Response {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        resp
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        get_ok(build_router(test_state()), "/health").await;
    }

    #[tokio::test]
    async fn test_markets_endpoint_empty() {
        let resp = get_ok(build_router(test_state()), "/api/markets").await;
        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let json: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert!(json.is_empty());
    }

    #[tokio::test]
    async fn test_markets_endpoint_with_filter() {
        get_ok(build_router(test_state()), "/api/markets?match_id=m1").await;
    }

    #[tokio::test]
    async fn test_parlays_endpoint() {
        get_ok(build_router(test_state()), "/api/parlays").await;
    }

    #[tokio::test]
    async fn test_clv_endpoint_with_window_param() {
        get_ok(build_router(test_state()), "/api/clv?window=t-24h").await;
    }

    #[tokio::test]
    async fn test_report_endpoint() {
        let resp = get_ok(build_router(test_state()), "/api/report").await;
        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "WARMING_UP");
        assert_eq!(json["cycle_count"], 0);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/api/trades").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

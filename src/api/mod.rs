//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use routes::{create_router, AppState};

/// Build the full application router: health check plus `/api/v1`
pub fn build_router(state: AppState) -> Router {
    let api_routes = create_router().layer(axum::middleware::from_fn(
        middleware::logging_middleware,
    ));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

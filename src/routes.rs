//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /r/{code}`             - Short link redirect
//! - `GET  /health`               - Health check: database and cache
//! - `POST /api/shorten`          - Create a short link (rate limited)
//! - `GET  /api/r/{code}/clicks`  - Click count of one link
//! - `GET  /api/all-links`        - Every link with its click count
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-client fixed window on link creation only
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::tracing;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// Rate-limit keys honour [`AppState::behind_proxy`]; enable it only when
/// the service runs behind a trusted reverse proxy.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// All routes with tracing, before path normalization.
pub fn router(state: AppState) -> Router {
    let api_router = Router::new()
        .merge(api::routes::creation_routes(state.clone()))
        .merge(api::routes::analytics_routes());

    Router::new()
        .route("/r/{code}", get(redirect_handler))
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .with_state(state)
        .layer(tracing::layer())
}

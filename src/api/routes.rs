//! API route configuration.

use crate::api::handlers::{all_links_handler, clicks_handler, shorten_handler};
use crate::api::middleware::rate_limit;
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Link creation routes, guarded by the per-client rate limiter.
///
/// # Endpoints
///
/// - `POST /shorten` - Create a short link
pub fn creation_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_handler))
        .route_layer(middleware::from_fn_with_state(state, rate_limit::layer))
}

/// Read-only analytics routes.
///
/// # Endpoints
///
/// - `GET /r/{code}/clicks` - Click count of one link
/// - `GET /all-links`       - Every link with its click count
pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/r/{code}/clicks", get(clicks_handler))
        .route("/all-links", get(all_links_handler))
}

//! Handlers for click analytics endpoints.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::dto::clicks::LinkSummary;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the click count of one link.
///
/// # Endpoint
///
/// `GET /api/r/{code}/clicks`
///
/// Reading analytics does not count as a click. Expired links that have not
/// been swept yet are still reported.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn clicks_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkSummary>, AppError> {
    let link = state.link_service.get_clicks(&code).await?;

    Ok(Json(link.into()))
}

/// Lists every stored link with its click count, newest first.
///
/// # Endpoint
///
/// `GET /api/all-links`
pub async fn all_links_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<LinkSummary>>, AppError> {
    let links = state.link_service.list_links().await?;

    Ok(Json(links.into_iter().map(LinkSummary::from).collect()))
}

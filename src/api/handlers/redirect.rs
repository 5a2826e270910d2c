//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its target URL and counts the click.
///
/// # Endpoint
///
/// `GET /r/{code}`
///
/// Cache lookup, expiry enforcement and click counting all happen in
/// [`crate::application::services::LinkService::resolve`].
///
/// # Errors
///
/// - 404 Not Found if the short code doesn't exist
/// - 410 Gone if the link has expired
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let long_url = state.link_service.resolve(&code).await?;

    Ok(Redirect::temporary(&long_url))
}

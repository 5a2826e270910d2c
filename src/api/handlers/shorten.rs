//! Handler for link shortening endpoint.

use axum::{Json, extract::State};
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for a long URL.
///
/// # Endpoint
///
/// `POST /api/shorten` (rate limited per client)
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com",
///   "custom_code": "my-link",     // optional
///   "expiration_hours": 24        // optional, 0 = never
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "code": "my-link",
///   "short_url": "http://localhost:3000/r/my-link",
///   "long_url": "https://example.com",
///   "expires_at": "2026-01-02T00:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - 400 if validation fails
/// - 409 if the custom code is taken
/// - 429 if the client exceeded its creation quota
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create(payload.url, payload.custom_code, payload.expiration_hours)
        .await?;

    let short_url = state.link_service.short_url(&state.base_url, &link.code);

    Ok(Json(ShortenResponse {
        code: link.code,
        short_url,
        long_url: link.long_url,
        expires_at: link.expires_at,
    }))
}

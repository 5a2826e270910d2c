//! Per-client rate limiting middleware for link creation.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, state::AppState, utils::client_ip::client_key};

const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Consumes one unit of the client's quota before the request proceeds.
///
/// # Key Extraction
///
/// Clients are keyed by the socket peer address, or by `X-Forwarded-For` /
/// `X-Real-IP` when [`AppState::behind_proxy`] is set. Requests without any
/// address share a single bucket.
///
/// # Errors
///
/// Returns `429 Too Many Requests` with a `Retry-After` header once the
/// client's quota for the current window is spent.
///
/// # Example
///
/// ```rust,ignore
/// let creation = Router::new()
///     .route("/shorten", post(shorten_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(req.headers(), peer, st.behind_proxy);

    let decision = st.rate_limiter.check_and_consume(&key).await.inspect_err(|e| {
        if matches!(e, AppError::RateLimited { .. }) {
            tracing::warn!(client = %key, "Link creation rate limited");
        }
    })?;

    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    headers.insert(
        X_RATELIMIT_LIMIT,
        HeaderValue::from(st.rate_limiter.policy().max_requests),
    );
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));

    Ok(response)
}

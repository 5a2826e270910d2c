//! Rate limiter trait and shared policy types.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppError;

/// Limits applied per client key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Maximum requests allowed within one window.
    pub max_requests: u32,
    /// Length of each fixed window.
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window: Duration::from_secs(60),
        }
    }
}

/// Outcome of an accepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Requests still available in the current window.
    pub remaining: u32,
    /// Time until the current window closes.
    pub reset_after: Duration,
}

/// Per-client fixed-window request counter.
///
/// Counting and checking happen as one atomic step per client key, so
/// concurrent requests from the same client can never both take the last
/// slot of a window.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Counts one request for `client_key` and decides whether it may proceed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::RateLimited`] with a retry hint of roughly the
    /// remaining window when the client has used up its allowance.
    /// Backend failures surface as [`AppError::TransientCache`].
    async fn check_and_consume(&self, client_key: &str) -> Result<RateLimitDecision, AppError>;

    /// The policy this limiter enforces.
    fn policy(&self) -> RateLimitPolicy;
}

/// Converts the remaining window into a `Retry-After` value in whole seconds.
///
/// Rounds up and never returns less than one second.
pub fn retry_after_secs(remaining: Duration) -> u64 {
    let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    secs.max(1)
}

//! Redis-backed fixed-window rate limiter.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::RedisResult;
use redis::aio::ConnectionManager;
use serde_json::json;
use tracing::{debug, warn};

use super::service::{RateLimitDecision, RateLimitPolicy, RateLimiter, retry_after_secs};
use crate::error::AppError;
use crate::infrastructure::cache::{CacheResult, connect_manager};

/// Fixed-window limiter whose counters live in Redis.
///
/// Each check runs `SET key 0 PX <window> NX`, `INCR key` and `PTTL key`
/// inside one `MULTI/EXEC` transaction: the window TTL is set only when the
/// window opens, and the increment-and-fetch is atomic across every instance
/// sharing the Redis server. A counter disappears, and the window resets, when
/// its TTL lapses.
pub struct RedisRateLimiter {
    client: ConnectionManager,
    policy: RateLimitPolicy,
    key_prefix: String,
    timeout: Duration,
}

/// Bound on one check round trip.
pub const DEFAULT_LIMITER_TIMEOUT: Duration = Duration::from_secs(2);

impl RedisRateLimiter {
    /// Connects to Redis and verifies the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`crate::infrastructure::cache::CacheError::ConnectionError`] if
    /// the connection cannot be established.
    pub async fn connect(redis_url: &str, policy: RateLimitPolicy) -> CacheResult<Self> {
        let client = connect_manager(redis_url).await?;

        Ok(Self {
            client,
            policy,
            key_prefix: "ratelimit:".to_string(),
            timeout: DEFAULT_LIMITER_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn build_key(&self, client_key: &str) -> String {
        format!("{}{}", self.key_prefix, client_key)
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check_and_consume(&self, client_key: &str) -> Result<RateLimitDecision, AppError> {
        let key = self.build_key(client_key);
        let window_ms = u64::try_from(self.policy.window.as_millis()).unwrap_or(u64::MAX);
        let mut conn = self.client.clone();

        let pipeline = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&key)
            .arg(0)
            .arg("PX")
            .arg(window_ms)
            .arg("NX")
            .ignore()
            .incr(&key, 1)
            .pttl(&key)
            .to_owned();

        let (count, ttl_ms): (i64, i64) = bounded(
            self.timeout,
            client_key,
            pipeline.query_async(&mut conn),
        )
        .await?;

        // PTTL is negative only if the key vanished between commands.
        let reset_after = if ttl_ms > 0 {
            Duration::from_millis(ttl_ms as u64)
        } else {
            self.policy.window
        };

        let max_requests = i64::from(self.policy.max_requests);

        if count <= max_requests {
            Ok(RateLimitDecision {
                remaining: u32::try_from(max_requests - count).unwrap_or(0),
                reset_after,
            })
        } else {
            debug!(client = client_key, count, "Rate limit exceeded");
            Err(AppError::rate_limited(retry_after_secs(reset_after)))
        }
    }

    fn policy(&self) -> RateLimitPolicy {
        self.policy
    }
}

/// Awaits a Redis round trip for at most `timeout`; failures and timeouts
/// both surface as [`AppError::TransientCache`].
async fn bounded<T>(
    timeout: Duration,
    client_key: &str,
    call: impl Future<Output = RedisResult<T>>,
) -> Result<T, AppError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!("Redis rate limit error for {}: {}", client_key, e);
            Err(unavailable())
        }
        Err(_) => {
            warn!(client = client_key, ?timeout, "Redis rate limit check timed out");
            Err(unavailable())
        }
    }
}

fn unavailable() -> AppError {
    AppError::transient_cache("Rate limiter temporarily unavailable", json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis::RedisError;
    use std::io;

    #[tokio::test(start_paused = true)]
    async fn test_stalled_round_trip_times_out() {
        let started = tokio::time::Instant::now();

        let result = bounded(
            Duration::from_millis(500),
            "203.0.113.9",
            std::future::pending::<RedisResult<(i64, i64)>>(),
        )
        .await;

        assert!(matches!(result, Err(AppError::TransientCache { .. })));
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_redis_error_is_transient() {
        let failure = async {
            Err::<(i64, i64), _>(RedisError::from(io::Error::from(io::ErrorKind::ConnectionReset)))
        };

        let result = bounded(DEFAULT_LIMITER_TIMEOUT, "203.0.113.9", failure).await;

        assert!(result.unwrap_err().is_transient());
    }

    #[tokio::test]
    async fn test_answer_within_bound_passes_through() {
        let answer = async { Ok::<_, RedisError>((3_i64, 41_000_i64)) };

        let result = bounded(DEFAULT_LIMITER_TIMEOUT, "203.0.113.9", answer).await;

        assert_eq!(result.unwrap(), (3, 41_000));
    }
}

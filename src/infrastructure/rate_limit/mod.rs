//! Fixed-window rate limiting for link creation.
//!
//! Provides a [`RateLimiter`] trait with two implementations:
//! - [`RedisRateLimiter`] - Counters shared by every instance
//! - [`InMemoryRateLimiter`] - Per-process counters
//!
//! Both count requests per client in fixed windows of `W` seconds and allow at
//! most `T` per window. Because windows are fixed rather than sliding, a client
//! can get up to `2T` requests through around a window boundary; this is an
//! accepted limitation.

mod memory;
mod redis_limiter;
mod service;

pub use memory::InMemoryRateLimiter;
pub use redis_limiter::RedisRateLimiter;
pub use service::{RateLimitDecision, RateLimitPolicy, RateLimiter, retry_after_secs};

//! In-process fixed-window rate limiter.

use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use super::service::{RateLimitDecision, RateLimitPolicy, RateLimiter, retry_after_secs};
use crate::error::AppError;

/// Counters above this many tracked clients trigger a purge of stale windows.
const DEFAULT_MAX_TRACKED_CLIENTS: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    count: u32,
    window_start: Instant,
}

/// Fixed-window limiter keeping one counter per client in a sharded map.
///
/// The entry for a client stays locked while its counter is checked and
/// bumped, which makes check-and-increment atomic per key without a global
/// lock. Counters whose window has lapsed behave as absent and are dropped
/// once the map grows past `max_tracked_clients`. The purge scans the whole
/// map, so it runs at most once per window however many clients are live.
pub struct InMemoryRateLimiter {
    policy: RateLimitPolicy,
    counters: DashMap<String, WindowCounter>,
    max_tracked_clients: usize,
    next_purge: Mutex<Instant>,
}

impl InMemoryRateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            counters: DashMap::new(),
            max_tracked_clients: DEFAULT_MAX_TRACKED_CLIENTS,
            next_purge: Mutex::new(Instant::now()),
        }
    }

    /// Sets the map size above which stale counters are purged.
    pub fn with_max_tracked_clients(mut self, max_tracked_clients: usize) -> Self {
        self.max_tracked_clients = max_tracked_clients.max(1);
        self
    }

    /// Number of client counters currently held.
    pub fn tracked_clients(&self) -> usize {
        self.counters.len()
    }

    /// Drops counters whose window has lapsed.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        let window = self.policy.window;
        self.counters
            .retain(|_, counter| now.duration_since(counter.window_start) < window);
    }

    /// Purges if the map is over its bound and no purge ran this window.
    /// Concurrent callers skip instead of waiting for the lock.
    fn maybe_purge(&self, now: Instant) {
        if self.counters.len() <= self.max_tracked_clients {
            return;
        }

        let Ok(mut next_purge) = self.next_purge.try_lock() else {
            return;
        };
        if now < *next_purge {
            return;
        }
        *next_purge = now + self.policy.window;
        drop(next_purge);

        self.purge_expired();
        debug!(tracked = self.counters.len(), "Purged stale rate-limit counters");
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check_and_consume(&self, client_key: &str) -> Result<RateLimitDecision, AppError> {
        let now = Instant::now();
        self.maybe_purge(now);

        let window = self.policy.window;
        let max_requests = self.policy.max_requests;

        let mut counter = self
            .counters
            .entry(client_key.to_string())
            .or_insert(WindowCounter {
                count: 0,
                window_start: now,
            });

        if now.duration_since(counter.window_start) >= window {
            *counter = WindowCounter {
                count: 0,
                window_start: now,
            };
        }

        let reset_after = window.saturating_sub(now.duration_since(counter.window_start));

        if counter.count < max_requests {
            counter.count += 1;
            Ok(RateLimitDecision {
                remaining: max_requests - counter.count,
                reset_after,
            })
        } else {
            debug!(client = client_key, "Rate limit exceeded");
            Err(AppError::rate_limited(retry_after_secs(reset_after)))
        }
    }

    fn policy(&self) -> RateLimitPolicy {
        self.policy
    }
}

//! Periodic removal of expired links.
//!
//! Expired links stay readable (as `Expired`) until the sweeper physically
//! deletes them; resolution never deletes anything itself. A link removed
//! while a resolution is in flight simply turns into `NotFound` for the next
//! reader, which is fine because it was already logically expired.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use serde_json::json;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Bound on a single bulk delete.
pub const DEFAULT_SWEEP_TIMEOUT: Duration = Duration::from_secs(30);

/// Deletes expired links from the repository on a fixed period.
pub struct ExpirySweeper {
    repository: Arc<dyn LinkRepository>,
    interval: Duration,
    timeout: Duration,
}

impl ExpirySweeper {
    pub fn new(repository: Arc<dyn LinkRepository>, interval: Duration) -> Self {
        Self {
            repository,
            interval,
            timeout: DEFAULT_SWEEP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs a single sweep and returns the number of deleted links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::TransientStore`] if the delete does not finish
    /// within the sweep timeout; nothing is lost, the next tick retries.
    pub async fn sweep_once(&self) -> Result<u64, AppError> {
        let delete = self.repository.delete_expired_before(Utc::now());
        let deleted = time::timeout(self.timeout, delete).await.map_err(|_| {
            warn!(timeout = ?self.timeout, "Expiry sweep timed out");
            AppError::transient_store(
                "Storage temporarily unavailable",
                json!({ "operation": "delete_expired_before" }),
            )
        })??;
        info!(deleted, "Expiry sweep removed {} expired links", deleted);
        Ok(deleted)
    }

    /// Sweeps every `interval` until `shutdown` flips to `true`.
    ///
    /// The first sweep happens immediately. A failed sweep is logged and the
    /// loop carries on with the next tick.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.interval.as_secs(),
            "Expiry sweeper started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        error!("Expiry sweep failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Expiry sweeper stopped");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Link, NewLink};
    use crate::domain::repositories::MockLinkRepository;
    use chrono::DateTime;

    /// A store whose calls never complete.
    struct StalledRepository;

    #[async_trait::async_trait]
    impl LinkRepository for StalledRepository {
        async fn insert(&self, _new_link: NewLink) -> Result<Link, AppError> {
            std::future::pending().await
        }
        async fn find_by_code(&self, _code: &str) -> Result<Option<Link>, AppError> {
            std::future::pending().await
        }
        async fn exists_by_code(&self, _code: &str) -> Result<bool, AppError> {
            std::future::pending().await
        }
        async fn save(&self, _link: Link) -> Result<Link, AppError> {
            std::future::pending().await
        }
        async fn record_click(
            &self,
            _code: &str,
            _now: DateTime<Utc>,
        ) -> Result<Option<Link>, AppError> {
            std::future::pending().await
        }
        async fn delete_expired_before(&self, _before: DateTime<Utc>) -> Result<u64, AppError> {
            std::future::pending().await
        }
        async fn list_all(&self) -> Result<Vec<Link>, AppError> {
            std::future::pending().await
        }
        async fn health_check(&self) -> bool {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_once_times_out_on_stalled_store() {
        let sweeper = ExpirySweeper::new(Arc::new(StalledRepository), Duration::from_secs(60))
            .with_timeout(Duration::from_secs(5));

        let started = time::Instant::now();
        let err = sweeper.sweep_once().await.unwrap_err();

        assert!(matches!(err, AppError::TransientStore { .. }));
        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_sweep_once_returns_deleted_count() {
        let mut repo = MockLinkRepository::new();
        repo.expect_delete_expired_before()
            .withf(|before| *before <= Utc::now())
            .times(1)
            .returning(|_| Ok(3));

        let sweeper = ExpirySweeper::new(Arc::new(repo), Duration::from_secs(3600));

        assert_eq!(sweeper.sweep_once().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_sweep_once_propagates_store_errors() {
        let mut repo = MockLinkRepository::new();
        repo.expect_delete_expired_before()
            .times(1)
            .returning(|_| Err(AppError::transient_store("down", json!({}))));

        let sweeper = ExpirySweeper::new(Arc::new(repo), Duration::from_secs(3600));

        let err = sweeper.sweep_once().await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_sweeps_every_interval_and_stops_on_shutdown() {
        let mut repo = MockLinkRepository::new();
        // Immediate first tick plus two more periods.
        repo.expect_delete_expired_before()
            .times(3)
            .returning(|_| Ok(0));

        let sweeper = ExpirySweeper::new(Arc::new(repo), Duration::from_secs(60));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(sweeper.run(rx));

        tokio::time::sleep(Duration::from_secs(121)).await;
        tx.send(true).unwrap();

        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_survives_failed_sweep() {
        let mut repo = MockLinkRepository::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_delete_expired_before()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::transient_store("down", json!({}))));
        repo.expect_delete_expired_before()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(1));

        let sweeper = ExpirySweeper::new(Arc::new(repo), Duration::from_secs(10));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(sweeper.run(rx));

        tokio::time::sleep(Duration::from_secs(15)).await;
        tx.send(true).unwrap();

        handle.await.unwrap();
    }
}

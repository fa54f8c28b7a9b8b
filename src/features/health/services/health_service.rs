use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::features::health::dtos::{LivenessDto, ReadinessDto};

/// Upper bound on the readiness round trip
const READINESS_TIMEOUT: Duration = Duration::from_secs(2);

/// One trivial round trip to storage
#[async_trait]
pub trait DatabasePing: Send + Sync {
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl DatabasePing for PgPool {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(self).await.map(|_| ())
    }
}

pub struct HealthService {
    database: Arc<dyn DatabasePing>,
}

impl HealthService {
    pub fn new(database: Arc<dyn DatabasePing>) -> Self {
        Self { database }
    }

    /// Liveness never touches dependencies
    pub fn check_health(&self) -> LivenessDto {
        LivenessDto { ok: true }
    }

    /// Never fails: any ping error or timeout is reported as `db: false`
    pub async fn check_readiness(&self) -> ReadinessDto {
        let db = match tokio::time::timeout(READINESS_TIMEOUT, self.database.ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Readiness check failed");
                false
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = READINESS_TIMEOUT.as_millis() as u64,
                    "Readiness check timed out"
                );
                false
            }
        };

        ReadinessDto { ok: db, db }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) struct FakeDatabase {
        pub healthy: bool,
        pub calls: AtomicUsize,
    }

    impl FakeDatabase {
        pub(crate) fn new(healthy: bool) -> Arc<Self> {
            Arc::new(Self {
                healthy,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DatabasePing for FakeDatabase {
        async fn ping(&self) -> Result<(), sqlx::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.healthy {
                Ok(())
            } else {
                Err(sqlx::Error::PoolTimedOut)
            }
        }
    }

    struct HangingDatabase;

    #[async_trait]
    impl DatabasePing for HangingDatabase {
        async fn ping(&self) -> Result<(), sqlx::Error> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[test]
    fn test_liveness_skips_database() {
        let database = FakeDatabase::new(false);
        let service = HealthService::new(database.clone());

        assert_eq!(service.check_health(), LivenessDto { ok: true });
        assert_eq!(database.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_readiness_reports_healthy_db() {
        let service = HealthService::new(FakeDatabase::new(true));
        let readiness = tokio_test::block_on(service.check_readiness());
        assert_eq!(readiness, ReadinessDto { ok: true, db: true });
    }

    #[tokio::test]
    async fn test_readiness_swallows_database_error() {
        let database = FakeDatabase::new(false);
        let service = HealthService::new(database.clone());

        let readiness = service.check_readiness().await;
        assert_eq!(readiness, ReadinessDto { ok: false, db: false });
        assert_eq!(database.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_readiness_times_out() {
        let service = HealthService::new(Arc::new(HangingDatabase));
        let readiness = service.check_readiness().await;
        assert_eq!(readiness, ReadinessDto { ok: false, db: false });
    }
}

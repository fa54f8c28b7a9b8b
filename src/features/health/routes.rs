use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::health::{handlers, services::HealthService};

/// Public health checks, mounted outside the tenant middleware
pub fn routes(service: Arc<HealthService>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::health::services::health_service::tests::FakeDatabase;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_healthz_ok_without_db() {
        let database = FakeDatabase::new(false);
        let server = TestServer::new(routes(Arc::new(HealthService::new(database.clone())))).unwrap();

        let response = server.get("/healthz").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "ok": true }));
        assert_eq!(database.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_readyz_ok_when_db_reachable() {
        let server =
            TestServer::new(routes(Arc::new(HealthService::new(FakeDatabase::new(true))))).unwrap();

        let response = server.get("/readyz").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "ok": true, "db": true }));
    }

    #[tokio::test]
    async fn test_readyz_unavailable_when_db_down() {
        let server =
            TestServer::new(routes(Arc::new(HealthService::new(FakeDatabase::new(false))))).unwrap();

        let response = server.get("/readyz").await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        response.assert_json(&json!({ "ok": false, "db": false }));
    }
}

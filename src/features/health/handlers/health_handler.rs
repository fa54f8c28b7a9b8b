use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::features::health::dtos::{LivenessDto, ReadinessDto};
use crate::features::health::services::HealthService;

/// Liveness check
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Process is up", body = LivenessDto),
    ),
    tag = "health"
)]
pub async fn healthz(State(service): State<Arc<HealthService>>) -> Json<LivenessDto> {
    Json(service.check_health())
}

/// Readiness check: one round trip to the database
#[utoipa::path(
    get,
    path = "/readyz",
    responses(
        (status = 200, description = "Database reachable", body = ReadinessDto),
        (status = 503, description = "Database unreachable", body = ReadinessDto)
    ),
    tag = "health"
)]
pub async fn readyz(State(service): State<Arc<HealthService>>) -> (StatusCode, Json<ReadinessDto>) {
    let readiness = service.check_readiness().await;
    let status = if readiness.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(readiness))
}

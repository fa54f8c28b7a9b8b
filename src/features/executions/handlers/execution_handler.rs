use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::executions::dtos::{ExecutionResponseDto, RecordExecutionDto};
use crate::features::executions::services::ExecutionService;
use crate::features::tenancy::CurrentTenant;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// List the caller's executions
#[utoipa::path(
    get,
    path = "/api/executions",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Executions retrieved successfully", body = ApiResponse<Vec<ExecutionResponseDto>>),
    ),
    tag = "executions",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_executions(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<ExecutionService>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ExecutionResponseDto>>>> {
    let (executions, total) = service.list(&ctx, &pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(executions),
        None,
        Some(Meta { total }),
    )))
}

/// Get an execution by id
#[utoipa::path(
    get,
    path = "/api/executions/{id}",
    params(
        ("id" = Uuid, Path, description = "Execution ID")
    ),
    responses(
        (status = 200, description = "Execution retrieved successfully", body = ApiResponse<ExecutionResponseDto>),
        (status = 404, description = "Execution not found")
    ),
    tag = "executions",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_execution(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<ExecutionService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ExecutionResponseDto>>> {
    let execution = service.get_by_id(&ctx, id).await?;
    Ok(Json(ApiResponse::success(Some(execution), None, None)))
}

/// Record an execution of a prompt version
#[utoipa::path(
    post,
    path = "/api/executions",
    request_body = RecordExecutionDto,
    responses(
        (status = 201, description = "Execution recorded", body = ApiResponse<ExecutionResponseDto>),
        (status = 400, description = "Validation error or version mismatch"),
        (status = 404, description = "Prompt not found")
    ),
    tag = "executions",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn record_execution(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<ExecutionService>>,
    AppJson(dto): AppJson<RecordExecutionDto>,
) -> Result<(StatusCode, Json<ApiResponse<ExecutionResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let execution = service.record(&ctx, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(execution), None, None)),
    ))
}

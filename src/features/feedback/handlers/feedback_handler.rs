use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::feedback::dtos::{FeedbackResponseDto, SubmitFeedbackDto};
use crate::features::feedback::services::FeedbackService;
use crate::features::tenancy::CurrentTenant;
use crate::shared::types::{ApiResponse, Meta};

/// List feedback left on an execution
#[utoipa::path(
    get,
    path = "/api/executions/{id}/feedback",
    params(
        ("id" = Uuid, Path, description = "Execution ID")
    ),
    responses(
        (status = 200, description = "Feedback retrieved successfully", body = ApiResponse<Vec<FeedbackResponseDto>>),
        (status = 404, description = "Execution not found")
    ),
    tag = "feedback",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_feedback(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<FeedbackService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<FeedbackResponseDto>>>> {
    let feedback = service.list_for_execution(&ctx, id).await?;
    let total = feedback.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(feedback),
        None,
        Some(Meta { total }),
    )))
}

/// Submit feedback on an execution
#[utoipa::path(
    post,
    path = "/api/feedback",
    request_body = SubmitFeedbackDto,
    responses(
        (status = 201, description = "Feedback submitted", body = ApiResponse<FeedbackResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Execution not found")
    ),
    tag = "feedback",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn submit_feedback(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<FeedbackService>>,
    AppJson(dto): AppJson<SubmitFeedbackDto>,
) -> Result<(StatusCode, Json<ApiResponse<FeedbackResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let feedback = service.submit(&ctx, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(feedback),
            Some("Thanks for the feedback".to_string()),
            None,
        )),
    ))
}

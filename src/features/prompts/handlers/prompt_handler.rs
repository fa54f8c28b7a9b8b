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
use crate::features::prompts::dtos::{
    CreatePromptDto, PromptQueryParams, PromptResponseDto, UpdatePromptDto,
};
use crate::features::prompts::services::PromptService;
use crate::features::tenancy::CurrentTenant;
use crate::shared::types::{ApiResponse, Meta};

/// List prompts visible to the caller
///
/// Own prompts and every public prompt. Anonymous callers only see public prompts.
#[utoipa::path(
    get,
    path = "/api/prompts",
    params(PromptQueryParams),
    responses(
        (status = 200, description = "Prompts retrieved successfully", body = ApiResponse<Vec<PromptResponseDto>>),
    ),
    tag = "prompts",
    security(
        (),
        ("bearer_auth" = [])
    )
)]
pub async fn list_prompts(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<PromptService>>,
    Query(params): Query<PromptQueryParams>,
) -> Result<Json<ApiResponse<Vec<PromptResponseDto>>>> {
    let (prompts, total) = service.list(&ctx, &params).await?;
    Ok(Json(ApiResponse::success(
        Some(prompts),
        None,
        Some(Meta { total }),
    )))
}

/// Get a prompt by id
#[utoipa::path(
    get,
    path = "/api/prompts/{id}",
    params(
        ("id" = Uuid, Path, description = "Prompt ID")
    ),
    responses(
        (status = 200, description = "Prompt retrieved successfully", body = ApiResponse<PromptResponseDto>),
        (status = 404, description = "Prompt not found")
    ),
    tag = "prompts",
    security(
        (),
        ("bearer_auth" = [])
    )
)]
pub async fn get_prompt(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<PromptService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PromptResponseDto>>> {
    let prompt = service.get_by_id(&ctx, id).await?;
    Ok(Json(ApiResponse::success(Some(prompt), None, None)))
}

/// Create a prompt owned by the caller's tenant
#[utoipa::path(
    post,
    path = "/api/prompts",
    request_body = CreatePromptDto,
    responses(
        (status = 201, description = "Prompt created", body = ApiResponse<PromptResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "No tenant bound to the request")
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_prompt(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<PromptService>>,
    AppJson(dto): AppJson<CreatePromptDto>,
) -> Result<(StatusCode, Json<ApiResponse<PromptResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let prompt = service.create(&ctx, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(prompt),
            Some("Prompt created".to_string()),
            None,
        )),
    ))
}

/// Update a prompt owned by the caller's tenant
#[utoipa::path(
    put,
    path = "/api/prompts/{id}",
    params(
        ("id" = Uuid, Path, description = "Prompt ID")
    ),
    request_body = UpdatePromptDto,
    responses(
        (status = 200, description = "Prompt updated", body = ApiResponse<PromptResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Prompt not found")
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_prompt(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<PromptService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdatePromptDto>,
) -> Result<Json<ApiResponse<PromptResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let prompt = service.update(&ctx, id, dto).await?;
    Ok(Json(ApiResponse::success(Some(prompt), None, None)))
}

/// Delete a prompt with its versions and executions
#[utoipa::path(
    delete,
    path = "/api/prompts/{id}",
    params(
        ("id" = Uuid, Path, description = "Prompt ID")
    ),
    responses(
        (status = 200, description = "Prompt deleted"),
        (status = 404, description = "Prompt not found")
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_prompt(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<PromptService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&ctx, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Prompt deleted".to_string()),
        None,
    )))
}

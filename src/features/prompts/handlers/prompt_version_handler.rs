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
use crate::features::prompts::dtos::{CreatePromptVersionDto, PromptVersionResponseDto};
use crate::features::prompts::services::PromptVersionService;
use crate::features::tenancy::CurrentTenant;
use crate::shared::types::{ApiResponse, Meta};

/// List versions of a prompt, newest first
#[utoipa::path(
    get,
    path = "/api/prompts/{id}/versions",
    params(
        ("id" = Uuid, Path, description = "Prompt ID")
    ),
    responses(
        (status = 200, description = "Versions retrieved successfully", body = ApiResponse<Vec<PromptVersionResponseDto>>),
        (status = 404, description = "Prompt not found")
    ),
    tag = "prompt-versions",
    security(
        (),
        ("bearer_auth" = [])
    )
)]
pub async fn list_versions(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<PromptVersionService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PromptVersionResponseDto>>>> {
    let versions = service.list(&ctx, id).await?;
    let total = versions.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(versions),
        None,
        Some(Meta { total }),
    )))
}

/// Get one version of a prompt
#[utoipa::path(
    get,
    path = "/api/prompts/{id}/versions/{version_id}",
    params(
        ("id" = Uuid, Path, description = "Prompt ID"),
        ("version_id" = Uuid, Path, description = "Version ID")
    ),
    responses(
        (status = 200, description = "Version retrieved successfully", body = ApiResponse<PromptVersionResponseDto>),
        (status = 404, description = "Version not found")
    ),
    tag = "prompt-versions",
    security(
        (),
        ("bearer_auth" = [])
    )
)]
pub async fn get_version(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<PromptVersionService>>,
    Path((id, version_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<PromptVersionResponseDto>>> {
    let version = service.get(&ctx, id, version_id).await?;
    Ok(Json(ApiResponse::success(Some(version), None, None)))
}

/// Add a version to a prompt owned by the caller
///
/// The template is compiled before it is stored; its variables are returned.
#[utoipa::path(
    post,
    path = "/api/prompts/{id}/versions",
    params(
        ("id" = Uuid, Path, description = "Prompt ID")
    ),
    request_body = CreatePromptVersionDto,
    responses(
        (status = 201, description = "Version created", body = ApiResponse<PromptVersionResponseDto>),
        (status = 400, description = "Invalid template or parent version"),
        (status = 404, description = "Prompt not found")
    ),
    tag = "prompt-versions",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_version(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<PromptVersionService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<CreatePromptVersionDto>,
) -> Result<(StatusCode, Json<ApiResponse<PromptVersionResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let version = service.create(&ctx, id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(version),
            Some("Version created".to_string()),
            None,
        )),
    ))
}

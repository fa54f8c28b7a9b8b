use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::tenancy::CurrentTenant;
use crate::features::tenants::dtos::{CreateTenantDto, TenantResponseDto, UpdateTenantDto};
use crate::features::tenants::services::TenantService;
use crate::shared::types::ApiResponse;

/// Get the caller's tenant
#[utoipa::path(
    get,
    path = "/api/tenant",
    responses(
        (status = 200, description = "Tenant retrieved successfully", body = ApiResponse<TenantResponseDto>),
        (status = 404, description = "Tenant not found")
    ),
    tag = "tenants",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_current_tenant(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<TenantService>>,
) -> Result<Json<ApiResponse<TenantResponseDto>>> {
    let tenant = service.current(&ctx).await?;
    Ok(Json(ApiResponse::success(Some(tenant), None, None)))
}

/// Provision the tenant row for the tenant in the caller's token
#[utoipa::path(
    post,
    path = "/api/tenant",
    request_body = CreateTenantDto,
    responses(
        (status = 201, description = "Tenant provisioned", body = ApiResponse<TenantResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "No tenant bound to the request"),
        (status = 409, description = "Tenant already provisioned")
    ),
    tag = "tenants",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn provision_tenant(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<TenantService>>,
    AppJson(dto): AppJson<CreateTenantDto>,
) -> Result<(StatusCode, Json<ApiResponse<TenantResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let tenant = service.provision(&ctx, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(tenant), None, None)),
    ))
}

/// Update the caller's tenant
#[utoipa::path(
    put,
    path = "/api/tenant",
    request_body = UpdateTenantDto,
    responses(
        (status = 200, description = "Tenant updated", body = ApiResponse<TenantResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Tenant not found")
    ),
    tag = "tenants",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_tenant(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<TenantService>>,
    AppJson(dto): AppJson<UpdateTenantDto>,
) -> Result<Json<ApiResponse<TenantResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let tenant = service.update(&ctx, dto).await?;
    Ok(Json(ApiResponse::success(Some(tenant), None, None)))
}

/// Delete the caller's tenant and everything it owns
#[utoipa::path(
    delete,
    path = "/api/tenant",
    responses(
        (status = 200, description = "Tenant deleted"),
        (status = 404, description = "Tenant not found")
    ),
    tag = "tenants",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_tenant(
    CurrentTenant(ctx): CurrentTenant,
    State(service): State<Arc<TenantService>>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&ctx).await?;
    Ok(Json(ApiResponse::success(None, None, None)))
}

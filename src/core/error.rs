use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::core::database::is_unavailable;
use crate::features::tenancy::RowKind;
use crate::shared::types::ApiResponse;

/// Postgres SQLSTATE for `insufficient_privilege`, raised when a row fails an RLS `WITH CHECK`
const PG_INSUFFICIENT_PRIVILEGE: &str = "42501";
const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A row was denied by the tenant policy. Rendered exactly like a missing row.
    #[error("Access denied to {0}")]
    PolicyDenied(RowKind),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Guarded table a privilege error refers to, from its table field or its
/// message (`... row-level security policy for table "prompts"`).
fn denied_kind(db_err: &dyn sqlx::error::DatabaseError) -> Option<RowKind> {
    if let Some(kind) = db_err.table().and_then(RowKind::from_table) {
        return Some(kind);
    }

    let rest = db_err.message().split("for table ").nth(1)?;
    let table = rest
        .trim_start_matches('"')
        .split(|c: char| c == '"' || c.is_whitespace())
        .next()?;
    RowKind::from_table(table)
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if is_unavailable(&e) {
            return AppError::StorageUnavailable(e.to_string());
        }

        if let sqlx::Error::Database(db_err) = &e {
            match db_err.code().as_deref() {
                // Storage-level policy rejected the row: same answer as the app-level evaluator
                Some(PG_INSUFFICIENT_PRIVILEGE) => {
                    return match denied_kind(&**db_err) {
                        Some(kind) => AppError::PolicyDenied(kind),
                        None => AppError::NotFound("Resource not found".to_string()),
                    };
                }
                Some(PG_UNIQUE_VIOLATION) => {
                    return AppError::Conflict("Resource already exists".to_string())
                }
                Some(PG_FOREIGN_KEY_VIOLATION) => {
                    return AppError::BadRequest("Referenced record does not exist.".to_string())
                }
                _ => {}
            }
        }

        AppError::Database(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    None,
                )
            }
            AppError::StorageUnavailable(ref msg) => {
                tracing::error!("Storage unavailable: {}", msg);
                let body = Json(ApiResponse::<()>::error(
                    Some("Storage temporarily unavailable, please retry".to_string()),
                    None,
                ));
                let mut response = (StatusCode::SERVICE_UNAVAILABLE, body).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
                return response;
            }
            AppError::PolicyDenied(kind) => {
                tracing::debug!(row_kind = %kind, "Tenant policy denied access");
                (StatusCode::NOT_FOUND, format!("{} not found", kind.label()), None)
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(ref msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.clone(), None),
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::feedback::models::Feedback;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitFeedbackDto {
    pub execution_id: Uuid,

    /// true = thumbs up
    pub rating: bool,

    #[validate(length(max = 4000))]
    pub comment_text: Option<String>,

    pub user_context: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackResponseDto {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub rating: bool,
    pub comment_text: Option<String>,
    pub user_context: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<Feedback> for FeedbackResponseDto {
    fn from(f: Feedback) -> Self {
        Self {
            id: f.id,
            execution_id: f.execution_id,
            rating: f.rating,
            comment_text: f.comment_text,
            user_context: f.user_context_jsonb,
            created_at: f.created_at,
        }
    }
}

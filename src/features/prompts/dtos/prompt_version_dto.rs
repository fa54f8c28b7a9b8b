use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::prompts::models::PromptVersion;

/// Free-form notes attached to a version
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptVersionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_specific_variants: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePromptVersionDto {
    /// Template body; variables use `{{ variable_name }}`
    #[validate(length(min = 1))]
    pub content: String,

    pub metadata: Option<PromptVersionMetadata>,

    /// Branch from an existing version of the same prompt
    pub parent_version_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PromptVersionResponseDto {
    pub id: Uuid,
    pub prompt_id: Uuid,
    pub version_number: i32,
    pub content: String,
    /// Variables referenced by the template, sorted
    pub variables: Vec<String>,
    pub metadata: Option<serde_json::Value>,
    pub parent_version_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl PromptVersionResponseDto {
    pub fn new(v: PromptVersion, variables: Vec<String>) -> Self {
        Self {
            id: v.id,
            prompt_id: v.prompt_id,
            version_number: v.version_number,
            content: v.content,
            variables,
            metadata: v.metadata_jsonb,
            parent_version_id: v.parent_version_id,
            created_at: v.created_at,
        }
    }
}

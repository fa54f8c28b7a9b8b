use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::tenancy::{Guarded, Ownership, RowKind};

/// Immutable snapshot of a prompt's content. No tenant column: ownership comes
/// from the parent prompt, so a version can never drift from its prompt's tenant.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PromptVersion {
    pub id: Uuid,
    pub prompt_id: Uuid,
    pub version_number: i32,
    pub content: String,
    pub metadata_jsonb: Option<serde_json::Value>,
    /// Version this one was branched from, always within the same prompt
    pub parent_version_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Guarded for PromptVersion {
    const KIND: RowKind = RowKind::PromptVersion;

    fn ownership(&self) -> Ownership {
        Ownership::ViaPrompt {
            prompt_id: Some(self.prompt_id),
        }
    }
}

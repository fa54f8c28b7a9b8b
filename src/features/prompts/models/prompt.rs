use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::tenancy::{Guarded, Ownership, ParentPrompt, PromptLookup, RowKind};

/// Template prompt owned by one tenant, optionally shared read-only with every tenant
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Prompt {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guarded for Prompt {
    const KIND: RowKind = RowKind::Prompt;

    fn ownership(&self) -> Ownership {
        Ownership::Direct {
            tenant_id: Some(self.tenant_id),
            is_public: self.is_public,
        }
    }
}

impl From<&Prompt> for ParentPrompt {
    fn from(p: &Prompt) -> Self {
        ParentPrompt {
            id: p.id,
            tenant_id: Some(p.tenant_id),
            is_public: p.is_public,
        }
    }
}

impl PromptLookup for Prompt {
    fn find_prompt(&self, prompt_id: Uuid) -> Option<ParentPrompt> {
        (self.id == prompt_id).then(|| ParentPrompt::from(self))
    }
}

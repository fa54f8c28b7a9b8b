use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::tenancy::{Guarded, Ownership, RowKind};

/// Thumbs up/down on an execution
#[derive(Debug, Clone, FromRow)]
pub struct Feedback {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub tenant_id: Uuid,
    pub rating: bool,
    pub comment_text: Option<String>,
    pub user_context_jsonb: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Guarded for Feedback {
    const KIND: RowKind = RowKind::Feedback;

    fn ownership(&self) -> Ownership {
        Ownership::private(self.tenant_id)
    }
}

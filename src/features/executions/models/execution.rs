use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::tenancy::{Guarded, Ownership, RowKind};

/// One recorded LLM call made with a prompt version. Owned by the tenant that
/// ran it, even when the prompt is another tenant's public prompt.
#[derive(Debug, Clone, FromRow)]
pub struct PromptExecution {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub prompt_id: Uuid,
    pub version_id: Uuid,
    pub llm_provider_id: Option<Uuid>,
    pub model: String,
    pub input_variables_jsonb: Option<serde_json::Value>,
    pub response_text: String,
    pub response_metadata_jsonb: Option<serde_json::Value>,
    pub token_usage_jsonb: Option<serde_json::Value>,
    pub cost_usd: Option<Decimal>,
    pub latency_ms: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Guarded for PromptExecution {
    const KIND: RowKind = RowKind::Execution;

    fn ownership(&self) -> Ownership {
        Ownership::private(self.tenant_id)
    }
}

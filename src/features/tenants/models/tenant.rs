use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::tenancy::{Guarded, Ownership, RowKind};

/// Billing plan, stored as text constrained by a CHECK
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TenantPlan {
    #[default]
    Free,
    Pro,
    Enterprise,
}

/// Isolation root: `id` is the tenant key every other row is owned by
#[derive(Debug, Clone, FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub plan: TenantPlan,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guarded for Tenant {
    const KIND: RowKind = RowKind::Tenant;

    fn ownership(&self) -> Ownership {
        Ownership::private(self.id)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::tenants::models::{Tenant, TenantPlan};

/// Provision the tenant row for the tenant bound to the caller's token
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTenantDto {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[serde(default)]
    pub plan: TenantPlan,

    #[validate(length(min = 1, max = 255))]
    pub stripe_customer_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTenantDto {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    pub plan: Option<TenantPlan>,

    #[validate(length(min = 1, max = 255))]
    pub stripe_customer_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TenantResponseDto {
    pub id: Uuid,
    pub name: String,
    pub plan: TenantPlan,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Tenant> for TenantResponseDto {
    fn from(t: Tenant) -> Self {
        Self {
            id: t.id,
            name: t.name,
            plan: t.plan,
            stripe_customer_id: t.stripe_customer_id,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

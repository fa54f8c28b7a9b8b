use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use super::context::TenantContext;
use super::policy::TenantPolicy;
use super::storage::CURRENT_TENANT_SETTING;
use crate::core::error::Result;

/// One unit of work against storage, bound to a tenant context.
/// Dropping the scope without [`commit`](Self::commit) rolls it back.
///
/// Both the tenant setting and the role are written with `is_local = true`, so
/// they vanish when the transaction commits, rolls back or is dropped. A pooled
/// connection therefore never carries a binding into the next checkout.
pub struct TenantScope {
    tx: Transaction<'static, Postgres>,
    context: TenantContext,
}

impl TenantScope {
    pub async fn begin(
        pool: &PgPool,
        context: &TenantContext,
        rls_role: Option<&str>,
    ) -> Result<Self> {
        let mut tx = pool.begin().await?;

        // Always written, even when unset, so nothing from an earlier session survives
        sqlx::query("SELECT set_config($1, $2, true)")
            .bind(CURRENT_TENANT_SETTING)
            .bind(context.as_setting())
            .execute(&mut *tx)
            .await?;

        if let Some(role) = rls_role {
            sqlx::query("SELECT set_config('role', $1, true)")
                .bind(role)
                .execute(&mut *tx)
                .await?;
        }

        tracing::debug!(tenant = %context, "Tenant scope opened");

        Ok(Self {
            tx,
            context: context.clone(),
        })
    }

    pub fn policy(&self) -> TenantPolicy<'_> {
        TenantPolicy::new(&self.context)
    }

    pub fn conn(&mut self) -> &mut PgConnection {
        &mut *self.tx
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        tracing::debug!(tenant = %self.context, "Tenant scope committed");
        Ok(())
    }
}

/// Pool plus the role tenant scopes switch into. Shared by every tenant-scoped service.
#[derive(Debug, Clone)]
pub struct TenantDatabase {
    pool: PgPool,
    rls_role: Option<String>,
}

impl TenantDatabase {
    pub fn new(pool: PgPool, rls_role: Option<String>) -> Self {
        Self { pool, rls_role }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn scope(&self, context: &TenantContext) -> Result<TenantScope> {
        TenantScope::begin(&self.pool, context, self.rls_role.as_deref()).await
    }
}

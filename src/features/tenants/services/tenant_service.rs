use crate::core::error::{AppError, Result};
use crate::features::tenancy::{
    Operation, Ownership, RowKind, TenantContext, TenantDatabase, TenantPolicy,
};
use crate::features::tenants::dtos::{CreateTenantDto, TenantResponseDto, UpdateTenantDto};
use crate::features::tenants::models::Tenant;

pub struct TenantService {
    db: TenantDatabase,
}

impl TenantService {
    pub fn new(db: TenantDatabase) -> Self {
        Self { db }
    }

    /// The tenant row of the bound tenant
    pub async fn current(&self, ctx: &TenantContext) -> Result<TenantResponseDto> {
        let tenant_id = ctx
            .tenant_uuid()
            .ok_or(AppError::PolicyDenied(RowKind::Tenant))?;

        let mut scope = self.db.scope(ctx).await?;
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, plan, stripe_customer_id, created_at, updated_at
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(scope.conn())
        .await?
        .ok_or(AppError::PolicyDenied(RowKind::Tenant))?;

        TenantPolicy::new(ctx).require(Operation::Select, &tenant)?;
        scope.commit().await?;

        Ok(TenantResponseDto::from(tenant))
    }

    /// Create the tenant row whose id is the bound tenant key (once per account)
    pub async fn provision(
        &self,
        ctx: &TenantContext,
        dto: CreateTenantDto,
    ) -> Result<TenantResponseDto> {
        let tenant_id = ctx
            .tenant_uuid()
            .ok_or(AppError::PolicyDenied(RowKind::Tenant))?;

        TenantPolicy::new(ctx).check(
            RowKind::Tenant,
            Operation::Insert,
            Ownership::private(tenant_id),
        )?;

        let mut scope = self.db.scope(ctx).await?;
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (id, name, plan, stripe_customer_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, plan, stripe_customer_id, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(&dto.name)
        .bind(dto.plan)
        .bind(&dto.stripe_customer_id)
        .fetch_one(scope.conn())
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict("Tenant has already been provisioned".to_string())
            }
            other => other,
        })?;
        scope.commit().await?;

        tracing::info!(tenant_id = %tenant.id, plan = ?tenant.plan, "Tenant provisioned");

        Ok(TenantResponseDto::from(tenant))
    }

    pub async fn update(
        &self,
        ctx: &TenantContext,
        dto: UpdateTenantDto,
    ) -> Result<TenantResponseDto> {
        let tenant_id = ctx
            .tenant_uuid()
            .ok_or(AppError::PolicyDenied(RowKind::Tenant))?;

        let mut scope = self.db.scope(ctx).await?;
        let existing = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, plan, stripe_customer_id, created_at, updated_at
            FROM tenants
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(scope.conn())
        .await?
        .ok_or(AppError::PolicyDenied(RowKind::Tenant))?;

        TenantPolicy::new(ctx).require(Operation::Update, &existing)?;

        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants
            SET name = COALESCE($1, name),
                plan = COALESCE($2, plan),
                stripe_customer_id = COALESCE($3, stripe_customer_id),
                updated_at = NOW()
            WHERE id = $4
            RETURNING id, name, plan, stripe_customer_id, created_at, updated_at
            "#,
        )
        .bind(&dto.name)
        .bind(dto.plan)
        .bind(&dto.stripe_customer_id)
        .bind(existing.id)
        .fetch_one(scope.conn())
        .await?;
        scope.commit().await?;

        Ok(TenantResponseDto::from(tenant))
    }

    /// Delete the bound tenant; every prompt, version, execution and feedback row cascades
    pub async fn delete(&self, ctx: &TenantContext) -> Result<()> {
        let tenant_id = ctx
            .tenant_uuid()
            .ok_or(AppError::PolicyDenied(RowKind::Tenant))?;

        TenantPolicy::new(ctx).check(
            RowKind::Tenant,
            Operation::Delete,
            Ownership::private(tenant_id),
        )?;

        let mut scope = self.db.scope(ctx).await?;
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .execute(scope.conn())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::PolicyDenied(RowKind::Tenant));
        }
        scope.commit().await?;

        tracing::info!(tenant_id = %tenant_id, "Tenant deleted");
        Ok(())
    }
}

use crate::core::error::{AppError, Result};
use crate::features::prompts::dtos::{
    CreatePromptDto, PromptQueryParams, PromptResponseDto, UpdatePromptDto,
};
use crate::features::prompts::models::Prompt;
use crate::features::tenancy::{
    Operation, Ownership, RowKind, TenantContext, TenantDatabase, TenantPolicy,
};
use sqlx::PgConnection;
use uuid::Uuid;

/// User-facing list filters. Which rows are visible at all is decided by the
/// `prompts_select` policy, not by this clause.
const LIST_FILTER: &str = r#"
    ($1::text IS NULL OR name ILIKE $1 ESCAPE '\' OR description ILIKE $1 ESCAPE '\')
    AND (
        $2 = 'all'
        OR ($2 = 'own' AND tenant_id = $3)
        OR ($2 = 'public' AND is_public = true)
    )
"#;

/// Fetch a prompt through the caller's scope; `lock` takes a row lock for a following write
pub(crate) async fn find_prompt(
    conn: &mut PgConnection,
    id: Uuid,
    lock: bool,
) -> Result<Option<Prompt>> {
    let query = if lock {
        r#"
        SELECT id, tenant_id, name, description, is_public, created_at, updated_at
        FROM prompts
        WHERE id = $1
        FOR UPDATE
        "#
    } else {
        r#"
        SELECT id, tenant_id, name, description, is_public, created_at, updated_at
        FROM prompts
        WHERE id = $1
        "#
    };

    let prompt = sqlx::query_as::<_, Prompt>(query)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(prompt)
}

pub struct PromptService {
    db: TenantDatabase,
}

impl PromptService {
    pub fn new(db: TenantDatabase) -> Self {
        Self { db }
    }

    /// List prompts visible to the caller: own prompts plus public ones
    pub async fn list(
        &self,
        ctx: &TenantContext,
        params: &PromptQueryParams,
    ) -> Result<(Vec<PromptResponseDto>, i64)> {
        let search = params.search_pattern();
        let visibility = params.visibility.as_str();
        let owner = ctx.tenant_uuid();

        let mut scope = self.db.scope(ctx).await?;

        let count_query = format!("SELECT COUNT(*) FROM prompts WHERE {}", LIST_FILTER);
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(&search)
            .bind(visibility)
            .bind(owner)
            .fetch_one(scope.conn())
            .await?;

        let query = format!(
            r#"
            SELECT id, tenant_id, name, description, is_public, created_at, updated_at
            FROM prompts
            WHERE {}
            ORDER BY created_at {}
            LIMIT $4 OFFSET $5
            "#,
            LIST_FILTER,
            params.sort.as_sql()
        );
        let prompts: Vec<Prompt> = sqlx::query_as(&query)
            .bind(&search)
            .bind(visibility)
            .bind(owner)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(scope.conn())
            .await?;

        scope.commit().await?;

        let prompts = TenantPolicy::new(ctx).filter(Operation::Select, prompts);

        Ok((
            prompts
                .into_iter()
                .map(|p| PromptResponseDto::from_prompt(p, ctx))
                .collect(),
            total,
        ))
    }

    pub async fn get_by_id(&self, ctx: &TenantContext, id: Uuid) -> Result<PromptResponseDto> {
        let mut scope = self.db.scope(ctx).await?;
        let prompt = find_prompt(scope.conn(), id, false)
            .await?
            .ok_or(AppError::PolicyDenied(RowKind::Prompt))?;
        scope.policy().require(Operation::Select, &prompt)?;
        scope.commit().await?;

        Ok(PromptResponseDto::from_prompt(prompt, ctx))
    }

    /// Create a prompt owned by the caller's tenant
    pub async fn create(
        &self,
        ctx: &TenantContext,
        dto: CreatePromptDto,
    ) -> Result<PromptResponseDto> {
        let tenant_id = ctx
            .tenant_uuid()
            .ok_or(AppError::PolicyDenied(RowKind::Prompt))?;

        TenantPolicy::new(ctx).check(
            RowKind::Prompt,
            Operation::Insert,
            Ownership::Direct {
                tenant_id: Some(tenant_id),
                is_public: dto.is_public,
            },
        )?;

        let mut scope = self.db.scope(ctx).await?;
        let prompt = sqlx::query_as::<_, Prompt>(
            r#"
            INSERT INTO prompts (tenant_id, name, description, is_public)
            VALUES ($1, $2, $3, $4)
            RETURNING id, tenant_id, name, description, is_public, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(&dto.name)
        .bind(&dto.description)
        .bind(dto.is_public)
        .fetch_one(scope.conn())
        .await?;
        scope.commit().await?;

        tracing::info!(prompt_id = %prompt.id, is_public = prompt.is_public, "Prompt created");

        Ok(PromptResponseDto::from_prompt(prompt, ctx))
    }

    /// Update a prompt. Public prompts of other tenants are never writable.
    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        dto: UpdatePromptDto,
    ) -> Result<PromptResponseDto> {
        let mut scope = self.db.scope(ctx).await?;
        let existing = find_prompt(scope.conn(), id, true)
            .await?
            .ok_or(AppError::PolicyDenied(RowKind::Prompt))?;

        TenantPolicy::new(ctx).require(Operation::Update, &existing)?;

        let prompt = sqlx::query_as::<_, Prompt>(
            r#"
            UPDATE prompts
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                is_public = COALESCE($3, is_public),
                updated_at = NOW()
            WHERE id = $4
            RETURNING id, tenant_id, name, description, is_public, created_at, updated_at
            "#,
        )
        .bind(&dto.name)
        .bind(&dto.description)
        .bind(dto.is_public)
        .bind(existing.id)
        .fetch_one(scope.conn())
        .await?;
        scope.commit().await?;

        Ok(PromptResponseDto::from_prompt(prompt, ctx))
    }

    /// Hard delete; versions, executions and their feedback cascade
    pub async fn delete(&self, ctx: &TenantContext, id: Uuid) -> Result<()> {
        let mut scope = self.db.scope(ctx).await?;
        let existing = find_prompt(scope.conn(), id, true)
            .await?
            .ok_or(AppError::PolicyDenied(RowKind::Prompt))?;

        TenantPolicy::new(ctx).require(Operation::Delete, &existing)?;

        let result = sqlx::query("DELETE FROM prompts WHERE id = $1")
            .bind(existing.id)
            .execute(scope.conn())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::PolicyDenied(RowKind::Prompt));
        }
        scope.commit().await?;

        tracing::info!(prompt_id = %id, "Prompt deleted");
        Ok(())
    }
}

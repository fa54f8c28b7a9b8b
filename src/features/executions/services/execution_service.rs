use crate::core::error::{AppError, Result};
use crate::features::executions::dtos::{ExecutionResponseDto, RecordExecutionDto};
use crate::features::executions::models::PromptExecution;
use crate::features::prompts::services::prompt_service::find_prompt;
use crate::features::tenancy::{
    Operation, Ownership, RowKind, TenantContext, TenantDatabase, TenantPolicy,
};
use crate::shared::types::PaginationQuery;
use sqlx::PgConnection;
use uuid::Uuid;

pub(crate) async fn find_execution(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<PromptExecution>> {
    let execution = sqlx::query_as::<_, PromptExecution>(
        r#"
        SELECT id, tenant_id, prompt_id, version_id, llm_provider_id, model,
               input_variables_jsonb, response_text, response_metadata_jsonb,
               token_usage_jsonb, cost_usd, latency_ms, created_at
        FROM prompt_executions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(execution)
}

pub struct ExecutionService {
    db: TenantDatabase,
}

impl ExecutionService {
    pub fn new(db: TenantDatabase) -> Self {
        Self { db }
    }

    /// The caller's executions, newest first
    pub async fn list(
        &self,
        ctx: &TenantContext,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<ExecutionResponseDto>, i64)> {
        let mut scope = self.db.scope(ctx).await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM prompt_executions")
            .fetch_one(scope.conn())
            .await?;

        let executions: Vec<PromptExecution> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, prompt_id, version_id, llm_provider_id, model,
                   input_variables_jsonb, response_text, response_metadata_jsonb,
                   token_usage_jsonb, cost_usd, latency_ms, created_at
            FROM prompt_executions
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(scope.conn())
        .await?;

        scope.commit().await?;

        let executions = TenantPolicy::new(ctx).filter(Operation::Select, executions);
        Ok((executions.into_iter().map(Into::into).collect(), total))
    }

    pub async fn get_by_id(&self, ctx: &TenantContext, id: Uuid) -> Result<ExecutionResponseDto> {
        let mut scope = self.db.scope(ctx).await?;
        let execution = find_execution(scope.conn(), id)
            .await?
            .ok_or(AppError::PolicyDenied(RowKind::Execution))?;
        scope.policy().require(Operation::Select, &execution)?;
        scope.commit().await?;

        Ok(execution.into())
    }

    /// Record an execution for the caller's tenant. The prompt only has to be
    /// visible, so public prompts of other tenants can be run.
    pub async fn record(
        &self,
        ctx: &TenantContext,
        dto: RecordExecutionDto,
    ) -> Result<ExecutionResponseDto> {
        let tenant_id = ctx
            .tenant_uuid()
            .ok_or(AppError::PolicyDenied(RowKind::Execution))?;

        let policy = TenantPolicy::new(ctx);
        policy.check(
            RowKind::Execution,
            Operation::Insert,
            Ownership::private(tenant_id),
        )?;

        let token_usage = dto
            .token_usage
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| AppError::Internal(format!("Failed to encode token usage: {}", e)))?;

        let mut scope = self.db.scope(ctx).await?;

        let prompt = find_prompt(scope.conn(), dto.prompt_id, false)
            .await?
            .ok_or(AppError::PolicyDenied(RowKind::Prompt))?;
        policy.require(Operation::Select, &prompt)?;

        let version_matches: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM prompt_versions WHERE id = $1 AND prompt_id = $2)",
        )
        .bind(dto.version_id)
        .bind(prompt.id)
        .fetch_one(scope.conn())
        .await?;

        if !version_matches {
            return Err(AppError::BadRequest(
                "version_id must reference a version of the given prompt".to_string(),
            ));
        }

        let execution = sqlx::query_as::<_, PromptExecution>(
            r#"
            INSERT INTO prompt_executions (
                tenant_id, prompt_id, version_id, llm_provider_id, model,
                input_variables_jsonb, response_text, response_metadata_jsonb,
                token_usage_jsonb, cost_usd, latency_ms
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, tenant_id, prompt_id, version_id, llm_provider_id, model,
                      input_variables_jsonb, response_text, response_metadata_jsonb,
                      token_usage_jsonb, cost_usd, latency_ms, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(prompt.id)
        .bind(dto.version_id)
        .bind(dto.llm_provider_id)
        .bind(&dto.model)
        .bind(&dto.input_variables)
        .bind(&dto.response_text)
        .bind(&dto.response_metadata)
        .bind(token_usage)
        .bind(dto.cost_usd)
        .bind(dto.latency_ms)
        .fetch_one(scope.conn())
        .await?;

        scope.commit().await?;

        tracing::info!(
            execution_id = %execution.id,
            prompt_id = %execution.prompt_id,
            model = %execution.model,
            "Execution recorded"
        );

        Ok(execution.into())
    }
}

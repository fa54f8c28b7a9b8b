use crate::core::error::{AppError, Result};
use crate::features::executions::services::execution_service::find_execution;
use crate::features::feedback::dtos::{FeedbackResponseDto, SubmitFeedbackDto};
use crate::features::feedback::models::Feedback;
use crate::features::tenancy::{
    Operation, Ownership, RowKind, TenantContext, TenantDatabase, TenantPolicy,
};
use uuid::Uuid;

pub struct FeedbackService {
    db: TenantDatabase,
}

impl FeedbackService {
    pub fn new(db: TenantDatabase) -> Self {
        Self { db }
    }

    pub async fn list_for_execution(
        &self,
        ctx: &TenantContext,
        execution_id: Uuid,
    ) -> Result<Vec<FeedbackResponseDto>> {
        let mut scope = self.db.scope(ctx).await?;
        let execution = find_execution(scope.conn(), execution_id)
            .await?
            .ok_or(AppError::PolicyDenied(RowKind::Execution))?;

        let feedback: Vec<Feedback> = sqlx::query_as(
            r#"
            SELECT id, execution_id, tenant_id, rating, comment_text, user_context_jsonb, created_at
            FROM feedback
            WHERE execution_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(execution.id)
        .fetch_all(scope.conn())
        .await?;
        scope.commit().await?;

        let policy = TenantPolicy::new(ctx);
        policy.require(Operation::Select, &execution)?;

        Ok(policy
            .filter(Operation::Select, feedback)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Rate an execution the caller can see
    pub async fn submit(
        &self,
        ctx: &TenantContext,
        dto: SubmitFeedbackDto,
    ) -> Result<FeedbackResponseDto> {
        let tenant_id = ctx
            .tenant_uuid()
            .ok_or(AppError::PolicyDenied(RowKind::Feedback))?;

        let policy = TenantPolicy::new(ctx);
        policy.check(
            RowKind::Feedback,
            Operation::Insert,
            Ownership::private(tenant_id),
        )?;

        let mut scope = self.db.scope(ctx).await?;
        let execution = find_execution(scope.conn(), dto.execution_id)
            .await?
            .ok_or(AppError::PolicyDenied(RowKind::Execution))?;
        policy.require(Operation::Select, &execution)?;

        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedback (execution_id, tenant_id, rating, comment_text, user_context_jsonb)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, execution_id, tenant_id, rating, comment_text, user_context_jsonb, created_at
            "#,
        )
        .bind(execution.id)
        .bind(tenant_id)
        .bind(dto.rating)
        .bind(&dto.comment_text)
        .bind(&dto.user_context)
        .fetch_one(scope.conn())
        .await?;
        scope.commit().await?;

        tracing::info!(
            feedback_id = %feedback.id,
            execution_id = %feedback.execution_id,
            rating = feedback.rating,
            "Feedback submitted"
        );

        Ok(feedback.into())
    }
}

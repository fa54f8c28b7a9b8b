use crate::core::error::{AppError, Result};
use crate::features::prompts::dtos::{CreatePromptVersionDto, PromptVersionResponseDto};
use crate::features::prompts::models::PromptVersion;
use crate::features::prompts::services::prompt_service::find_prompt;
use crate::features::tenancy::{
    Operation, Ownership, RowKind, TenantContext, TenantDatabase, TenantPolicy,
};
use minijinja::Environment;
use uuid::Uuid;

/// Compile a template and return the variables it expects, sorted
pub fn template_variables(content: &str) -> Result<Vec<String>> {
    let env = Environment::new();
    let template = env
        .template_from_str(content)
        .map_err(|e| AppError::Validation(format!("Template compilation failed: {}", e)))?;

    let mut variables: Vec<String> = template.undeclared_variables(false).into_iter().collect();
    variables.sort();
    Ok(variables)
}

fn to_response(version: PromptVersion) -> PromptVersionResponseDto {
    // Stored content was validated on insert; fall back to no variables rather than failing reads
    let variables = template_variables(&version.content).unwrap_or_default();
    PromptVersionResponseDto::new(version, variables)
}

pub struct PromptVersionService {
    db: TenantDatabase,
}

impl PromptVersionService {
    pub fn new(db: TenantDatabase) -> Self {
        Self { db }
    }

    /// Versions of a prompt, newest first. Readable whenever the prompt is.
    pub async fn list(
        &self,
        ctx: &TenantContext,
        prompt_id: Uuid,
    ) -> Result<Vec<PromptVersionResponseDto>> {
        let mut scope = self.db.scope(ctx).await?;
        let prompt = find_prompt(scope.conn(), prompt_id, false)
            .await?
            .ok_or(AppError::PolicyDenied(RowKind::Prompt))?;

        let versions: Vec<PromptVersion> = sqlx::query_as(
            r#"
            SELECT id, prompt_id, version_number, content, metadata_jsonb,
                   parent_version_id, created_at
            FROM prompt_versions
            WHERE prompt_id = $1
            ORDER BY version_number DESC
            "#,
        )
        .bind(prompt_id)
        .fetch_all(scope.conn())
        .await?;
        scope.commit().await?;

        let policy = TenantPolicy::new(ctx);
        policy.require(Operation::Select, &prompt)?;
        let versions = policy
            .with_prompts(&prompt)
            .filter(Operation::Select, versions);

        Ok(versions.into_iter().map(to_response).collect())
    }

    pub async fn get(
        &self,
        ctx: &TenantContext,
        prompt_id: Uuid,
        version_id: Uuid,
    ) -> Result<PromptVersionResponseDto> {
        let mut scope = self.db.scope(ctx).await?;
        let prompt = find_prompt(scope.conn(), prompt_id, false)
            .await?
            .ok_or(AppError::PolicyDenied(RowKind::Prompt))?;

        let version = sqlx::query_as::<_, PromptVersion>(
            r#"
            SELECT id, prompt_id, version_number, content, metadata_jsonb,
                   parent_version_id, created_at
            FROM prompt_versions
            WHERE id = $1 AND prompt_id = $2
            "#,
        )
        .bind(version_id)
        .bind(prompt_id)
        .fetch_optional(scope.conn())
        .await?
        .ok_or(AppError::PolicyDenied(RowKind::PromptVersion))?;
        scope.commit().await?;

        TenantPolicy::new(ctx)
            .with_prompts(&prompt)
            .require(Operation::Select, &version)?;

        Ok(to_response(version))
    }

    /// Append a version to a prompt owned by the caller. Version numbers are
    /// sequential per prompt; a branch parent must belong to the same prompt.
    pub async fn create(
        &self,
        ctx: &TenantContext,
        prompt_id: Uuid,
        dto: CreatePromptVersionDto,
    ) -> Result<PromptVersionResponseDto> {
        let variables = template_variables(&dto.content)?;
        let metadata = dto
            .metadata
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| AppError::Internal(format!("Failed to encode metadata: {}", e)))?;

        let mut scope = self.db.scope(ctx).await?;
        let prompt = find_prompt(scope.conn(), prompt_id, false)
            .await?
            .ok_or(AppError::PolicyDenied(RowKind::Prompt))?;

        // Public prompts are visible here, but only the owner may add versions
        TenantPolicy::new(ctx)
            .with_prompts(&prompt)
            .check(
                RowKind::PromptVersion,
                Operation::Insert,
                Ownership::ViaPrompt {
                    prompt_id: Some(prompt.id),
                },
            )
            .map_err(|_| AppError::PolicyDenied(RowKind::Prompt))?;

        // Serializes version numbering per prompt
        find_prompt(scope.conn(), prompt.id, true).await?;

        if let Some(parent_id) = dto.parent_version_id {
            let same_prompt: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM prompt_versions WHERE id = $1 AND prompt_id = $2)",
            )
            .bind(parent_id)
            .bind(prompt.id)
            .fetch_one(scope.conn())
            .await?;

            if !same_prompt {
                return Err(AppError::BadRequest(
                    "parent_version_id must reference a version of the same prompt".to_string(),
                ));
            }
        }

        let version_number: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version_number), 0) + 1 FROM prompt_versions WHERE prompt_id = $1",
        )
        .bind(prompt.id)
        .fetch_one(scope.conn())
        .await?;

        let version = sqlx::query_as::<_, PromptVersion>(
            r#"
            INSERT INTO prompt_versions (prompt_id, version_number, content, metadata_jsonb, parent_version_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, prompt_id, version_number, content, metadata_jsonb,
                      parent_version_id, created_at
            "#,
        )
        .bind(prompt.id)
        .bind(version_number)
        .bind(&dto.content)
        .bind(metadata)
        .bind(dto.parent_version_id)
        .fetch_one(scope.conn())
        .await?;

        sqlx::query("UPDATE prompts SET updated_at = NOW() WHERE id = $1")
            .bind(prompt.id)
            .execute(scope.conn())
            .await?;

        scope.commit().await?;

        tracing::info!(
            prompt_id = %prompt.id,
            version_number = version.version_number,
            "Prompt version created"
        );

        Ok(PromptVersionResponseDto::new(version, variables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_variables_sorted_and_unique() {
        let vars =
            template_variables("Hi {{ name }}, summarize {{ document }} for {{ name }}").unwrap();
        assert_eq!(vars, vec!["document".to_string(), "name".to_string()]);
    }

    #[test]
    fn test_loop_variables_are_not_inputs() {
        let vars = template_variables("{% for item in items %}- {{ item }}\n{% endfor %}").unwrap();
        assert_eq!(vars, vec!["items".to_string()]);
    }

    #[test]
    fn test_plain_text_has_no_variables() {
        assert!(template_variables("Just answer politely.").unwrap().is_empty());
    }

    #[test]
    fn test_broken_template_is_validation_error() {
        let err = template_variables("Hello {{ name ").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

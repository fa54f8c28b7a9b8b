use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::executions::{dtos as executions_dtos, handlers as executions_handlers};
use crate::features::feedback::{dtos as feedback_dtos, handlers as feedback_handlers};
use crate::features::health::{dtos as health_dtos, handlers as health_handlers};
use crate::features::prompts::{dtos as prompts_dtos, handlers as prompts_handlers};
use crate::features::tenancy::RowKind;
use crate::features::tenants::{
    dtos as tenants_dtos, handlers as tenants_handlers, models as tenants_models,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health_handlers::healthz,
        health_handlers::readyz,
        // Tenants
        tenants_handlers::get_current_tenant,
        tenants_handlers::provision_tenant,
        tenants_handlers::update_tenant,
        tenants_handlers::delete_tenant,
        // Prompts
        prompts_handlers::prompt_handler::list_prompts,
        prompts_handlers::prompt_handler::get_prompt,
        prompts_handlers::prompt_handler::create_prompt,
        prompts_handlers::prompt_handler::update_prompt,
        prompts_handlers::prompt_handler::delete_prompt,
        // Prompt versions
        prompts_handlers::prompt_version_handler::list_versions,
        prompts_handlers::prompt_version_handler::get_version,
        prompts_handlers::prompt_version_handler::create_version,
        // Executions
        executions_handlers::list_executions,
        executions_handlers::get_execution,
        executions_handlers::record_execution,
        // Feedback
        feedback_handlers::list_feedback,
        feedback_handlers::submit_feedback,
    ),
    components(
        schemas(
            // Shared
            Meta,
            RowKind,
            // Health
            health_dtos::LivenessDto,
            health_dtos::ReadinessDto,
            // Tenants
            tenants_models::TenantPlan,
            tenants_dtos::CreateTenantDto,
            tenants_dtos::UpdateTenantDto,
            tenants_dtos::TenantResponseDto,
            ApiResponse<tenants_dtos::TenantResponseDto>,
            // Prompts
            prompts_dtos::SortDirection,
            prompts_dtos::PromptVisibility,
            prompts_dtos::CreatePromptDto,
            prompts_dtos::UpdatePromptDto,
            prompts_dtos::PromptResponseDto,
            ApiResponse<prompts_dtos::PromptResponseDto>,
            ApiResponse<Vec<prompts_dtos::PromptResponseDto>>,
            // Prompt versions
            prompts_dtos::PromptVersionMetadata,
            prompts_dtos::CreatePromptVersionDto,
            prompts_dtos::PromptVersionResponseDto,
            ApiResponse<prompts_dtos::PromptVersionResponseDto>,
            ApiResponse<Vec<prompts_dtos::PromptVersionResponseDto>>,
            // Executions
            executions_dtos::TokenUsage,
            executions_dtos::RecordExecutionDto,
            executions_dtos::ExecutionResponseDto,
            ApiResponse<executions_dtos::ExecutionResponseDto>,
            ApiResponse<Vec<executions_dtos::ExecutionResponseDto>>,
            // Feedback
            feedback_dtos::SubmitFeedbackDto,
            feedback_dtos::FeedbackResponseDto,
            ApiResponse<feedback_dtos::FeedbackResponseDto>,
            ApiResponse<Vec<feedback_dtos::FeedbackResponseDto>>,
        )
    ),
    tags(
        (name = "health", description = "Liveness and readiness checks"),
        (name = "tenants", description = "The caller's tenant"),
        (name = "prompts", description = "Prompt templates, own and public"),
        (name = "prompt-versions", description = "Immutable prompt versions"),
        (name = "executions", description = "Recorded LLM calls"),
        (name = "feedback", description = "Ratings on executions"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "PromptStack API",
        version = "0.1.0",
        description = "Multi-tenant prompt management API",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthz",
            "/readyz",
            "/api/tenant",
            "/api/prompts",
            "/api/prompts/{id}",
            "/api/prompts/{id}/versions",
            "/api/prompts/{id}/versions/{version_id}",
            "/api/executions",
            "/api/executions/{id}",
            "/api/executions/{id}/feedback",
            "/api/feedback",
        ] {
            assert!(doc.paths.paths.contains_key(path), "undocumented: {}", path);
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn test_info_modifier_overrides_defaults() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Staging".to_string(),
            version: "9.9.9".to_string(),
            description: "staging build".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Staging");
        assert_eq!(doc.info.version, "9.9.9");
    }
}

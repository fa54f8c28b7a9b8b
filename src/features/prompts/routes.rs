use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::prompts::handlers;
use crate::features::prompts::services::{PromptService, PromptVersionService};

/// Prompt routes. Reads are open to anonymous callers, who only see public prompts.
pub fn routes(
    prompt_service: Arc<PromptService>,
    version_service: Arc<PromptVersionService>,
) -> Router {
    let prompts = Router::new()
        .route(
            "/api/prompts",
            get(handlers::list_prompts).post(handlers::create_prompt),
        )
        .route(
            "/api/prompts/{id}",
            get(handlers::get_prompt)
                .put(handlers::update_prompt)
                .delete(handlers::delete_prompt),
        )
        .with_state(prompt_service);

    let versions = Router::new()
        .route(
            "/api/prompts/{id}/versions",
            get(handlers::list_versions).post(handlers::create_version),
        )
        .route(
            "/api/prompts/{id}/versions/{version_id}",
            get(handlers::get_version),
        )
        .with_state(version_service);

    prompts.merge(versions)
}

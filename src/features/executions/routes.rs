use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::executions::{handlers, services::ExecutionService};

pub fn routes(service: Arc<ExecutionService>) -> Router {
    Router::new()
        .route(
            "/api/executions",
            get(handlers::list_executions).post(handlers::record_execution),
        )
        .route("/api/executions/{id}", get(handlers::get_execution))
        .with_state(service)
}

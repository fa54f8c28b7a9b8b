use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::feedback::{handlers, services::FeedbackService};

pub fn routes(service: Arc<FeedbackService>) -> Router {
    Router::new()
        .route("/api/executions/{id}/feedback", get(handlers::list_feedback))
        .route("/api/feedback", post(handlers::submit_feedback))
        .with_state(service)
}

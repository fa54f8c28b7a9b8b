use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::tenants::{handlers, services::TenantService};

pub fn routes(service: Arc<TenantService>) -> Router {
    Router::new()
        .route(
            "/api/tenant",
            get(handlers::get_current_tenant)
                .post(handlers::provision_tenant)
                .put(handlers::update_tenant)
                .delete(handlers::delete_tenant),
        )
        .with_state(service)
}

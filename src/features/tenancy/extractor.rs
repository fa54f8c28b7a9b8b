use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

use super::context::TenantContext;

/// The tenant context bound for this request by the tenant middleware.
///
/// Requests that carried no credentials run unbound, which still allows reading
/// public prompts.
///
/// # Example
/// ```ignore
/// pub async fn handler(CurrentTenant(ctx): CurrentTenant) { ... }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub TenantContext);

impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .unwrap_or_default();

        Ok(CurrentTenant(context))
    }
}

use serde::{Deserialize, Serialize};

/// Caller identity established from a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub sub: String,
    /// Tenant key the caller acts for, in its textual form
    pub tenant_id: String,
}

/// Claims carried by access tokens issued for this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub tenant_id: String,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

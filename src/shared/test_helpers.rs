use crate::core::config::AuthConfig;
use crate::features::auth::model::Claims;

pub const TEST_JWT_SECRET: &str = "test-secret-test-secret-test-secret";

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        issuer: None,
        audience: None,
        jwt_leeway: std::time::Duration::from_secs(0),
    }
}

/// Sign an HS256 token the way the external issuer would, `ttl_secs` from now
pub fn issue_token(sub: &str, tenant_id: &str, ttl_secs: i64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        tenant_id: tenant_id.to_string(),
        exp: (now + ttl_secs).max(0) as u64,
        iat: Some(now as u64),
        iss: None,
        aud: None,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

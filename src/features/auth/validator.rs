use super::model::{AuthenticatedUser, Claims};
use crate::core::config::AuthConfig;
use crate::core::error::AppError;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

/// Verifies HS256 access tokens. Token issuance lives outside this service.
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.jwt_leeway.as_secs();
        validation.validate_nbf = true;

        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let header = decode_header(token).map_err(|e| AppError::Unauthorized(e.to_string()))?;

        if header.alg != Algorithm::HS256 {
            return Err(AppError::Unauthorized(format!(
                "Unsupported algorithm: {:?}. Only HS256 is allowed",
                header.alg
            )));
        }

        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        let claims = token_data.claims;

        if claims.tenant_id.trim().is_empty() {
            return Err(AppError::Unauthorized(
                "Token does not carry a tenant".to_string(),
            ));
        }

        Ok(AuthenticatedUser {
            sub: claims.sub,
            tenant_id: claims.tenant_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{issue_token, test_auth_config, TEST_JWT_SECRET};
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[test]
    fn test_valid_token_yields_tenant() {
        let validator = JwtValidator::new(&test_auth_config());
        let token = issue_token("user-1", "11111111-1111-1111-1111-111111111111", 3600);

        let user = validator.validate_token(&token).unwrap();
        assert_eq!(user.sub, "user-1");
        assert_eq!(user.tenant_id, "11111111-1111-1111-1111-111111111111");
    }

    #[test]
    fn test_expired_token_rejected() {
        let validator = JwtValidator::new(&test_auth_config());
        let token = issue_token("user-1", "tenant", -3600);

        assert!(matches!(
            validator.validate_token(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let validator = JwtValidator::new(&test_auth_config());
        let claims = Claims {
            sub: "user-1".to_string(),
            tenant_id: "tenant".to_string(),
            exp: u64::MAX / 2,
            iat: None,
            iss: None,
            aud: None,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"another-secret-another-secret-xx"),
        )
        .unwrap();

        assert!(validator.validate_token(&token).is_err());
        assert_ne!(TEST_JWT_SECRET.as_bytes(), b"another-secret-another-secret-xx");
    }

    #[test]
    fn test_blank_tenant_rejected() {
        let validator = JwtValidator::new(&test_auth_config());
        let token = issue_token("user-1", "  ", 3600);

        assert!(validator.validate_token(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let validator = JwtValidator::new(&test_auth_config());
        assert!(validator.validate_token("not-a-jwt").is_err());
    }
}

//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use consulthub_core::config::AuthConfig;
use consulthub_core::error::AppError;

use super::claims::Claims;
use crate::identity::Identity;

/// Validates HS256 access tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;
        validation.required_spec_claims = ["exp".to_string()].into_iter().collect();

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decode and validate a token string.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                debug!(error = %e, "Token rejected");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::auth_required("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::auth_required("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::auth_required("Invalid token signature")
                    }
                    _ => AppError::auth_required("Invalid or expired token"),
                }
            })?;

        Ok(token_data.claims)
    }

    /// Verify a token and return who it belongs to.
    pub fn verify(&self, token: &str) -> Result<Identity, AppError> {
        self.decode(token).map(|claims| claims.identity())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use consulthub_core::ErrorKind;
    use consulthub_core::types::UserId;
    use consulthub_entity::user::UserRole;

    use super::*;
    use crate::jwt::JwtEncoder;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            leeway_seconds: 0,
        }
    }

    #[test]
    fn test_verify_valid_token() {
        let cfg = config("test-secret");
        let user = UserId::new();
        let token = JwtEncoder::new(&cfg)
            .encode(user, UserRole::Consultant, Duration::minutes(5))
            .unwrap();

        let identity = JwtDecoder::new(&cfg).verify(&token).unwrap();
        assert_eq!(identity.user_id, user);
        assert_eq!(identity.role, UserRole::Consultant);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtEncoder::new(&config("a"))
            .encode(UserId::new(), UserRole::Client, Duration::minutes(5))
            .unwrap();
        let err = JwtDecoder::new(&config("b")).verify(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthRequired);
    }

    #[test]
    fn test_expired_token_rejected() {
        let cfg = config("test-secret");
        let token = JwtEncoder::new(&cfg)
            .encode(UserId::new(), UserRole::Client, Duration::minutes(-5))
            .unwrap();
        let err = JwtDecoder::new(&cfg).verify(&token).unwrap_err();
        assert_eq!(err.message, "Token has expired");
    }

    #[test]
    fn test_garbage_rejected() {
        let err = JwtDecoder::new(&config("s")).verify("not.a.jwt").unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthRequired);
    }
}

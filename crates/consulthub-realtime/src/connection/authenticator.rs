//! WebSocket authentication: verifies the token presented at upgrade time.

use std::sync::Arc;

use consulthub_auth::{Identity, JwtDecoder};
use consulthub_core::error::AppError;

/// Authenticates WebSocket connections using JWT tokens.
#[derive(Clone)]
pub struct WsAuthenticator {
    decoder: Arc<JwtDecoder>,
}

impl std::fmt::Debug for WsAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsAuthenticator").finish()
    }
}

impl WsAuthenticator {
    pub fn new(decoder: Arc<JwtDecoder>) -> Self {
        Self { decoder }
    }

    /// Resolve the identity for a connection attempt.
    ///
    /// `query_token` is the `?token=` parameter; `authorization` is the raw
    /// `Authorization` header. The query parameter wins when both are present.
    pub fn authenticate(
        &self,
        query_token: Option<&str>,
        authorization: Option<&str>,
    ) -> Result<Identity, AppError> {
        let token = query_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or_else(|| authorization.and_then(bearer_token))
            .ok_or_else(|| AppError::auth_required("Authentication required"))?;

        self.decoder.verify(token)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use consulthub_auth::JwtEncoder;
    use consulthub_core::ErrorKind;
    use consulthub_core::config::AuthConfig;
    use consulthub_core::types::UserId;
    use consulthub_entity::user::UserRole;

    use super::*;

    fn setup() -> (WsAuthenticator, JwtEncoder) {
        let config = AuthConfig::default();
        (
            WsAuthenticator::new(Arc::new(JwtDecoder::new(&config))),
            JwtEncoder::new(&config),
        )
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[test]
    fn test_query_token_or_header() {
        let (auth, encoder) = setup();
        let user = UserId::new();
        let token = encoder
            .encode(user, UserRole::Consultant, Duration::hours(1))
            .unwrap();

        let from_query = auth.authenticate(Some(&token), None).unwrap();
        assert_eq!(from_query.user_id, user);
        assert!(from_query.is_consultant());

        let header = format!("Bearer {token}");
        let from_header = auth.authenticate(None, Some(&header)).unwrap();
        assert_eq!(from_header, from_query);
    }

    #[test]
    fn test_missing_or_bad_token_requires_auth() {
        let (auth, _) = setup();
        let missing = auth.authenticate(None, None).unwrap_err();
        assert_eq!(missing.kind, ErrorKind::AuthRequired);
        let empty = auth.authenticate(Some("  "), None).unwrap_err();
        assert_eq!(empty.kind, ErrorKind::AuthRequired);
        let bad = auth.authenticate(Some("not.a.jwt"), None).unwrap_err();
        assert_eq!(bad.kind, ErrorKind::AuthRequired);
    }
}

//! `AuthUser` extractor: pulls the bearer token from the Authorization
//! header and verifies it.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use consulthub_auth::Identity;
use consulthub_core::error::AppError;
use consulthub_realtime::connection::authenticator::bearer_token;

use crate::error::ApiError;
use crate::state::AppState;

/// The verified caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Identity);

impl std::ops::Deref for AuthUser {
    type Target = Identity;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::auth_required("Missing Authorization header"))?;

        let token = bearer_token(header)
            .ok_or_else(|| AppError::auth_required("Invalid Authorization header format"))?;

        let identity = state.jwt_decoder.verify(token)?;
        Ok(AuthUser(identity))
    }
}

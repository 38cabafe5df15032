//! Cached account-credentials access token.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;

/// Refresh this long before the provider-reported expiry.
pub(crate) const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct CachedToken {
    pub token: String,
    pub expires_at: Instant,
}

impl CachedToken {
    pub fn from_response(response: TokenResponse, now: Instant) -> Self {
        Self {
            token: response.access_token,
            expires_at: now + Duration::from_secs(response.expires_in),
        }
    }

    /// Usable if it stays valid for at least [`REFRESH_MARGIN`].
    pub fn is_fresh(&self, now: Instant) -> bool {
        now + REFRESH_MARGIN < self.expires_at
    }
}

//! Video meeting provider configuration.

use serde::{Deserialize, Serialize};

/// Zoom server-to-server OAuth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// When false no meeting is provisioned on claim.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Scheduled meeting length in minutes.
    #[serde(default = "default_duration")]
    pub meeting_duration_minutes: u32,
    /// Request timeout for provider calls in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_api_base")]
    pub api_base_url: String,
    #[serde(default = "default_oauth_url")]
    pub oauth_url: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            account_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            meeting_duration_minutes: default_duration(),
            request_timeout_seconds: default_timeout(),
            api_base_url: default_api_base(),
            oauth_url: default_oauth_url(),
        }
    }
}

fn default_duration() -> u32 {
    60
}

fn default_timeout() -> u64 {
    10
}

fn default_api_base() -> String {
    "https://api.zoom.us/v2".to_string()
}

fn default_oauth_url() -> String {
    "https://zoom.us/oauth/token".to_string()
}

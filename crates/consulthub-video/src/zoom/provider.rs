//! Zoom meeting client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info};

use consulthub_core::config::VideoConfig;
use consulthub_core::error::{AppError, ErrorKind};
use consulthub_core::result::AppResult;
use consulthub_core::traits::video::{VideoMeeting, VideoProvider};

use super::token::{CachedToken, TokenResponse};

#[derive(Debug, Deserialize)]
struct MeetingResponse {
    id: u64,
    join_url: String,
    #[serde(default)]
    password: Option<String>,
}

/// Creates instant Zoom meetings on behalf of one account.
#[derive(Debug)]
pub struct ZoomProvider {
    http: reqwest::Client,
    config: VideoConfig,
    token: Mutex<Option<CachedToken>>,
}

impl ZoomProvider {
    pub fn new(config: VideoConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
            })?;
        Ok(Self {
            http,
            config,
            token: Mutex::new(None),
        })
    }

    /// Return a cached token or fetch a new one. The lock is held across the
    /// fetch so concurrent callers share one token request.
    async fn access_token(&self) -> AppResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.token.clone());
        }

        let url = reqwest::Url::parse_with_params(
            &self.config.oauth_url,
            &[
                ("grant_type", "account_credentials"),
                ("account_id", self.config.account_id.as_str()),
            ],
        )
        .map_err(|e| AppError::with_source(ErrorKind::Configuration, "Invalid Zoom OAuth URL", e))?;

        let response = self
            .http
            .post(url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .send()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::ExternalService, "Zoom OAuth request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Zoom OAuth rejected credentials");
            return Err(AppError::external(format!(
                "Failed to get Zoom access token: {status}"
            )));
        }

        let parsed: TokenResponse = response.json().await.map_err(|e| {
            AppError::with_source(ErrorKind::ExternalService, "Malformed Zoom OAuth response", e)
        })?;
        let fresh = CachedToken::from_response(parsed, Instant::now());
        debug!("Zoom access token refreshed");
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

#[async_trait]
impl VideoProvider for ZoomProvider {
    fn name(&self) -> &str {
        "zoom"
    }

    async fn create_meeting(&self, topic: &str) -> AppResult<VideoMeeting> {
        let token = self.access_token().await?;
        let body = json!({
            "topic": topic,
            "type": 1,
            "duration": self.config.meeting_duration_minutes,
            "settings": {
                "host_video": true,
                "participant_video": true,
                "join_before_host": true,
                "waiting_room": false,
                "audio": "both",
                "auto_recording": "none",
                "approval_type": 0,
                "meeting_authentication": false
            }
        });

        let response = self
            .http
            .post(format!("{}/users/me/meetings", self.config.api_base_url))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ExternalService, "Zoom meeting request failed", e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Zoom refused to create meeting");
            return Err(AppError::external(format!(
                "Failed to create Zoom meeting: {status}"
            )));
        }

        let meeting: MeetingResponse = response.json().await.map_err(|e| {
            AppError::with_source(ErrorKind::ExternalService, "Malformed Zoom meeting response", e)
        })?;
        info!(meeting_id = meeting.id, topic, "Zoom meeting created");

        Ok(VideoMeeting {
            meeting_id: meeting.id.to_string(),
            join_url: meeting.join_url,
            password: meeting.password,
        })
    }
}

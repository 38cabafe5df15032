//! Video-conferencing provider trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// A provisioned meeting, shared with both session participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMeeting {
    pub meeting_id: String,
    pub join_url: String,
    pub password: Option<String>,
}

/// Creates meetings for newly claimed sessions.
///
/// Callers treat failures as non-fatal: a claim stands whether or not a
/// meeting could be provisioned.
#[async_trait]
pub trait VideoProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Create an instant meeting titled `topic`.
    async fn create_meeting(&self, topic: &str) -> AppResult<VideoMeeting>;
}

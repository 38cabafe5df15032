//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use consulthub_core::types::{ConsultantId, RoomId};
use consulthub_entity::session::SessionStatus;
use consulthub_realtime::session::{EndSession, NewSession, SessionQuery};

/// POST /api/sessions
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub room_id: RoomId,
    /// Ask for a specific consultant.
    #[serde(default)]
    pub consultant_id: Option<ConsultantId>,
    #[validate(length(
        min = 10,
        max = 5000,
        message = "Problem description must be between 10 and 5000 characters"
    ))]
    pub problem_description: String,
}

impl From<CreateSessionRequest> for NewSession {
    fn from(req: CreateSessionRequest) -> Self {
        Self {
            room_id: req.room_id,
            consultant_id: req.consultant_id,
            problem_description: req.problem_description,
        }
    }
}

/// GET /api/sessions query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SessionListQuery {
    pub status: Option<SessionStatus>,
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<u32>,
}

impl From<SessionListQuery> for SessionQuery {
    fn from(query: SessionListQuery) -> Self {
        let defaults = SessionQuery::default();
        Self {
            status: query.status,
            page: query.page.unwrap_or(defaults.page),
            limit: query.limit.unwrap_or(defaults.limit),
        }
    }
}

/// POST /api/sessions/{id}/end
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub solution_summary: Option<String>,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub consultant_notes: Option<String>,
}

impl From<EndSessionRequest> for EndSession {
    fn from(req: EndSessionRequest) -> Self {
        Self {
            solution_summary: req.solution_summary,
            consultant_notes: req.consultant_notes,
        }
    }
}

/// POST /api/sessions/{id}/rate
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RateSessionRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub feedback: Option<String>,
}

/// GET /api/notifications query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<u32>,
}

impl NotificationQuery {
    pub const DEFAULT_LIMIT: u32 = 20;

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}

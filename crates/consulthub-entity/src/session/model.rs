//! Session entity model.

use chrono::{DateTime, Utc};
use consulthub_core::types::{ConsultantId, RoomCode, RoomId, SessionId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::SessionStatus;

/// A consulting session between one client and, once claimed, one consultant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    /// Display number, e.g. `SES-2026-00042`.
    pub session_number: String,
    pub client_id: UserId,
    /// Requested consultant while pending; the claimant once active.
    pub consultant_id: Option<ConsultantId>,
    pub room_id: RoomId,
    /// Joined from `rooms`; the queue channel this session was posted to.
    pub room_code: RoomCode,
    pub status: SessionStatus,
    pub problem_description: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub solution_summary: Option<String>,
    pub consultant_notes: Option<String>,
    pub rating: Option<i16>,
    pub feedback: Option<String>,
}

impl Session {
    pub fn is_pending(&self) -> bool {
        self.status == SessionStatus::Pending
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Whether `user` is the client who opened this session.
    pub fn is_client(&self, user: UserId) -> bool {
        self.client_id == user
    }

    /// Whether `consultant` holds the claim.
    pub fn is_assigned_to(&self, consultant: ConsultantId) -> bool {
        self.consultant_id == Some(consultant)
    }

    /// Minutes between `started_at` and `ended_at`, rounded to nearest.
    pub fn elapsed_minutes(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> i32 {
        let seconds = (ended_at - started_at).num_seconds().max(0);
        i32::try_from((seconds + 30) / 60).unwrap_or(i32::MAX)
    }
}

/// Data required to open a new session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub client_id: UserId,
    pub room_id: RoomId,
    pub consultant_id: Option<ConsultantId>,
    pub problem_description: String,
}

/// Data written when an active session ends.
#[derive(Debug, Clone)]
pub struct CompleteSession {
    pub ended_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub solution_summary: Option<String>,
    pub consultant_notes: Option<String>,
}

/// Which sessions a listing returns. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFilter {
    pub client_id: Option<UserId>,
    pub consultant_id: Option<ConsultantId>,
    pub room_id: Option<RoomId>,
    pub status: Option<SessionStatus>,
}

impl SessionFilter {
    pub fn matches(&self, session: &Session) -> bool {
        self.client_id.is_none_or(|id| session.client_id == id)
            && self
                .consultant_id
                .is_none_or(|id| session.consultant_id == Some(id))
            && self.room_id.is_none_or(|id| session.room_id == id)
            && self.status.is_none_or(|status| session.status == status)
    }
}

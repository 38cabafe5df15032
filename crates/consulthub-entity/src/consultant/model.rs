//! Consultant presence record.

use consulthub_core::types::{ConsultantId, RoomCode, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A consultant's availability as stored.
///
/// `current_room` is only ever set while `is_available` is true; the store
/// writes both fields together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ConsultantPresence {
    pub id: ConsultantId,
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub is_available: bool,
    pub current_room: Option<RoomCode>,
}

impl ConsultantPresence {
    /// Collapse the two stored fields into the coordinator's state.
    pub fn state(&self) -> PresenceState {
        match (&self.current_room, self.is_available) {
            (Some(room), true) => PresenceState::Available(room.clone()),
            _ => PresenceState::Offline,
        }
    }

    pub fn summary(&self) -> ConsultantSummary {
        ConsultantSummary {
            id: self.id,
            user_id: self.user_id,
            name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// Presence state machine position of one consultant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceState {
    Offline,
    Available(RoomCode),
}

impl PresenceState {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn room(&self) -> Option<&RoomCode> {
        match self {
            Self::Available(room) => Some(room),
            Self::Offline => None,
        }
    }
}

/// Public view of a consultant sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultantSummary {
    pub id: ConsultantId,
    pub user_id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(is_available: bool, room: Option<&str>) -> ConsultantPresence {
        ConsultantPresence {
            id: ConsultantId::new(),
            user_id: UserId::new(),
            display_name: "Dana".to_string(),
            avatar_url: None,
            is_available,
            current_room: room.map(|r| RoomCode::new(r).unwrap()),
        }
    }

    #[test]
    fn test_state_requires_both_fields() {
        assert_eq!(
            record(true, Some("SALES")).state(),
            PresenceState::Available(RoomCode::new("SALES").unwrap())
        );
        assert_eq!(record(true, None).state(), PresenceState::Offline);
        assert_eq!(record(false, Some("SALES")).state(), PresenceState::Offline);
        assert_eq!(record(false, None).state(), PresenceState::Offline);
    }
}

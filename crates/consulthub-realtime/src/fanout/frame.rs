//! Cross-node fan-out frames.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::channel::Channel;

/// One unit of work published to peer nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FanoutFrame {
    /// Node that produced the frame; it has already applied it locally.
    pub origin: Uuid,
    #[serde(flatten)]
    pub action: FanoutAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum FanoutAction {
    /// Send `payload` to every member of `channel`.
    Deliver { channel: Channel, payload: String },
    /// Send `payload` to every connection.
    DeliverAll { payload: String },
    /// Subscribe every member of `member` to `into`.
    Merge { member: Channel, into: Channel },
    /// Unsubscribe every member of `member` from `from`.
    Evict { member: Channel, from: Channel },
}

#[cfg(test)]
mod tests {
    use consulthub_core::types::{RoomCode, UserId};

    use super::*;

    #[test]
    fn test_frame_json_shape() {
        let user = UserId::new();
        let frame = FanoutFrame {
            origin: Uuid::nil(),
            action: FanoutAction::Merge {
                member: Channel::User(user),
                into: Channel::Room(RoomCode::new("HR").unwrap()),
            },
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["action"], "merge");
        assert_eq!(value["member"], format!("user:{user}"));
        assert_eq!(value["into"], "room:HR");

        let back: FanoutFrame = serde_json::from_value(value).unwrap();
        assert_eq!(back, frame);
    }
}

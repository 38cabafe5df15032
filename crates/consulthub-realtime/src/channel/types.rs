//! Channel naming.

use std::fmt;

use serde::{Deserialize, Serialize};

use consulthub_core::types::{RoomCode, SessionId, UserId};

/// A delivery scope. Rendered as `user:<id>`, `room:<code>` or `session:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Channel {
    /// Every connection of one user.
    User(UserId),
    /// Consultants available in a room; receives the request queue.
    Room(RoomCode),
    /// Participants of one claimed session.
    Session(SessionId),
}

impl Channel {
    /// Parses a channel string into a typed channel.
    pub fn parse(channel: &str) -> Option<Self> {
        let (kind, rest) = channel.split_once(':')?;
        match kind {
            "user" => rest.parse().ok().map(Channel::User),
            "room" => RoomCode::new(rest).ok().map(Channel::Room),
            "session" => rest.parse().ok().map(Channel::Session),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::User(id) => write!(f, "user:{id}"),
            Channel::Room(code) => write!(f, "room:{code}"),
            Channel::Session(id) => write!(f, "session:{id}"),
        }
    }
}

impl TryFrom<String> for Channel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Channel::parse(&value).ok_or_else(|| format!("invalid channel name: {value}"))
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_display() {
        let user = Channel::User(UserId::new());
        let room = Channel::Room(RoomCode::new("SALES").unwrap());
        let session = Channel::Session(SessionId::new());
        for channel in [user, room, session] {
            assert_eq!(Channel::parse(&channel.to_string()), Some(channel));
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(Channel::parse("folder:abc"), None);
        assert_eq!(Channel::parse("user:not-a-uuid"), None);
        assert_eq!(Channel::parse("room:"), None);
        assert_eq!(Channel::parse("sessions"), None);
    }
}

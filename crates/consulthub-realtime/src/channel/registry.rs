//! Channel registry: which local connections belong to which channel.

use std::collections::HashSet;

use dashmap::DashMap;

use consulthub_core::types::ConnectionId;

use super::types::Channel;

/// Membership table for this process, with a reverse index per connection.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    /// Channel → member connections.
    members: DashMap<Channel, HashSet<ConnectionId>>,
    /// Connection → channels it belongs to.
    memberships: DashMap<ConnectionId, HashSet<Channel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to a channel. Returns false if it was already a member.
    pub fn subscribe(&self, channel: &Channel, conn_id: ConnectionId) -> bool {
        let added = self
            .members
            .entry(channel.clone())
            .or_default()
            .insert(conn_id);
        self.memberships
            .entry(conn_id)
            .or_default()
            .insert(channel.clone());
        added
    }

    /// Removes a connection from a channel. Returns false if it was not a member.
    pub fn unsubscribe(&self, channel: &Channel, conn_id: ConnectionId) -> bool {
        let removed = match self.members.get_mut(channel) {
            Some(mut set) => {
                let removed = set.remove(&conn_id);
                if set.is_empty() {
                    drop(set);
                    self.members.remove_if(channel, |_, s| s.is_empty());
                }
                removed
            }
            None => false,
        };
        if let Some(mut channels) = self.memberships.get_mut(&conn_id) {
            channels.remove(channel);
        }
        removed
    }

    /// Removes a connection from every channel it belongs to.
    pub fn unsubscribe_all(&self, conn_id: ConnectionId) -> Vec<Channel> {
        let Some((_, channels)) = self.memberships.remove(&conn_id) else {
            return Vec::new();
        };
        for channel in &channels {
            if let Some(mut set) = self.members.get_mut(channel) {
                set.remove(&conn_id);
                if set.is_empty() {
                    drop(set);
                    self.members.remove_if(channel, |_, s| s.is_empty());
                }
            }
        }
        channels.into_iter().collect()
    }

    /// Connections currently in `channel`.
    pub fn subscribers(&self, channel: &Channel) -> Vec<ConnectionId> {
        self.members
            .get(channel)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_subscribed(&self, channel: &Channel, conn_id: ConnectionId) -> bool {
        self.members
            .get(channel)
            .is_some_and(|set| set.contains(&conn_id))
    }

    /// Channels `conn_id` belongs to.
    pub fn channels_of(&self, conn_id: ConnectionId) -> Vec<Channel> {
        self.memberships
            .get(&conn_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of non-empty channels.
    pub fn channel_count(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use consulthub_core::types::{RoomCode, SessionId};

    use super::*;

    #[test]
    fn test_subscribe_is_idempotent() {
        let registry = ChannelRegistry::new();
        let conn = ConnectionId::new();
        let room = Channel::Room(RoomCode::new("SALES").unwrap());

        assert!(registry.subscribe(&room, conn));
        assert!(!registry.subscribe(&room, conn));
        assert_eq!(registry.subscribers(&room), vec![conn]);
    }

    #[test]
    fn test_empty_channels_are_dropped() {
        let registry = ChannelRegistry::new();
        let conn = ConnectionId::new();
        let session = Channel::Session(SessionId::new());

        registry.subscribe(&session, conn);
        assert_eq!(registry.channel_count(), 1);
        assert!(registry.unsubscribe(&session, conn));
        assert!(!registry.unsubscribe(&session, conn));
        assert_eq!(registry.channel_count(), 0);
    }

    #[test]
    fn test_unsubscribe_all_clears_reverse_index() {
        let registry = ChannelRegistry::new();
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        let room = Channel::Room(RoomCode::new("HR").unwrap());
        let session = Channel::Session(SessionId::new());

        registry.subscribe(&room, a);
        registry.subscribe(&session, a);
        registry.subscribe(&room, b);

        let mut left = registry.unsubscribe_all(a);
        left.sort_by_key(|c| c.to_string());
        assert_eq!(left.len(), 2);
        assert!(registry.channels_of(a).is_empty());
        assert_eq!(registry.subscribers(&room), vec![b]);
        assert!(registry.subscribers(&session).is_empty());
    }
}

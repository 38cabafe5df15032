//! Connection registry: live connections, their identities, and channel
//! membership on this node.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use consulthub_auth::Identity;
use consulthub_core::config::RealtimeConfig;
use consulthub_core::types::{ConnectionId, UserId};

use crate::channel::{Channel, ChannelRegistry};
use crate::metrics::EngineMetrics;

use super::handle::ConnectionHandle;
use super::pool::ConnectionPool;

/// Bookkeeping for every connection this process owns.
///
/// Does membership and local delivery only; cross-node propagation is
/// layered on top by [`ChannelFanout`](crate::fanout::ChannelFanout).
#[derive(Debug)]
pub struct ConnectionRegistry {
    pool: ConnectionPool,
    channels: ChannelRegistry,
    metrics: Arc<EngineMetrics>,
    max_connections_per_user: usize,
    channel_buffer_size: usize,
}

impl ConnectionRegistry {
    pub fn new(config: &RealtimeConfig, metrics: Arc<EngineMetrics>) -> Self {
        Self {
            pool: ConnectionPool::new(),
            channels: ChannelRegistry::new(),
            metrics,
            max_connections_per_user: config.max_connections_per_user.max(1),
            channel_buffer_size: config.channel_buffer_size.max(1),
        }
    }

    /// Register an authenticated connection and subscribe it to `user:<id>`.
    ///
    /// When the user is at the connection cap the oldest connection is
    /// closed and dropped first. Returns the handle and the receiving end of
    /// its outbound queue.
    pub fn register(&self, identity: Identity) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.channel_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(identity, tx));

        let existing = self.pool.user_connections(identity.user_id);
        if existing.len() >= self.max_connections_per_user {
            let excess = existing.len() + 1 - self.max_connections_per_user;
            for oldest in existing.iter().take(excess) {
                warn!(
                    user_id = %identity.user_id,
                    conn_id = %oldest.id,
                    max = self.max_connections_per_user,
                    "User at max connections, evicting oldest"
                );
                oldest.close();
                self.drop_connection(oldest.id);
                EngineMetrics::inc(&self.metrics.connections_evicted);
            }
        }

        self.pool.add(handle.clone());
        self.channels
            .subscribe(&Channel::User(identity.user_id), handle.id);
        self.metrics.connection_opened();

        info!(
            conn_id = %handle.id,
            user_id = %identity.user_id,
            role = %identity.role.as_str(),
            "WebSocket connection registered"
        );

        (handle, rx)
    }

    /// Drop a connection and all of its memberships.
    ///
    /// Returns `None` if the connection was already gone (for example, evicted).
    pub fn unregister(&self, conn_id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let handle = self.drop_connection(conn_id)?;
        handle.mark_dead();
        info!(
            conn_id = %conn_id,
            user_id = %handle.user_id(),
            "WebSocket connection unregistered"
        );
        Some(handle)
    }

    fn drop_connection(&self, conn_id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let handle = self.pool.remove(conn_id)?;
        self.channels.unsubscribe_all(conn_id);
        self.metrics.connection_closed();
        Some(handle)
    }

    pub fn get(&self, conn_id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.pool.get(conn_id)
    }

    /// A user's live connections on this node, oldest first.
    pub fn connections_for(&self, user_id: UserId) -> Vec<Arc<ConnectionHandle>> {
        self.pool.user_connections(user_id)
    }

    pub fn has_connections(&self, user_id: UserId) -> bool {
        self.pool.has_user(user_id)
    }

    pub fn add_to_channel(&self, conn_id: ConnectionId, channel: &Channel) -> bool {
        if self.pool.get(conn_id).is_none() {
            return false;
        }
        let added = self.channels.subscribe(channel, conn_id);
        if added {
            debug!(conn_id = %conn_id, channel = %channel, "Joined channel");
        }
        added
    }

    pub fn remove_from_channel(&self, conn_id: ConnectionId, channel: &Channel) -> bool {
        let removed = self.channels.unsubscribe(channel, conn_id);
        if removed {
            debug!(conn_id = %conn_id, channel = %channel, "Left channel");
        }
        removed
    }

    pub fn is_member(&self, conn_id: ConnectionId, channel: &Channel) -> bool {
        self.channels.is_subscribed(channel, conn_id)
    }

    /// Subscribe every local member of `from` to `into`. Returns how many joined.
    pub fn merge(&self, from: &Channel, into: &Channel) -> usize {
        self.channels
            .subscribers(from)
            .into_iter()
            .filter(|conn_id| self.channels.subscribe(into, *conn_id))
            .count()
    }

    /// Unsubscribe every local member of `member` from `from`. Returns how many left.
    pub fn evict(&self, member: &Channel, from: &Channel) -> usize {
        self.channels
            .subscribers(member)
            .into_iter()
            .filter(|conn_id| self.channels.unsubscribe(from, *conn_id))
            .count()
    }

    /// Queue `frame` on every local member of `channel`. Returns deliveries.
    pub fn deliver(&self, channel: &Channel, frame: &str) -> usize {
        let delivered = self
            .channels
            .subscribers(channel)
            .into_iter()
            .filter_map(|conn_id| self.pool.get(conn_id))
            .filter(|handle| self.send_counted(handle, frame))
            .count();
        debug!(channel = %channel, delivered, "Delivered to channel");
        delivered
    }

    /// Queue `frame` on every local connection.
    pub fn deliver_all(&self, frame: &str) -> usize {
        self.pool
            .all()
            .iter()
            .filter(|handle| self.send_counted(handle, frame))
            .count()
    }

    /// Queue `frame` on one connection.
    pub fn send_to(&self, conn_id: ConnectionId, frame: &str) -> bool {
        self.pool
            .get(conn_id)
            .is_some_and(|handle| self.send_counted(&handle, frame))
    }

    fn send_counted(&self, handle: &ConnectionHandle, frame: &str) -> bool {
        let sent = handle.send(frame);
        if sent {
            EngineMetrics::inc(&self.metrics.messages_sent);
        } else {
            EngineMetrics::inc(&self.metrics.messages_dropped);
        }
        sent
    }

    /// Ask every socket task to close.
    pub fn close_all(&self) {
        for handle in self.pool.all() {
            handle.close();
        }
    }

    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    pub fn user_count(&self) -> usize {
        self.pool.user_count()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.channel_count()
    }
}

#[cfg(test)]
mod tests {
    use consulthub_core::types::{RoomCode, SessionId};
    use consulthub_entity::user::UserRole;

    use super::*;

    fn registry(max_per_user: usize) -> ConnectionRegistry {
        let config = RealtimeConfig {
            max_connections_per_user: max_per_user,
            ..RealtimeConfig::default()
        };
        ConnectionRegistry::new(&config, Arc::new(EngineMetrics::new()))
    }

    fn consultant() -> Identity {
        Identity::new(UserId::new(), UserRole::Consultant)
    }

    #[test]
    fn test_register_joins_user_channel() {
        let registry = registry(10);
        let identity = consultant();
        let (conn, _rx) = registry.register(identity);

        assert!(registry.is_member(conn.id, &Channel::User(identity.user_id)));
        assert_eq!(registry.connections_for(identity.user_id).len(), 1);
    }

    #[tokio::test]
    async fn test_cap_evicts_oldest() {
        let registry = registry(2);
        let identity = consultant();
        let (first, _rx1) = registry.register(identity);
        let (_second, _rx2) = registry.register(identity);
        let (third, _rx3) = registry.register(identity);

        first.closed().await;
        let remaining: Vec<_> = registry
            .connections_for(identity.user_id)
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(!remaining.contains(&first.id));
        assert!(remaining.contains(&third.id));
        assert!(registry.unregister(first.id).is_none());
    }

    #[tokio::test]
    async fn test_merge_and_evict_follow_user_channel() {
        let registry = registry(10);
        let identity = consultant();
        let (a, mut rx_a) = registry.register(identity);
        let (b, mut rx_b) = registry.register(identity);
        let user = Channel::User(identity.user_id);
        let room = Channel::Room(RoomCode::new("SALES").unwrap());

        assert_eq!(registry.merge(&user, &room), 2);
        assert_eq!(registry.merge(&user, &room), 0);
        assert_eq!(registry.deliver(&room, "hello"), 2);
        assert_eq!(rx_a.recv().await.as_deref(), Some("hello"));
        assert_eq!(rx_b.recv().await.as_deref(), Some("hello"));

        assert_eq!(registry.evict(&user, &room), 2);
        assert!(!registry.is_member(a.id, &room));
        assert!(!registry.is_member(b.id, &room));
    }

    #[tokio::test]
    async fn test_unregister_drops_memberships() {
        let registry = registry(10);
        let identity = consultant();
        let (conn, _rx) = registry.register(identity);
        let session = Channel::Session(SessionId::new());
        registry.add_to_channel(conn.id, &session);

        assert!(registry.unregister(conn.id).is_some());
        assert!(!registry.has_connections(identity.user_id));
        assert_eq!(registry.deliver(&session, "x"), 0);
        assert!(!registry.add_to_channel(conn.id, &session));
        assert_eq!(registry.channel_count(), 0);
    }
}

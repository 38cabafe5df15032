//! Presence coordinator: OFFLINE / AVAILABLE(room) transitions for
//! consultants, the disconnect grace period, and presence broadcasts.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use consulthub_auth::Identity;
use consulthub_core::config::RealtimeConfig;
use consulthub_core::error::AppError;
use consulthub_core::result::AppResult;
use consulthub_core::types::{ConnectionId, RoomCode, UserId};
use consulthub_database::{PresenceStore, RoomStore};
use consulthub_entity::consultant::{ConsultantPresence, PresenceState};
use consulthub_entity::room::Room;

use crate::channel::Channel;
use crate::connection::ConnectionRegistry;
use crate::fanout::ChannelFanout;
use crate::message::OutboundEvent;
use crate::message::types::PresenceChanged;
use crate::metrics::EngineMetrics;

use super::ledger::ConnectionLedger;
use super::timers::OfflineTimers;

type UserLocks = DashMap<UserId, Arc<Mutex<()>>>;

/// Holds one consultant's presence lock; drops the map entry when no one
/// else is waiting on it.
struct UserGuard<'a> {
    locks: &'a UserLocks,
    user: UserId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.user, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// An active room with how many consultants are available in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomAvailability {
    #[serde(flatten)]
    pub room: Room,
    pub available_consultants: i64,
}

/// Serializes each consultant's presence handlers and owns the grace timers.
///
/// Room membership follows the user: joining a room subscribes every
/// connection in `user:<id>`, and leaving removes all of them.
///
/// Whether a consultant is still connected is answered cluster-wide: this
/// node's registry first, then the shared [`ConnectionLedger`].
#[derive(Debug)]
pub struct PresenceCoordinator {
    node_id: Uuid,
    presence: Arc<dyn PresenceStore>,
    rooms: Arc<dyn RoomStore>,
    registry: Arc<ConnectionRegistry>,
    fanout: Arc<ChannelFanout>,
    ledger: Arc<dyn ConnectionLedger>,
    metrics: Arc<EngineMetrics>,
    timers: OfflineTimers,
    locks: UserLocks,
    grace_period: Duration,
}

impl PresenceCoordinator {
    pub fn new(
        config: &RealtimeConfig,
        presence: Arc<dyn PresenceStore>,
        rooms: Arc<dyn RoomStore>,
        registry: Arc<ConnectionRegistry>,
        fanout: Arc<ChannelFanout>,
        ledger: Arc<dyn ConnectionLedger>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            node_id: fanout.node_id(),
            presence,
            rooms,
            registry,
            fanout,
            ledger,
            metrics,
            timers: OfflineTimers::new(),
            locks: DashMap::new(),
            grace_period: config.offline_grace_period(),
        }
    }

    async fn lock(&self, user: UserId) -> UserGuard<'_> {
        let lock = self.locks.entry(user).or_default().clone();
        UserGuard {
            locks: &self.locks,
            user,
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Users with a presence handler running or queued.
    pub fn locked_users(&self) -> usize {
        self.locks.len()
    }

    /// Publish this node's connection count for `user`.
    async fn sync_connections(&self, user: UserId) {
        let count = self.registry.connections_for(user).len();
        if let Err(e) = self.ledger.record(self.node_id, user, count).await {
            warn!(user_id = %user, count, error = %e, "Connection ledger update failed");
        }
    }

    /// Whether `user` has a live connection on any node.
    ///
    /// A ledger failure counts as "no remote connections".
    async fn is_connected(&self, user: UserId) -> bool {
        if self.registry.has_connections(user) {
            return true;
        }
        match self.ledger.elsewhere(self.node_id, user).await {
            Ok(remote) => {
                if remote > 0 {
                    debug!(user_id = %user, remote, "Consultant still connected on another node");
                }
                remote > 0
            }
            Err(e) => {
                warn!(user_id = %user, error = %e, "Connection ledger lookup failed");
                false
            }
        }
    }

    fn cancel_timer(&self, user: UserId) {
        if self.timers.cancel(user) {
            EngineMetrics::inc(&self.metrics.timers_cancelled);
            debug!(user_id = %user, "Offline timer cancelled");
        }
    }

    /// Whether an offline timer is pending for `user`.
    pub fn has_pending_timer(&self, user: UserId) -> bool {
        self.timers.is_pending(user)
    }

    /// Make the consultant available in `room`.
    ///
    /// Returns true if the stored state changed (and a broadcast went out).
    pub async fn join(
        &self,
        conn_id: ConnectionId,
        identity: Identity,
        room: RoomCode,
    ) -> AppResult<bool> {
        if !identity.is_consultant() {
            return Err(AppError::forbidden("Only consultants can join rooms"));
        }
        let user = identity.user_id;
        let _guard = self.lock(user).await;
        self.cancel_timer(user);

        let record = self.require_record(user).await?;

        let previous = match record.state() {
            PresenceState::Available(current) if current == room => {
                self.registry.add_to_channel(conn_id, &Channel::Room(room));
                return Ok(false);
            }
            PresenceState::Available(current) => Some(current),
            PresenceState::Offline => None,
        };

        match self.rooms.find_by_code(&room).await? {
            Some(r) if r.is_active => {}
            _ => return Err(AppError::not_found(format!("Room {room} not found"))),
        }

        if !self.presence.set_available(record.id, &room).await? {
            return Err(AppError::not_found("Consultant profile not found"));
        }
        if let Some(previous) = &previous {
            self.fanout
                .leave_members(&Channel::User(user), &Channel::Room(previous.clone()))
                .await;
        }
        self.fanout
            .join_members(&Channel::User(user), &Channel::Room(room.clone()))
            .await;

        info!(
            consultant_id = %record.id,
            user_id = %user,
            room = %room,
            from = previous.as_ref().map(RoomCode::as_str),
            "Consultant available"
        );
        self.broadcast(&record, Some(room)).await?;
        Ok(true)
    }

    /// Take the consultant offline. No-op when not available.
    pub async fn go_offline(&self, identity: Identity) -> AppResult<bool> {
        if !identity.is_consultant() {
            return Ok(false);
        }
        let user = identity.user_id;
        let _guard = self.lock(user).await;
        self.cancel_timer(user);

        let Some(record) = self.presence.find_by_user(user).await? else {
            return Ok(false);
        };
        if !record.state().is_available() {
            return Ok(false);
        }
        self.transition_offline(&record).await?;
        Ok(true)
    }

    /// Called after a connection registers.
    ///
    /// Cancels any pending offline timer and, if the stored record says the
    /// consultant is available, restores room membership and rebroadcasts.
    pub async fn on_connect(&self, conn_id: ConnectionId, identity: Identity) -> AppResult<()> {
        if !identity.is_consultant() {
            return Ok(());
        }
        let user = identity.user_id;
        let _guard = self.lock(user).await;
        self.cancel_timer(user);
        self.sync_connections(user).await;

        let Some(record) = self.presence.find_by_user(user).await? else {
            return Ok(());
        };
        if let PresenceState::Available(room) = record.state() {
            self.registry.add_to_channel(conn_id, &Channel::Room(room.clone()));
            debug!(user_id = %user, room = %room, "Restored room membership on reconnect");
            self.broadcast(&record, Some(room)).await?;
        }
        Ok(())
    }

    /// Called after a connection has been unregistered.
    ///
    /// Starts the grace timer when this was the consultant's last
    /// connection on any node and they are available.
    pub async fn on_disconnect(self: &Arc<Self>, identity: Identity) -> AppResult<()> {
        if !identity.is_consultant() {
            return Ok(());
        }
        let user = identity.user_id;
        let _guard = self.lock(user).await;
        self.sync_connections(user).await;

        let Some(record) = self.presence.find_by_user(user).await? else {
            return Ok(());
        };
        if !record.state().is_available() || self.is_connected(user).await {
            return Ok(());
        }

        let Some(timer) = self.timers.schedule(user) else {
            return Ok(());
        };
        EngineMetrics::inc(&self.metrics.timers_scheduled);
        debug!(
            user_id = %user,
            grace_seconds = self.grace_period.as_secs(),
            "Offline timer scheduled"
        );

        let coordinator = Arc::clone(self);
        let deadline = tokio::time::Instant::now() + self.grace_period;
        tokio::spawn(async move {
            tokio::select! {
                _ = timer.token.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    if let Err(e) = coordinator.expire(user, timer.generation).await {
                        error!(user_id = %user, error = %e, "Offline timer failed");
                    }
                }
            }
        });
        Ok(())
    }

    /// Grace period elapsed: go offline unless the consultant came back.
    async fn expire(&self, user: UserId, generation: u64) -> AppResult<()> {
        let _guard = self.lock(user).await;
        if !self.timers.complete(user, generation) {
            return Ok(());
        }
        EngineMetrics::inc(&self.metrics.timers_fired);

        if self.is_connected(user).await {
            debug!(user_id = %user, "Consultant reconnected during grace period");
            return Ok(());
        }
        let Some(record) = self.presence.find_by_user(user).await? else {
            return Ok(());
        };
        if !record.state().is_available() {
            return Ok(());
        }

        info!(consultant_id = %record.id, user_id = %user, "Grace period elapsed");
        self.transition_offline(&record).await
    }

    async fn transition_offline(&self, record: &ConsultantPresence) -> AppResult<()> {
        self.presence.set_unavailable(record.id).await?;
        if let Some(room) = record.current_room.clone() {
            self.fanout
                .leave_members(&Channel::User(record.user_id), &Channel::Room(room))
                .await;
        }
        info!(consultant_id = %record.id, user_id = %record.user_id, "Consultant offline");
        self.broadcast(record, None).await
    }

    async fn broadcast(
        &self,
        record: &ConsultantPresence,
        room: Option<RoomCode>,
    ) -> AppResult<()> {
        let event = OutboundEvent::ConsultantStatusChanged(PresenceChanged {
            consultant_id: record.id,
            user_id: record.user_id,
            is_available: room.is_some(),
            current_room: room,
        });
        self.fanout.emit_all(&event).await?;
        Ok(())
    }

    /// Active rooms with their available-consultant counts, as of the
    /// last stored transition.
    pub async fn rooms(&self) -> AppResult<Vec<RoomAvailability>> {
        let counts = self.presence.available_by_room().await?;
        Ok(self
            .rooms
            .list_active()
            .await?
            .into_iter()
            .map(|room| RoomAvailability {
                available_consultants: counts.get(&room.code).copied().unwrap_or(0),
                room,
            })
            .collect())
    }

    async fn require_record(&self, user: UserId) -> AppResult<ConsultantPresence> {
        self.presence
            .find_by_user(user)
            .await?
            .ok_or_else(|| AppError::not_found("Consultant profile not found"))
    }

    /// Keep this node's ledger entries counted until `shutdown`, then
    /// withdraw them. Returns `None` when the ledger needs no renewal.
    pub async fn start_lease(&self, shutdown: CancellationToken) -> Option<JoinHandle<()>> {
        let every = self.ledger.renew_interval()?;
        if let Err(e) = self.ledger.renew(self.node_id).await {
            warn!(node_id = %self.node_id, error = %e, "Initial ledger lease failed");
        }
        let ledger = Arc::clone(&self.ledger);
        let node_id = self.node_id;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = ledger.renew(node_id).await {
                            warn!(node_id = %node_id, error = %e, "Ledger lease renewal failed");
                        }
                    }
                }
            }
            if let Err(e) = ledger.forget_node(node_id).await {
                warn!(node_id = %node_id, error = %e, "Failed to withdraw ledger entries");
            }
            debug!(node_id = %node_id, "Ledger lease stopped");
        }))
    }

    /// Cancel every pending timer.
    pub fn shutdown(&self) {
        self.timers.cancel_all();
    }
}

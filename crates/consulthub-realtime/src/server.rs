//! Top-level realtime engine that ties the subsystems together and
//! dispatches inbound socket events.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use consulthub_auth::Identity;
use consulthub_core::config::RealtimeConfig;
use consulthub_core::error::AppError;
use consulthub_core::result::AppResult;
use consulthub_core::traits::VideoProvider;
use consulthub_core::types::ConnectionId;
use consulthub_database::Stores;

use crate::chat::ChatRelay;
use crate::connection::{ConnectionHandle, ConnectionRegistry};
use crate::fanout::{ChannelFanout, PubSub};
use crate::message::validator::validate_frame;
use crate::message::{InboundEvent, OutboundEvent};
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::notification::NotificationSink;
use crate::presence::{ConnectionLedger, PresenceCoordinator};
use crate::session::{ClaimArbitrator, ClaimOutcome, SessionAccess, SessionLifecycle};

/// Central realtime engine for one server process.
#[derive(Clone)]
pub struct RealtimeEngine {
    pub registry: Arc<ConnectionRegistry>,
    pub fanout: Arc<ChannelFanout>,
    pub presence: Arc<PresenceCoordinator>,
    pub claims: Arc<ClaimArbitrator>,
    pub sessions: Arc<SessionLifecycle>,
    pub chat: Arc<ChatRelay>,
    pub notifications: Arc<NotificationSink>,
    pub metrics: Arc<EngineMetrics>,
    ledger: Arc<dyn ConnectionLedger>,
    config: RealtimeConfig,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("node_id", &self.fanout.node_id())
            .finish()
    }
}

/// Engine status for the detailed health endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub node_id: Uuid,
    pub pubsub: String,
    pub ledger: String,
    pub connections: usize,
    pub users: usize,
    pub channels: usize,
    pub metrics: MetricsSnapshot,
}

impl RealtimeEngine {
    pub fn new(
        config: RealtimeConfig,
        stores: Stores,
        pubsub: Arc<dyn PubSub>,
        ledger: Arc<dyn ConnectionLedger>,
        video: Option<Arc<dyn VideoProvider>>,
    ) -> Self {
        let metrics = Arc::new(EngineMetrics::new());
        let registry = Arc::new(ConnectionRegistry::new(&config, metrics.clone()));
        let fanout = Arc::new(ChannelFanout::new(
            Uuid::new_v4(),
            registry.clone(),
            pubsub,
            metrics.clone(),
        ));
        let notifications = Arc::new(NotificationSink::new(
            stores.notifications.clone(),
            fanout.clone(),
            metrics.clone(),
        ));
        let presence = Arc::new(PresenceCoordinator::new(
            &config,
            stores.presence.clone(),
            stores.rooms.clone(),
            registry.clone(),
            fanout.clone(),
            ledger.clone(),
            metrics.clone(),
        ));
        let claims = Arc::new(ClaimArbitrator::new(
            stores.sessions.clone(),
            stores.presence.clone(),
            stores.rooms.clone(),
            registry.clone(),
            fanout.clone(),
            notifications.clone(),
            video,
            metrics.clone(),
        ));
        let sessions = Arc::new(SessionLifecycle::new(
            stores.sessions.clone(),
            stores.presence.clone(),
            stores.rooms.clone(),
            fanout.clone(),
        ));
        let chat = Arc::new(ChatRelay::new(
            stores.chat.clone(),
            stores.sessions.clone(),
            SessionAccess::new(stores.presence.clone()),
            fanout.clone(),
            config.max_chat_message_length,
        ));

        info!(
            node_id = %fanout.node_id(),
            pubsub = fanout.backend(),
            ledger = ledger.name(),
            "Realtime engine initialized"
        );

        Self {
            registry,
            fanout,
            presence,
            claims,
            sessions,
            chat,
            notifications,
            metrics,
            ledger,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Start relaying frames from peer nodes and, when the ledger needs
    /// it, renewing this node's ledger lease.
    pub async fn start(&self) -> AppResult<JoinHandle<()>> {
        self.presence.start_lease(self.shutdown.child_token()).await;
        self.fanout.start_relay(self.shutdown.child_token()).await
    }

    /// Register an authenticated connection.
    ///
    /// Returns the handle and the stream of frames to write to the socket.
    pub async fn connect(
        &self,
        identity: Identity,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (handle, rx) = self.registry.register(identity);
        if let Err(e) = self.presence.on_connect(handle.id, identity).await {
            error!(
                conn_id = %handle.id,
                user_id = %identity.user_id,
                error = %e,
                "Presence restore failed"
            );
        }
        (handle, rx)
    }

    /// Tear down a connection after its socket closed.
    pub async fn disconnect(&self, conn_id: ConnectionId) {
        let Some(handle) = self.registry.unregister(conn_id) else {
            return;
        };
        if let Err(e) = self.presence.on_disconnect(handle.identity).await {
            error!(conn_id = %conn_id, error = %e, "Disconnect handling failed");
        }
    }

    /// Start a task that handles `conn_id`'s text frames one at a time, in
    /// arrival order.
    ///
    /// The socket task only forwards frames, so a slow handler (a video
    /// provider round trip during a claim) never stops it from writing.
    /// The task ends once the returned sender is dropped and the queue is
    /// drained.
    pub fn inbound_worker(&self, conn_id: ConnectionId) -> (mpsc::Sender<String>, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<String>(self.config.channel_buffer_size.max(1));
        let engine = self.clone();
        let task = tokio::spawn(async move {
            while let Some(raw) = rx.recv().await {
                engine.handle_inbound(conn_id, &raw).await;
            }
        });
        (tx, task)
    }

    /// Handle one text frame from a connection.
    ///
    /// Never fails: problems are reported to that connection as an
    /// `error` event.
    pub async fn handle_inbound(&self, conn_id: ConnectionId, raw: &str) {
        EngineMetrics::inc(&self.metrics.messages_received);
        let Some(handle) = self.registry.get(conn_id) else {
            warn!(conn_id = %conn_id, "Message from unknown connection");
            return;
        };

        let parsed = validate_frame(raw, self.config.max_message_size_bytes)
            .and_then(|()| InboundEvent::parse(raw));
        let event = match parsed {
            Ok(event) => event,
            Err(e) => {
                self.fanout.reply(conn_id, &OutboundEvent::error(&e));
                return;
            }
        };

        let name = event.name();
        if let Err(e) = self.dispatch(&handle, event).await {
            let reported = if e.kind.is_client_error() {
                warn!(
                    conn_id = %conn_id,
                    event = name,
                    code = e.kind.code(),
                    message = %e.message,
                    "Event rejected"
                );
                e
            } else {
                error!(conn_id = %conn_id, event = name, error = %e, "Event handler failed");
                AppError::new(e.kind, failure_message(name))
            };
            self.fanout.reply(conn_id, &OutboundEvent::error(&reported));
        }
    }

    async fn dispatch(&self, handle: &ConnectionHandle, event: InboundEvent) -> AppResult<()> {
        let identity = handle.identity;
        match event {
            InboundEvent::JoinRoom { room_code } => {
                self.presence.join(handle.id, identity, room_code).await?;
            }
            InboundEvent::GoOffline => {
                self.presence.go_offline(identity).await?;
            }
            InboundEvent::AcceptSession { session_id } => {
                match self.claims.accept(handle.id, identity, session_id).await? {
                    ClaimOutcome::Won(_) => {}
                    ClaimOutcome::Lost => {
                        return Err(AppError::unavailable(
                            "Session not available for acceptance",
                        ));
                    }
                }
            }
            InboundEvent::JoinSession { session_id } => {
                self.claims.join_session(handle.id, identity, session_id).await?;
            }
            InboundEvent::ChatMessage {
                session_id,
                message,
                message_type,
            } => {
                self.chat
                    .send(identity, session_id, &message, message_type)
                    .await?;
            }
            InboundEvent::MarkRead { session_id } => {
                self.chat.mark_read(identity, session_id).await?;
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            node_id: self.fanout.node_id(),
            pubsub: self.fanout.backend().to_string(),
            ledger: self.ledger.name().to_string(),
            connections: self.registry.connection_count(),
            users: self.registry.user_count(),
            channels: self.registry.channel_count(),
            metrics: self.metrics.snapshot(),
        }
    }

    /// Stop the relay, cancel timers, and close every socket.
    pub fn shutdown(&self) {
        info!("Shutting down realtime engine");
        self.shutdown.cancel();
        self.presence.shutdown();
        self.registry.close_all();
    }
}

/// Generic message for a server-side failure while handling `event`.
fn failure_message(event: &str) -> &'static str {
    match event {
        "consultant:join-room" => "Failed to join room",
        "consultant:go-offline" => "Failed to go offline",
        "session:accept" => "Failed to accept session",
        "session:join" => "Failed to join session",
        "chat:message" => "Failed to send message",
        "chat:mark-read" => "Failed to mark messages as read",
        _ => "Request failed",
    }
}

//! Channel fan-out: local delivery plus cross-node publish.

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use consulthub_core::result::AppResult;
use consulthub_core::types::ConnectionId;

use crate::channel::Channel;
use crate::connection::ConnectionRegistry;
use crate::message::OutboundEvent;
use crate::metrics::EngineMetrics;

use super::{FanoutAction, FanoutFrame, PubSub};

/// Emits events to channels on every node.
///
/// Publish failures are logged and counted; local delivery has already
/// happened by then and is never rolled back.
#[derive(Debug)]
pub struct ChannelFanout {
    node_id: Uuid,
    registry: Arc<ConnectionRegistry>,
    pubsub: Arc<dyn PubSub>,
    metrics: Arc<EngineMetrics>,
}

impl ChannelFanout {
    pub fn new(
        node_id: Uuid,
        registry: Arc<ConnectionRegistry>,
        pubsub: Arc<dyn PubSub>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            node_id,
            registry,
            pubsub,
            metrics,
        }
    }

    pub fn node_id(&self) -> Uuid {
        self.node_id
    }

    pub fn backend(&self) -> &str {
        self.pubsub.name()
    }

    /// Send `event` to every member of `channel`. Returns local deliveries.
    pub async fn emit(&self, channel: &Channel, event: &OutboundEvent) -> AppResult<usize> {
        let payload = event.to_frame()?;
        let delivered = self.registry.deliver(channel, &payload);
        EngineMetrics::inc(&self.metrics.broadcasts);
        self.publish(FanoutAction::Deliver {
            channel: channel.clone(),
            payload,
        })
        .await;
        Ok(delivered)
    }

    /// Send `event` to every connection on every node.
    pub async fn emit_all(&self, event: &OutboundEvent) -> AppResult<usize> {
        let payload = event.to_frame()?;
        let delivered = self.registry.deliver_all(&payload);
        EngineMetrics::inc(&self.metrics.broadcasts);
        self.publish(FanoutAction::DeliverAll { payload }).await;
        Ok(delivered)
    }

    /// Reply to a single local connection. Never crosses nodes.
    pub fn reply(&self, conn_id: ConnectionId, event: &OutboundEvent) -> bool {
        match event.to_frame() {
            Ok(payload) => self.registry.send_to(conn_id, &payload),
            Err(e) => {
                error!(conn_id = %conn_id, error = %e, "Failed to serialize reply");
                false
            }
        }
    }

    /// Subscribe every member of `member` to `into`, on every node.
    pub async fn join_members(&self, member: &Channel, into: &Channel) -> usize {
        let joined = self.registry.merge(member, into);
        self.publish(FanoutAction::Merge {
            member: member.clone(),
            into: into.clone(),
        })
        .await;
        joined
    }

    /// Unsubscribe every member of `member` from `from`, on every node.
    pub async fn leave_members(&self, member: &Channel, from: &Channel) -> usize {
        let left = self.registry.evict(member, from);
        self.publish(FanoutAction::Evict {
            member: member.clone(),
            from: from.clone(),
        })
        .await;
        left
    }

    async fn publish(&self, action: FanoutAction) {
        let frame = FanoutFrame {
            origin: self.node_id,
            action,
        };
        if let Err(e) = self.pubsub.publish(&frame).await {
            EngineMetrics::inc(&self.metrics.publish_failures);
            warn!(
                backend = self.pubsub.name(),
                error = %e,
                "Fan-out publish failed; peers will miss this frame"
            );
        }
    }

    /// Apply a frame received from the transport. Own frames are ignored.
    pub fn apply(&self, frame: FanoutFrame) -> bool {
        if frame.origin == self.node_id {
            return false;
        }
        EngineMetrics::inc(&self.metrics.relayed_frames);
        match frame.action {
            FanoutAction::Deliver { channel, payload } => {
                self.registry.deliver(&channel, &payload);
            }
            FanoutAction::DeliverAll { payload } => {
                self.registry.deliver_all(&payload);
            }
            FanoutAction::Merge { member, into } => {
                self.registry.merge(&member, &into);
            }
            FanoutAction::Evict { member, from } => {
                self.registry.evict(&member, &from);
            }
        }
        true
    }

    /// Subscribe to the transport and spawn the relay loop.
    ///
    /// The subscription is live when this returns, so frames published
    /// afterwards by peers are not missed.
    pub async fn start_relay(
        self: &Arc<Self>,
        shutdown: CancellationToken,
    ) -> AppResult<JoinHandle<()>> {
        let mut frames = self.pubsub.subscribe().await?;
        let fanout = Arc::clone(self);
        info!(node_id = %self.node_id, backend = self.pubsub.name(), "Fan-out relay started");

        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    next = frames.next() => match next {
                        Some(frame) => {
                            fanout.apply(frame);
                        }
                        None => {
                            warn!("Fan-out transport closed");
                            break;
                        }
                    },
                }
            }
            debug!(node_id = %fanout.node_id, "Fan-out relay stopped");
        }))
    }
}

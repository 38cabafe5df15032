//! Redis pub/sub transport for multi-node deployments.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use redis::aio::ConnectionManager;
use tracing::{info, warn};

use consulthub_core::error::{AppError, ErrorKind};
use consulthub_core::result::AppResult;

use super::{FanoutFrame, PubSub};

/// Publishes frames as JSON on one Redis channel and subscribes to it.
#[derive(Clone)]
pub struct RedisPubSub {
    client: redis::Client,
    publisher: ConnectionManager,
    channel: String,
}

impl std::fmt::Debug for RedisPubSub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPubSub")
            .field("channel", &self.channel)
            .finish()
    }
}

impl RedisPubSub {
    pub async fn connect(url: &str, channel: &str) -> AppResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| AppError::with_source(ErrorKind::PubSub, "Invalid Redis URL", e))?;
        let publisher = ConnectionManager::new(client.clone())
            .await
            .map_err(|e| AppError::with_source(ErrorKind::PubSub, "Redis connection failed", e))?;

        info!(channel, "Redis fan-out connected");
        Ok(Self {
            client,
            publisher,
            channel: channel.to_string(),
        })
    }
}

#[async_trait]
impl PubSub for RedisPubSub {
    fn name(&self) -> &str {
        "redis"
    }

    async fn publish(&self, frame: &FanoutFrame) -> AppResult<()> {
        let payload = serde_json::to_string(frame)?;
        let mut conn = self.publisher.clone();
        redis::cmd("PUBLISH")
            .arg(&self.channel)
            .arg(payload)
            .query_async::<i64>(&mut conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::PubSub, "Redis PUBLISH failed", e))?;
        Ok(())
    }

    async fn subscribe(&self) -> AppResult<BoxStream<'static, FanoutFrame>> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::PubSub, "Redis subscribe failed", e))?;
        pubsub
            .subscribe(&self.channel)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::PubSub, "Redis SUBSCRIBE failed", e))?;

        let frames = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: String = match msg.get_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(error = %e, "Unreadable fan-out payload");
                    return None;
                }
            };
            match serde_json::from_str::<FanoutFrame>(&payload) {
                Ok(frame) => Some(frame),
                Err(e) => {
                    warn!(error = %e, "Malformed fan-out frame");
                    None
                }
            }
        });
        Ok(frames.boxed())
    }
}

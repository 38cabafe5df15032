//! In-process pub/sub for single-node deployments and tests.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio::sync::broadcast;
use tracing::warn;

use consulthub_core::result::AppResult;

use super::{FanoutFrame, PubSub};

/// Broadcast-channel transport. Engines sharing one instance behave like
/// separate nodes on one bus.
#[derive(Debug, Clone)]
pub struct MemoryPubSub {
    tx: broadcast::Sender<FanoutFrame>,
}

impl MemoryPubSub {
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size.max(1));
        Self { tx }
    }
}

#[async_trait]
impl PubSub for MemoryPubSub {
    fn name(&self) -> &str {
        "memory"
    }

    async fn publish(&self, frame: &FanoutFrame) -> AppResult<()> {
        // No subscribers is not an error for a single node.
        let _ = self.tx.send(frame.clone());
        Ok(())
    }

    async fn subscribe(&self) -> AppResult<BoxStream<'static, FanoutFrame>> {
        let rx = self.tx.subscribe();
        let frames = stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(frame) => return Some((frame, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Fan-out subscriber lagged, frames lost");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(frames.boxed())
    }
}

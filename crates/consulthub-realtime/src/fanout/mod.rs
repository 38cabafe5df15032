//! Channel fan-out across server instances.
//!
//! Every node delivers an event to its own subscribers first, then
//! publishes a [`FanoutFrame`] so peer nodes can do the same for theirs.

pub mod frame;
pub mod hub;
pub mod memory_pubsub;
#[cfg(feature = "redis-pubsub")]
pub mod redis_pubsub;

use std::fmt::Debug;

use async_trait::async_trait;
use futures::stream::BoxStream;

use consulthub_core::result::AppResult;

pub use frame::{FanoutAction, FanoutFrame};
pub use hub::ChannelFanout;
pub use memory_pubsub::MemoryPubSub;
#[cfg(feature = "redis-pubsub")]
pub use redis_pubsub::RedisPubSub;

/// At-least-once publish/subscribe transport shared by all nodes.
#[async_trait]
pub trait PubSub: Send + Sync + Debug + 'static {
    /// Backend name for logs and health output.
    fn name(&self) -> &str;

    async fn publish(&self, frame: &FanoutFrame) -> AppResult<()>;

    /// Start receiving every frame published after this call returns.
    async fn subscribe(&self) -> AppResult<BoxStream<'static, FanoutFrame>>;
}

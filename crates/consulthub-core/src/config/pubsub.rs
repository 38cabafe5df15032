//! Cross-process fan-out configuration.

use serde::{Deserialize, Serialize};

/// Which transport carries events between server instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PubSubBackend {
    /// Single process; nothing leaves the node.
    #[default]
    Memory,
    /// Redis `PUBLISH`/`SUBSCRIBE`.
    Redis,
}

/// Pub/sub settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubSubConfig {
    #[serde(default)]
    pub backend: PubSubBackend,
    /// Redis connection URL, required for the redis backend.
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Redis channel every node publishes to and subscribes on.
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Key prefix of the shared per-node connection counts.
    #[serde(default = "default_ledger_prefix")]
    pub ledger_prefix: String,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            backend: PubSubBackend::Memory,
            redis_url: None,
            channel: default_channel(),
            ledger_prefix: default_ledger_prefix(),
        }
    }
}

fn default_channel() -> String {
    "consulthub:fanout".to_string()
}

fn default_ledger_prefix() -> String {
    "consulthub:presence".to_string()
}

//! Real-time WebSocket engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Seconds a consultant stays available after their last connection drops.
    #[serde(default = "default_grace_period")]
    pub offline_grace_period_seconds: u64,
    /// Maximum WebSocket connections per user; the oldest is evicted beyond this.
    #[serde(default = "default_max_connections_per_user")]
    pub max_connections_per_user: usize,
    /// Outbound queue depth per connection.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// WebSocket ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// WebSocket ping timeout in seconds.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_seconds: u64,
    /// Maximum inbound frame size in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size_bytes: usize,
    /// Maximum chat message length in characters.
    #[serde(default = "default_max_chat_length")]
    pub max_chat_message_length: usize,
}

impl RealtimeConfig {
    /// Grace period as a [`Duration`].
    pub fn offline_grace_period(&self) -> Duration {
        Duration::from_secs(self.offline_grace_period_seconds)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            offline_grace_period_seconds: default_grace_period(),
            max_connections_per_user: default_max_connections_per_user(),
            channel_buffer_size: default_channel_buffer(),
            ping_interval_seconds: default_ping_interval(),
            ping_timeout_seconds: default_ping_timeout(),
            max_message_size_bytes: default_max_message_size(),
            max_chat_message_length: default_max_chat_length(),
        }
    }
}

fn default_grace_period() -> u64 {
    15
}

fn default_max_connections_per_user() -> usize {
    10
}

fn default_channel_buffer() -> usize {
    256
}

fn default_ping_interval() -> u64 {
    25
}

fn default_ping_timeout() -> u64 {
    20
}

fn default_max_message_size() -> usize {
    65_536
}

fn default_max_chat_length() -> usize {
    5000
}

//! Realtime engine counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level counters, shared by every component of one engine.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Connections ever registered
    pub connections_total: AtomicU64,
    /// Connections currently registered
    pub connections_active: AtomicU64,
    /// Connections closed because the per-user cap was exceeded
    pub connections_evicted: AtomicU64,
    /// Inbound frames received
    pub messages_received: AtomicU64,
    /// Frames queued to local connections
    pub messages_sent: AtomicU64,
    /// Frames dropped because a connection's queue was full
    pub messages_dropped: AtomicU64,
    /// Channel and global emits
    pub broadcasts: AtomicU64,
    /// Frames applied from other nodes
    pub relayed_frames: AtomicU64,
    /// Failed publishes to the cross-node transport
    pub publish_failures: AtomicU64,
    /// Claims that won the PENDING → ACTIVE transition
    pub claims_won: AtomicU64,
    /// Claims that found the session already taken
    pub claims_lost: AtomicU64,
    /// Offline grace timers started
    pub timers_scheduled: AtomicU64,
    /// Offline grace timers cancelled before firing
    pub timers_cancelled: AtomicU64,
    /// Offline grace timers that ran to completion
    pub timers_fired: AtomicU64,
    /// Notifications persisted and pushed
    pub notifications_sent: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        // Saturating: eviction and unregister may race on the same handle.
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    /// Bump a counter by one.
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Bump a counter by `n`.
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            connections_total: load(&self.connections_total),
            connections_active: load(&self.connections_active),
            connections_evicted: load(&self.connections_evicted),
            messages_received: load(&self.messages_received),
            messages_sent: load(&self.messages_sent),
            messages_dropped: load(&self.messages_dropped),
            broadcasts: load(&self.broadcasts),
            relayed_frames: load(&self.relayed_frames),
            publish_failures: load(&self.publish_failures),
            claims_won: load(&self.claims_won),
            claims_lost: load(&self.claims_lost),
            timers_scheduled: load(&self.timers_scheduled),
            timers_cancelled: load(&self.timers_cancelled),
            timers_fired: load(&self.timers_fired),
            notifications_sent: load(&self.notifications_sent),
        }
    }
}

/// Serializable point-in-time copy of [`EngineMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub connections_total: u64,
    pub connections_active: u64,
    pub connections_evicted: u64,
    pub messages_received: u64,
    pub messages_sent: u64,
    pub messages_dropped: u64,
    pub broadcasts: u64,
    pub relayed_frames: u64,
    pub publish_failures: u64,
    pub claims_won: u64,
    pub claims_lost: u64,
    pub timers_scheduled: u64,
    pub timers_cancelled: u64,
    pub timers_fired: u64,
    pub notifications_sent: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_counters() {
        let metrics = EngineMetrics::new();
        metrics.connection_opened();
        metrics.connection_opened();
        metrics.connection_closed();
        metrics.connection_closed();
        metrics.connection_closed();

        let snap = metrics.snapshot();
        assert_eq!(snap.connections_total, 2);
        assert_eq!(snap.connections_active, 0);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let metrics = EngineMetrics::new();
        EngineMetrics::inc(&metrics.claims_won);
        let value = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(value["claimsWon"], 1);
        assert_eq!(value["timersFired"], 0);
    }
}

//! Cluster-wide connection counts, used to decide whether a consultant
//! still has a socket open anywhere before taking them offline.

use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use consulthub_core::result::AppResult;
use consulthub_core::types::UserId;

/// Per-node connection counts shared by every node.
#[async_trait]
pub trait ConnectionLedger: Send + Sync + Debug + 'static {
    /// Backend name for logs and health output.
    fn name(&self) -> &str;

    /// Record that `node` holds `count` connections for `user`. Zero clears the entry.
    async fn record(&self, node: Uuid, user: UserId, count: usize) -> AppResult<()>;

    /// Connections `user` holds on live nodes other than `node`.
    async fn elsewhere(&self, node: Uuid, user: UserId) -> AppResult<usize>;

    /// How often a node must call [`renew`](Self::renew) to stay live.
    /// `None` when entries never expire.
    fn renew_interval(&self) -> Option<Duration> {
        None
    }

    /// Keep `node`'s entries counted.
    async fn renew(&self, _node: Uuid) -> AppResult<()> {
        Ok(())
    }

    /// Stop counting everything `node` recorded.
    async fn forget_node(&self, node: Uuid) -> AppResult<()>;
}

/// In-process ledger. Engines sharing one instance see each other's counts.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    counts: DashMap<UserId, HashMap<Uuid, usize>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionLedger for MemoryLedger {
    fn name(&self) -> &str {
        "memory"
    }

    async fn record(&self, node: Uuid, user: UserId, count: usize) -> AppResult<()> {
        if count > 0 {
            self.counts.entry(user).or_default().insert(node, count);
            return Ok(());
        }
        if let Some(mut nodes) = self.counts.get_mut(&user) {
            nodes.remove(&node);
        }
        self.counts.remove_if(&user, |_, nodes| nodes.is_empty());
        Ok(())
    }

    async fn elsewhere(&self, node: Uuid, user: UserId) -> AppResult<usize> {
        Ok(self.counts.get(&user).map_or(0, |nodes| {
            nodes
                .iter()
                .filter(|(id, _)| **id != node)
                .map(|(_, count)| count)
                .sum()
        }))
    }

    async fn forget_node(&self, node: Uuid) -> AppResult<()> {
        self.counts.retain(|_, nodes| {
            nodes.remove(&node);
            !nodes.is_empty()
        });
        Ok(())
    }
}

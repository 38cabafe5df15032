//! Redis-backed connection ledger for multi-node deployments.
//!
//! Each user has a hash `{prefix}:conns:{user}` of `node id -> count`.
//! A node's fields only count while its lease key `{prefix}:node:{id}`
//! exists, so a node that dies without cleaning up stops counting once
//! the lease lapses.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, info};
use uuid::Uuid;

use consulthub_core::error::{AppError, ErrorKind};
use consulthub_core::result::AppResult;
use consulthub_core::types::UserId;

use super::ledger::ConnectionLedger;

/// Seconds a node lease lives without renewal.
const LEASE_SECONDS: u64 = 30;

/// Renewal period; well inside the lease.
const RENEW_EVERY: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct RedisLedger {
    conn: ConnectionManager,
    prefix: String,
}

impl std::fmt::Debug for RedisLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisLedger")
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl RedisLedger {
    pub async fn connect(url: &str, prefix: &str) -> AppResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| AppError::with_source(ErrorKind::PubSub, "Invalid Redis URL", e))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::PubSub, "Redis connection failed", e))?;

        info!(prefix, "Redis connection ledger connected");
        Ok(Self {
            conn,
            prefix: prefix.to_string(),
        })
    }

    fn user_key(&self, user: UserId) -> String {
        format!("{}:conns:{user}", self.prefix)
    }

    fn lease_key(&self, node: &str) -> String {
        format!("{}:node:{node}", self.prefix)
    }

    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::PubSub, format!("Redis ledger error: {e}"), e)
    }
}

#[async_trait]
impl ConnectionLedger for RedisLedger {
    fn name(&self) -> &str {
        "redis"
    }

    async fn record(&self, node: Uuid, user: UserId, count: usize) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let key = self.user_key(user);
        if count == 0 {
            redis::cmd("HDEL")
                .arg(&key)
                .arg(node.to_string())
                .query_async::<i64>(&mut conn)
                .await
                .map_err(Self::map_err)?;
        } else {
            redis::cmd("HSET")
                .arg(&key)
                .arg(node.to_string())
                .arg(count)
                .query_async::<i64>(&mut conn)
                .await
                .map_err(Self::map_err)?;
        }
        Ok(())
    }

    async fn elsewhere(&self, node: Uuid, user: UserId) -> AppResult<usize> {
        let mut conn = self.conn.clone();
        let key = self.user_key(user);
        let own = node.to_string();
        let entries: HashMap<String, i64> = redis::cmd("HGETALL")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        let mut total = 0usize;
        for (peer, count) in entries {
            if peer == own {
                continue;
            }
            let live: bool = redis::cmd("EXISTS")
                .arg(self.lease_key(&peer))
                .query_async(&mut conn)
                .await
                .map_err(Self::map_err)?;
            if live {
                total += usize::try_from(count).unwrap_or(0);
            } else {
                debug!(user_id = %user, node = %peer, "Dropping ledger entry of expired node");
                redis::cmd("HDEL")
                    .arg(&key)
                    .arg(&peer)
                    .query_async::<i64>(&mut conn)
                    .await
                    .map_err(Self::map_err)?;
            }
        }
        Ok(total)
    }

    fn renew_interval(&self) -> Option<Duration> {
        Some(RENEW_EVERY)
    }

    async fn renew(&self, node: Uuid) -> AppResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(self.lease_key(&node.to_string()))
            .arg(1)
            .arg("EX")
            .arg(LEASE_SECONDS)
            .query_async::<()>(&mut conn)
            .await
            .map_err(Self::map_err)
    }

    async fn forget_node(&self, node: Uuid) -> AppResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(self.lease_key(&node.to_string()))
            .query_async::<i64>(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}

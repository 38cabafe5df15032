//! # consulthub-realtime
//!
//! Real-time coordination core for ConsultHub:
//!
//! - Connection registry with per-connection channel membership
//! - Consultant presence with a disconnect grace period
//! - Single-winner session claims
//! - Session chat and durable notifications
//! - Cross-node fan-out over in-memory or Redis pub/sub
//! - A shared connection ledger so presence survives a tab on another node

pub mod channel;
pub mod chat;
pub mod connection;
pub mod fanout;
pub mod message;
pub mod metrics;
pub mod notification;
pub mod presence;
pub mod server;
pub mod session;

pub use channel::Channel;
pub use connection::{ConnectionHandle, ConnectionRegistry, WsAuthenticator};
pub use fanout::{ChannelFanout, MemoryPubSub, PubSub};
pub use presence::{ConnectionLedger, MemoryLedger, PresenceCoordinator};
pub use server::{EngineStats, RealtimeEngine};
pub use session::{ClaimArbitrator, ClaimOutcome, SessionLifecycle};

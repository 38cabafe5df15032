//! Consultant presence: the availability state machine, its offline
//! grace timers, and the cluster-wide connection ledger.

pub mod coordinator;
pub mod ledger;
#[cfg(feature = "redis-pubsub")]
pub mod redis_ledger;
pub mod timers;

pub use coordinator::{PresenceCoordinator, RoomAvailability};
pub use ledger::{ConnectionLedger, MemoryLedger};
#[cfg(feature = "redis-pubsub")]
pub use redis_ledger::RedisLedger;
pub use timers::OfflineTimers;

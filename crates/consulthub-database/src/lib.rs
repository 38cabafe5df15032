//! # consulthub-database
//!
//! Record stores the coordination core reads and writes. Each store is a
//! trait with two implementations: PostgreSQL repositories for deployment
//! and a DashMap-backed [`MemoryStore`] for single-process runs and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{
    ChatStore, NotificationStore, PresenceStore, RoomStore, SessionStore, Stores,
};

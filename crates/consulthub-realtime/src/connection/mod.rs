//! Live connections: handles, the per-process pool, and channel membership.

pub mod authenticator;
pub mod handle;
pub mod heartbeat;
pub mod pool;
pub mod registry;

pub use authenticator::WsAuthenticator;
pub use handle::ConnectionHandle;
pub use heartbeat::Heartbeat;
pub use pool::ConnectionPool;
pub use registry::ConnectionRegistry;

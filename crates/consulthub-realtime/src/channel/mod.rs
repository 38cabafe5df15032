//! Named delivery channels and their local membership.

pub mod registry;
pub mod types;

pub use registry::ChannelRegistry;
pub use types::Channel;

//! WebSocket wire frames.

pub mod types;
pub mod validator;

pub use types::{InboundEvent, OutboundEvent};

//! Per-session chat.

pub mod relay;

pub use relay::ChatRelay;

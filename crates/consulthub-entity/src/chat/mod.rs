//! Session chat log entities.

pub mod model;

pub use model::{ChatMessage, MessageType, NewChatMessage};

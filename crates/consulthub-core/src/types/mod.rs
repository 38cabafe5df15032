//! Core type definitions used across the ConsultHub workspace.

pub mod id;
pub mod room_code;

pub use id::*;
pub use room_code::RoomCode;

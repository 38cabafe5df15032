//! Request handlers, one module per resource.

pub mod health;
pub mod notification;
pub mod room;
pub mod session;
pub mod ws;

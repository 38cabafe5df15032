//! # consulthub-entity
//!
//! Domain entity models for ConsultHub. Every struct in this crate
//! represents a database table row or a domain value object. Rows derive
//! `sqlx::FromRow`; anything that crosses the wire serializes camelCase.

pub mod chat;
pub mod consultant;
pub mod notification;
pub mod room;
pub mod session;
pub mod user;

//! Durable user notifications with live push.

pub mod sink;

pub use sink::{NotificationPage, NotificationSink};

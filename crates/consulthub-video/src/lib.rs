//! # consulthub-video
//!
//! Implementations of [`consulthub_core::traits::VideoProvider`].

pub mod zoom;

pub use zoom::ZoomProvider;

//! Collaborator traits defined in `consulthub-core` and implemented by other crates.

pub mod video;

pub use video::{VideoMeeting, VideoProvider};

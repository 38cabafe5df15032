//! Zoom instant meetings via server-to-server OAuth.

mod provider;
mod token;

pub use provider::ZoomProvider;

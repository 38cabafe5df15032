//! Consultant profile and presence entities.

pub mod model;

pub use model::{ConsultantPresence, ConsultantSummary, PresenceState};

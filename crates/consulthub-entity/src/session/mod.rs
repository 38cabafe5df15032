//! Consulting session entities.

pub mod model;
pub mod number;
pub mod status;

pub use model::{CompleteSession, CreateSession, Session, SessionFilter};
pub use number::SessionNumber;
pub use status::SessionStatus;

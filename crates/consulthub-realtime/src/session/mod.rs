//! Session claim arbitration, participant checks, and lifecycle.

pub mod access;
pub mod arbitrator;
pub mod lifecycle;

pub use access::{Participant, SessionAccess};
pub use arbitrator::{ClaimArbitrator, ClaimOutcome, ClaimedSession};
pub use lifecycle::{EndSession, NewSession, SessionLifecycle, SessionPage, SessionQuery};

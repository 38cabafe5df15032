//! Human-readable session numbers (`SES-2026-00042`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Year-scoped sequence number shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionNumber {
    pub year: i32,
    pub sequence: i64,
}

impl SessionNumber {
    pub fn new(year: i32, sequence: i64) -> Self {
        Self { year, sequence }
    }
}

impl fmt::Display for SessionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SES-{}-{:05}", self.year, self.sequence)
    }
}

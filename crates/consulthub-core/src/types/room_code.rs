//! Room codes such as `SALES` or `FINANCE`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Longest accepted room code.
pub const MAX_ROOM_CODE_LEN: usize = 50;

/// Short, human-chosen code naming a topic room. Used as the suffix of the
/// `room:<code>` channel, so it never contains `:` or whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct RoomCode(String);

impl RoomCode {
    /// Validate and wrap a room code.
    pub fn new(code: impl Into<String>) -> Result<Self, AppError> {
        let code = code.into().trim().to_string();
        if code.is_empty() {
            return Err(AppError::validation("Room code cannot be empty"));
        }
        if code.len() > MAX_ROOM_CODE_LEN {
            return Err(AppError::validation(format!(
                "Room code exceeds {MAX_ROOM_CODE_LEN} characters"
            )));
        }
        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AppError::validation(format!(
                "Room code contains invalid characters: {code}"
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_codes() {
        assert_eq!(RoomCode::new("SALES").expect("valid").as_str(), "SALES");
        assert_eq!(RoomCode::new("  it-ops_2 ").expect("valid").as_str(), "it-ops_2");
    }

    #[test]
    fn test_invalid_codes() {
        assert!(RoomCode::new("").is_err());
        assert!(RoomCode::new("room:SALES").is_err());
        assert!(RoomCode::new("two words").is_err());
        assert!(RoomCode::new("X".repeat(MAX_ROOM_CODE_LEN + 1)).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: RoomCode = serde_json::from_str("\"FINANCE\"").expect("deserialize");
        assert_eq!(ok.to_string(), "FINANCE");
        assert!(serde_json::from_str::<RoomCode>("\"bad code\"").is_err());
    }
}

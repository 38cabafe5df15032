//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role carried in every access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    /// Operates the platform; may join and end any session.
    Admin,
    /// Claims sessions from the rooms they are available in.
    Consultant,
    /// Opens help requests.
    Client,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn is_consultant(&self) -> bool {
        matches!(self, Self::Consultant)
    }

    pub fn is_client(&self) -> bool {
        matches!(self, Self::Client)
    }

    /// Return the role as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Consultant => "CONSULTANT",
            Self::Client => "CLIENT",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = consulthub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "CONSULTANT" => Ok(Self::Consultant),
            "CLIENT" => Ok(Self::Client),
            _ => Err(consulthub_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: ADMIN, CONSULTANT, CLIENT"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("CONSULTANT".parse::<UserRole>().unwrap(), UserRole::Consultant);
        assert!("viewer".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_serde_uppercase() {
        let json = serde_json::to_string(&UserRole::Client).unwrap();
        assert_eq!(json, "\"CLIENT\"");
    }
}

//! Authenticated caller identity.

use serde::{Deserialize, Serialize};

use consulthub_core::types::UserId;
use consulthub_entity::user::UserRole;

/// Who is on the other end of a request or connection.
///
/// Established once from a verified token and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: UserId,
    pub role: UserRole,
}

impl Identity {
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_consultant(&self) -> bool {
        self.role.is_consultant()
    }
}

//! Room entity model.

use consulthub_core::types::{RoomCode, RoomId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A topic room consultants make themselves available in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub code: RoomCode,
    pub name: String,
    pub is_active: bool,
}

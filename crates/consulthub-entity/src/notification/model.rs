//! Notification entity model.

use chrono::{DateTime, Utc};
use consulthub_core::types::{NotificationId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Category of a stored notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    SessionRequest,
    SessionUpdate,
    ChatMessage,
    System,
}

/// A notification delivered to a user and kept until read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link_url: Option<String>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_unread(&self) -> bool {
        !self.is_read
    }
}

/// Data required to create a notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let n = Notification {
            id: NotificationId::new(),
            user_id: UserId::new(),
            kind: NotificationKind::SessionRequest,
            title: "Session Accepted".to_string(),
            message: "m".to_string(),
            link_url: Some("/sessions/x".to_string()),
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["type"], "SESSION_REQUEST");
        assert_eq!(value["linkUrl"], "/sessions/x");
        assert_eq!(value["isRead"], false);
    }
}

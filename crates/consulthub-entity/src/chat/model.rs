//! Chat message entity model.

use chrono::{DateTime, Utc};
use consulthub_core::types::{ChatMessageId, SessionId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::user::UserRole;

/// Content kind of a chat message. Attachments are referenced by URL in
/// the message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "chat_message_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    File,
    System,
}

/// One line of a session's chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: ChatMessageId,
    pub session_id: SessionId,
    pub sender_id: UserId,
    pub sender_role: UserRole,
    pub message: String,
    pub message_type: MessageType,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Data required to append a message to a session log.
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub session_id: SessionId,
    pub sender_id: UserId,
    pub sender_role: UserRole,
    pub message: String,
    pub message_type: MessageType,
}

//! Chat message repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use consulthub_core::error::{AppError, ErrorKind};
use consulthub_core::result::AppResult;
use consulthub_core::types::{ChatMessageId, SessionId, UserId};
use consulthub_entity::chat::{ChatMessage, NewChatMessage};

use crate::store::ChatStore;

#[derive(Debug, Clone)]
pub struct ChatRepository {
    pool: PgPool,
}

impl ChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for ChatRepository {
    async fn append(&self, message: NewChatMessage) -> AppResult<ChatMessage> {
        sqlx::query_as::<_, ChatMessage>(
            "INSERT INTO chat_messages (id, session_id, sender_id, sender_role, message, message_type) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(ChatMessageId::new())
        .bind(message.session_id)
        .bind(message.sender_id)
        .bind(message.sender_role)
        .bind(&message.message)
        .bind(message.message_type)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store chat message", e))
    }

    async fn mark_read(
        &self,
        session_id: SessionId,
        reader: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE chat_messages SET read_at = $3 \
             WHERE session_id = $1 AND sender_id <> $2 AND read_at IS NULL",
        )
        .bind(session_id)
        .bind(reader)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark messages read", e))?;
        Ok(result.rows_affected())
    }

    async fn list_for_session(&self, session_id: SessionId) -> AppResult<Vec<ChatMessage>> {
        sqlx::query_as::<_, ChatMessage>(
            "SELECT * FROM chat_messages WHERE session_id = $1 ORDER BY sent_at ASC, id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list chat messages", e))
    }
}

//! Consultant presence repository.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use consulthub_core::error::{AppError, ErrorKind};
use consulthub_core::result::AppResult;
use consulthub_core::types::{ConsultantId, RoomCode, UserId};
use consulthub_entity::consultant::ConsultantPresence;

use crate::store::PresenceStore;

const SELECT_PRESENCE: &str = "SELECT id, user_id, display_name, avatar_url, is_available, current_room \
     FROM consultants";

/// Reads and writes the availability columns of `consultants`.
#[derive(Debug, Clone)]
pub struct ConsultantRepository {
    pool: PgPool,
}

impl ConsultantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PresenceStore for ConsultantRepository {
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Option<ConsultantPresence>> {
        sqlx::query_as::<_, ConsultantPresence>(&format!("{SELECT_PRESENCE} WHERE user_id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find consultant", e))
    }

    async fn find_by_id(&self, id: ConsultantId) -> AppResult<Option<ConsultantPresence>> {
        sqlx::query_as::<_, ConsultantPresence>(&format!("{SELECT_PRESENCE} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find consultant", e))
    }

    async fn set_available(&self, id: ConsultantId, room: &RoomCode) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE consultants SET is_available = TRUE, current_room = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(room)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update presence", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_unavailable(&self, id: ConsultantId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE consultants SET is_available = FALSE, current_room = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update presence", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn available_by_room(&self) -> AppResult<HashMap<RoomCode, i64>> {
        let rows: Vec<(RoomCode, i64)> = sqlx::query_as(
            "SELECT current_room, COUNT(*) FROM consultants \
             WHERE is_available AND current_room IS NOT NULL GROUP BY current_room",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count available consultants", e)
        })?;
        Ok(rows.into_iter().collect())
    }
}

//! Room repository.

use async_trait::async_trait;
use sqlx::PgPool;

use consulthub_core::error::{AppError, ErrorKind};
use consulthub_core::result::AppResult;
use consulthub_core::types::{RoomCode, RoomId};
use consulthub_entity::room::Room;

use crate::store::RoomStore;

#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: PgPool,
}

impl RoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomStore for RoomRepository {
    async fn find_by_id(&self, id: RoomId) -> AppResult<Option<Room>> {
        sqlx::query_as::<_, Room>("SELECT id, code, name, is_active FROM rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find room", e))
    }

    async fn find_by_code(&self, code: &RoomCode) -> AppResult<Option<Room>> {
        sqlx::query_as::<_, Room>("SELECT id, code, name, is_active FROM rooms WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find room", e))
    }

    async fn list_active(&self) -> AppResult<Vec<Room>> {
        sqlx::query_as::<_, Room>(
            "SELECT id, code, name, is_active FROM rooms WHERE is_active ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list rooms", e))
    }
}

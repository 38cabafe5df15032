//! Session repository.
//!
//! Status transitions are single `UPDATE ... WHERE status = $expected`
//! statements; PostgreSQL row locking serializes concurrent claims and the
//! losers match zero rows.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use sqlx::PgPool;

use consulthub_core::error::{AppError, ErrorKind};
use consulthub_core::result::AppResult;
use consulthub_core::types::{ConsultantId, SessionId};
use consulthub_entity::session::{
    CompleteSession, CreateSession, Session, SessionFilter, SessionNumber,
};

use crate::store::SessionStore;

/// Wraps a data-modifying statement that returns `sessions.*` so the row
/// comes back with its room code.
fn with_room_code(statement: &str) -> String {
    format!(
        "WITH s AS ({statement}) \
         SELECT s.*, r.code AS room_code FROM s JOIN rooms r ON r.id = s.room_id"
    )
}

/// `WHERE` clause of a [`SessionFilter`]; `NULL` parameters match everything.
const FILTER_CLAUSE: &str = "($1::uuid IS NULL OR s.client_id = $1) \
     AND ($2::uuid IS NULL OR s.consultant_id = $2) \
     AND ($3::uuid IS NULL OR s.room_id = $3) \
     AND ($4::session_status IS NULL OR s.status = $4)";

#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn find_by_id(&self, id: SessionId) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT s.*, r.code AS room_code FROM sessions s \
             JOIN rooms r ON r.id = s.room_id WHERE s.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    async fn list(
        &self,
        filter: &SessionFilter,
        offset: u64,
        limit: u32,
    ) -> AppResult<(Vec<Session>, i64)> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT s.*, r.code AS room_code FROM sessions s \
             JOIN rooms r ON r.id = s.room_id WHERE {FILTER_CLAUSE} \
             ORDER BY s.created_at DESC LIMIT $5 OFFSET $6"
        ))
        .bind(filter.client_id)
        .bind(filter.consultant_id)
        .bind(filter.room_id)
        .bind(filter.status)
        .bind(i64::from(limit))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list sessions", e))?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM sessions s WHERE {FILTER_CLAUSE}"
        ))
        .bind(filter.client_id)
        .bind(filter.consultant_id)
        .bind(filter.room_id)
        .bind(filter.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count sessions", e))?;

        Ok((sessions, total))
    }

    async fn create(&self, input: CreateSession) -> AppResult<Session> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let year = Utc::now().year();
        let sequence: i64 = sqlx::query_scalar(
            "INSERT INTO session_counters (year, last_value) VALUES ($1, 1) \
             ON CONFLICT (year) DO UPDATE SET last_value = session_counters.last_value + 1 \
             RETURNING last_value",
        )
        .bind(year)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to allocate session number", e)
        })?;
        let number = SessionNumber::new(year, sequence);

        let session = sqlx::query_as::<_, Session>(&with_room_code(
            "INSERT INTO sessions (id, session_number, client_id, consultant_id, room_id, \
             status, problem_description) \
             VALUES ($1, $2, $3, $4, $5, 'PENDING', $6) RETURNING *",
        ))
        .bind(SessionId::new())
        .bind(number.to_string())
        .bind(input.client_id)
        .bind(input.consultant_id)
        .bind(input.room_id)
        .bind(&input.problem_description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit session", e)
        })?;
        Ok(session)
    }

    async fn claim(
        &self,
        id: SessionId,
        consultant: ConsultantId,
        started_at: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>(&with_room_code(
            "UPDATE sessions SET status = 'ACTIVE', consultant_id = $2, started_at = $3, \
             updated_at = NOW() WHERE id = $1 AND status = 'PENDING' RETURNING *",
        ))
        .bind(id)
        .bind(consultant)
        .bind(started_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim session", e))
    }

    async fn complete(&self, id: SessionId, data: CompleteSession) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>(&with_room_code(
            "UPDATE sessions SET status = 'COMPLETED', ended_at = $2, duration_minutes = $3, \
             solution_summary = $4, consultant_notes = $5, updated_at = NOW() \
             WHERE id = $1 AND status = 'ACTIVE' RETURNING *",
        ))
        .bind(id)
        .bind(data.ended_at)
        .bind(data.duration_minutes)
        .bind(data.solution_summary)
        .bind(data.consultant_notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete session", e))
    }

    async fn rate(
        &self,
        id: SessionId,
        rating: i16,
        feedback: Option<String>,
    ) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>(&with_room_code(
            "UPDATE sessions SET rating = $2, feedback = $3, updated_at = NOW() \
             WHERE id = $1 AND status = 'COMPLETED' RETURNING *",
        ))
        .bind(id)
        .bind(rating)
        .bind(feedback)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rate session", e))
    }
}

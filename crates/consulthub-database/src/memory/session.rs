use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};

use consulthub_core::error::AppError;
use consulthub_core::result::AppResult;
use consulthub_core::types::{ConsultantId, SessionId};
use consulthub_entity::session::{
    CompleteSession, CreateSession, Session, SessionFilter, SessionNumber, SessionStatus,
};

use super::MemoryStore;
use crate::store::SessionStore;

impl MemoryStore {
    fn next_session_number(&self, year: i32) -> SessionNumber {
        let mut counter = self.session_counters.entry(year).or_insert(0);
        *counter += 1;
        SessionNumber::new(year, *counter)
    }

    /// Apply `update` only while the session is in `expected`.
    fn transition(
        &self,
        id: SessionId,
        expected: SessionStatus,
        update: impl FnOnce(&mut Session),
    ) -> Option<Session> {
        let mut session = self.sessions.get_mut(&id)?;
        if session.status != expected {
            return None;
        }
        update(session.value_mut());
        Some(session.value().clone())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_by_id(&self, id: SessionId) -> AppResult<Option<Session>> {
        Ok(self.sessions.get(&id).map(|e| e.value().clone()))
    }

    async fn list(
        &self,
        filter: &SessionFilter,
        offset: u64,
        limit: u32,
    ) -> AppResult<(Vec<Session>, i64)> {
        let mut matching: Vec<Session> = self
            .sessions
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        let page = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn create(&self, input: CreateSession) -> AppResult<Session> {
        let room = self
            .rooms
            .get(&input.room_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| AppError::not_found("Room not found"))?;
        let now = Utc::now();
        let number = self.next_session_number(now.year());
        let session = Session {
            id: SessionId::new(),
            session_number: number.to_string(),
            client_id: input.client_id,
            consultant_id: input.consultant_id,
            room_id: room.id,
            room_code: room.code,
            status: SessionStatus::Pending,
            problem_description: input.problem_description,
            created_at: now,
            started_at: None,
            ended_at: None,
            duration_minutes: None,
            solution_summary: None,
            consultant_notes: None,
            rating: None,
            feedback: None,
        };
        self.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn claim(
        &self,
        id: SessionId,
        consultant: ConsultantId,
        started_at: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        Ok(self.transition(id, SessionStatus::Pending, |s| {
            s.status = SessionStatus::Active;
            s.consultant_id = Some(consultant);
            s.started_at = Some(started_at);
        }))
    }

    async fn complete(&self, id: SessionId, data: CompleteSession) -> AppResult<Option<Session>> {
        Ok(self.transition(id, SessionStatus::Active, |s| {
            s.status = SessionStatus::Completed;
            s.ended_at = Some(data.ended_at);
            s.duration_minutes = Some(data.duration_minutes);
            s.solution_summary = data.solution_summary;
            s.consultant_notes = data.consultant_notes;
        }))
    }

    async fn rate(
        &self,
        id: SessionId,
        rating: i16,
        feedback: Option<String>,
    ) -> AppResult<Option<Session>> {
        Ok(self.transition(id, SessionStatus::Completed, |s| {
            s.rating = Some(rating);
            s.feedback = feedback;
        }))
    }
}

//! Session lifecycle outside the claim: create, view, end, rate.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info};

use consulthub_auth::Identity;
use consulthub_core::error::AppError;
use consulthub_core::result::AppResult;
use consulthub_core::types::{ConsultantId, RoomId, SessionId};
use consulthub_database::{PresenceStore, RoomStore, SessionStore};
use consulthub_entity::session::{
    CompleteSession, CreateSession, Session, SessionFilter, SessionStatus,
};

use crate::channel::Channel;
use crate::fanout::ChannelFanout;
use crate::message::OutboundEvent;
use crate::message::types::{NewRequest, StatusChanged};

use super::access::SessionAccess;

/// Minimum length of a problem description, in characters.
pub const MIN_PROBLEM_LENGTH: usize = 10;

/// A client's help request.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub room_id: RoomId,
    /// A specific consultant the client asked for.
    pub consultant_id: Option<ConsultantId>,
    pub problem_description: String,
}

/// Wrap-up notes recorded when a session ends.
#[derive(Debug, Clone, Default)]
pub struct EndSession {
    pub solution_summary: Option<String>,
    pub consultant_notes: Option<String>,
}

/// Largest page a listing returns.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Paging and status filter for [`SessionLifecycle::list`].
#[derive(Debug, Clone, Copy)]
pub struct SessionQuery {
    pub status: Option<SessionStatus>,
    /// 1-based.
    pub page: u32,
    pub limit: u32,
}

impl Default for SessionQuery {
    fn default() -> Self {
        Self {
            status: None,
            page: 1,
            limit: 20,
        }
    }
}

/// One page of a session listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPage {
    pub sessions: Vec<Session>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

#[derive(Debug)]
pub struct SessionLifecycle {
    sessions: Arc<dyn SessionStore>,
    presence: Arc<dyn PresenceStore>,
    rooms: Arc<dyn RoomStore>,
    fanout: Arc<ChannelFanout>,
    access: SessionAccess,
}

impl SessionLifecycle {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        presence: Arc<dyn PresenceStore>,
        rooms: Arc<dyn RoomStore>,
        fanout: Arc<ChannelFanout>,
    ) -> Self {
        Self {
            access: SessionAccess::new(presence.clone()),
            sessions,
            presence,
            rooms,
            fanout,
        }
    }

    /// Open a PENDING session and post it to the room's queue.
    pub async fn create(&self, identity: Identity, input: NewSession) -> AppResult<Session> {
        if !identity.role.is_client() {
            return Err(AppError::forbidden("Only clients can request sessions"));
        }
        let problem = input.problem_description.trim();
        if problem.chars().count() < MIN_PROBLEM_LENGTH {
            return Err(AppError::validation(format!(
                "Problem description must be at least {MIN_PROBLEM_LENGTH} characters"
            )));
        }

        let room = self
            .rooms
            .find_by_id(input.room_id)
            .await?
            .filter(|r| r.is_active)
            .ok_or_else(|| AppError::not_found("Room not found or inactive"))?;

        if let Some(consultant_id) = input.consultant_id {
            let consultant = self
                .presence
                .find_by_id(consultant_id)
                .await?
                .ok_or_else(|| AppError::not_found("Consultant not found"))?;
            if !consultant.state().is_available() {
                return Err(AppError::unavailable("Consultant is not available"));
            }
        }

        let session = self
            .sessions
            .create(CreateSession {
                client_id: identity.user_id,
                room_id: room.id,
                consultant_id: input.consultant_id,
                problem_description: problem.to_string(),
            })
            .await?;

        info!(
            session_id = %session.id,
            session_number = %session.session_number,
            room = %session.room_code,
            client_id = %session.client_id,
            "Session requested"
        );

        let event = OutboundEvent::SessionNewRequest(NewRequest::from(&session));
        if let Err(e) = self
            .fanout
            .emit(&Channel::Room(session.room_code.clone()), &event)
            .await
        {
            error!(session_id = %session.id, error = %e, "Failed to post session to room");
        }
        Ok(session)
    }

    /// Sessions visible to the caller, newest first.
    ///
    /// A consultant asking for PENDING sessions while available gets their
    /// room's queue; otherwise consultants get the sessions assigned to
    /// them. Clients get their own sessions and admins get everything.
    pub async fn list(&self, identity: Identity, query: SessionQuery) -> AppResult<SessionPage> {
        let page = query.page.max(1);
        let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
        let mut filter = SessionFilter {
            status: query.status,
            ..SessionFilter::default()
        };

        if identity.role.is_client() {
            filter.client_id = Some(identity.user_id);
        } else if identity.is_consultant() {
            let consultant = self
                .presence
                .find_by_user(identity.user_id)
                .await?
                .ok_or_else(|| AppError::not_found("Consultant profile not found"))?;
            match consultant.state().room() {
                Some(code) if query.status == Some(SessionStatus::Pending) => {
                    if let Some(room) = self.rooms.find_by_code(code).await? {
                        filter.room_id = Some(room.id);
                    }
                }
                _ => filter.consultant_id = Some(consultant.id),
            }
        }

        let offset = u64::from(page - 1) * u64::from(limit);
        let (sessions, total) = self.sessions.list(&filter, offset, limit).await?;
        debug!(
            user_id = %identity.user_id,
            total,
            page,
            "Listed sessions"
        );
        Ok(SessionPage {
            sessions,
            total,
            page,
            limit,
            total_pages: (total + i64::from(limit) - 1) / i64::from(limit),
        })
    }

    /// Fetch a session the caller may see: participants, admins, and
    /// consultants currently in the room of a PENDING session.
    pub async fn get(&self, identity: Identity, session_id: SessionId) -> AppResult<Session> {
        let session = self.find(session_id).await?;
        if self.access.participant(&session, identity).await?.is_some() {
            return Ok(session);
        }
        if identity.is_consultant() && session.is_pending() {
            let in_room = self
                .presence
                .find_by_user(identity.user_id)
                .await?
                .is_some_and(|c| c.state().room() == Some(&session.room_code));
            if in_room {
                return Ok(session);
            }
        }
        Err(AppError::forbidden("You do not have access to this session"))
    }

    /// ACTIVE → COMPLETED by the assigned consultant or an admin.
    pub async fn end(
        &self,
        identity: Identity,
        session_id: SessionId,
        input: EndSession,
    ) -> AppResult<Session> {
        let session = self.find(session_id).await?;
        if !session.is_active() {
            return Err(AppError::invalid_state("Session is not active"));
        }
        if !identity.is_admin() {
            let assigned = match self.presence.find_by_user(identity.user_id).await? {
                Some(consultant) => session.is_assigned_to(consultant.id),
                None => false,
            };
            if !assigned {
                return Err(AppError::forbidden(
                    "Only the assigned consultant can end the session",
                ));
            }
        }

        let ended_at = Utc::now();
        let started_at = session.started_at.unwrap_or(ended_at);
        let completed = self
            .sessions
            .complete(
                session_id,
                CompleteSession {
                    ended_at,
                    duration_minutes: Session::elapsed_minutes(started_at, ended_at),
                    solution_summary: input.solution_summary,
                    consultant_notes: input.consultant_notes,
                },
            )
            .await?
            .ok_or_else(|| AppError::invalid_state("Session is not active"))?;

        info!(
            session_id = %completed.id,
            duration_minutes = completed.duration_minutes,
            "Session completed"
        );

        let event = OutboundEvent::SessionStatusChanged(Box::new(StatusChanged {
            session_id: completed.id,
            status: SessionStatus::Completed,
            session: completed.clone(),
            meeting: None,
        }));
        if let Err(e) = self
            .fanout
            .emit(&Channel::Session(completed.id), &event)
            .await
        {
            error!(session_id = %completed.id, error = %e, "Failed to announce completion");
        }
        Ok(completed)
    }

    /// Record the client's 1–5 rating on a COMPLETED session.
    pub async fn rate(
        &self,
        identity: Identity,
        session_id: SessionId,
        rating: i16,
        feedback: Option<String>,
    ) -> AppResult<Session> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::validation("Rating must be between 1 and 5"));
        }
        let session = self.find(session_id).await?;
        if !session.is_client(identity.user_id) {
            return Err(AppError::forbidden("Only the client can rate"));
        }
        if session.status != SessionStatus::Completed {
            return Err(AppError::invalid_state("Session must be completed to rate"));
        }

        let feedback = feedback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        self.sessions
            .rate(session_id, rating, feedback)
            .await?
            .ok_or_else(|| AppError::invalid_state("Session must be completed to rate"))
    }

    async fn find(&self, session_id: SessionId) -> AppResult<Session> {
        self.sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::not_found("Session not found"))
    }
}

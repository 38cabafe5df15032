//! Who may act on a session.

use std::sync::Arc;

use consulthub_auth::Identity;
use consulthub_core::error::AppError;
use consulthub_core::result::AppResult;
use consulthub_database::PresenceStore;
use consulthub_entity::session::Session;

/// How a caller relates to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Participant {
    Client,
    /// The consultant holding the claim.
    Consultant,
    Admin,
}

/// Resolves a caller's [`Participant`] role for a session.
#[derive(Debug, Clone)]
pub struct SessionAccess {
    presence: Arc<dyn PresenceStore>,
}

impl SessionAccess {
    pub fn new(presence: Arc<dyn PresenceStore>) -> Self {
        Self { presence }
    }

    pub async fn participant(
        &self,
        session: &Session,
        identity: Identity,
    ) -> AppResult<Option<Participant>> {
        if session.is_client(identity.user_id) {
            return Ok(Some(Participant::Client));
        }
        if identity.is_consultant() && session.consultant_id.is_some() {
            let assigned = self
                .presence
                .find_by_user(identity.user_id)
                .await?
                .is_some_and(|c| session.is_assigned_to(c.id));
            if assigned {
                return Ok(Some(Participant::Consultant));
            }
        }
        if identity.is_admin() {
            return Ok(Some(Participant::Admin));
        }
        Ok(None)
    }

    /// Like [`participant`](Self::participant) but `Forbidden` for outsiders.
    pub async fn require_participant(
        &self,
        session: &Session,
        identity: Identity,
    ) -> AppResult<Participant> {
        self.participant(session, identity)
            .await?
            .ok_or_else(|| AppError::forbidden("Not authorized to access this session"))
    }
}

//! Session claim arbitration.
//!
//! The PENDING → ACTIVE transition is a single conditional write in the
//! session store; everything here happens only after that write succeeded.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use consulthub_auth::Identity;
use consulthub_core::error::AppError;
use consulthub_core::result::AppResult;
use consulthub_core::traits::{VideoMeeting, VideoProvider};
use consulthub_core::types::{ConnectionId, SessionId};
use consulthub_database::{PresenceStore, RoomStore, SessionStore};
use consulthub_entity::consultant::ConsultantSummary;
use consulthub_entity::session::Session;

use crate::channel::Channel;
use crate::connection::ConnectionRegistry;
use crate::fanout::ChannelFanout;
use crate::message::OutboundEvent;
use crate::message::types::{Accepted, SessionRef, StatusChanged};
use crate::metrics::EngineMetrics;
use crate::notification::{NotificationSink, sink};

use super::access::SessionAccess;

/// Result of an accept attempt.
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    Won(Box<ClaimedSession>),
    /// The session was missing or no longer PENDING.
    Lost,
}

impl ClaimOutcome {
    pub fn is_won(&self) -> bool {
        matches!(self, Self::Won(_))
    }
}

#[derive(Debug, Clone)]
pub struct ClaimedSession {
    pub session: Session,
    pub consultant: ConsultantSummary,
    pub meeting: Option<VideoMeeting>,
}

#[derive(Debug)]
pub struct ClaimArbitrator {
    sessions: Arc<dyn SessionStore>,
    presence: Arc<dyn PresenceStore>,
    rooms: Arc<dyn RoomStore>,
    registry: Arc<ConnectionRegistry>,
    fanout: Arc<ChannelFanout>,
    notifications: Arc<NotificationSink>,
    video: Option<Arc<dyn VideoProvider>>,
    access: SessionAccess,
    metrics: Arc<EngineMetrics>,
}

impl ClaimArbitrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        presence: Arc<dyn PresenceStore>,
        rooms: Arc<dyn RoomStore>,
        registry: Arc<ConnectionRegistry>,
        fanout: Arc<ChannelFanout>,
        notifications: Arc<NotificationSink>,
        video: Option<Arc<dyn VideoProvider>>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            access: SessionAccess::new(presence.clone()),
            sessions,
            presence,
            rooms,
            registry,
            fanout,
            notifications,
            video,
            metrics,
        }
    }

    /// Try to claim `session_id` for the consultant behind `conn_id`.
    ///
    /// Losing the race is `Ok(ClaimOutcome::Lost)`, not an error.
    pub async fn accept(
        &self,
        conn_id: ConnectionId,
        identity: Identity,
        session_id: SessionId,
    ) -> AppResult<ClaimOutcome> {
        if !identity.is_consultant() {
            return Err(AppError::forbidden("Only consultants can accept sessions"));
        }
        let consultant = self
            .presence
            .find_by_user(identity.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Consultant profile not found"))?;

        let Some(session) = self
            .sessions
            .claim(session_id, consultant.id, Utc::now())
            .await?
        else {
            EngineMetrics::inc(&self.metrics.claims_lost);
            info!(
                session_id = %session_id,
                consultant_id = %consultant.id,
                "Claim lost"
            );
            return Ok(ClaimOutcome::Lost);
        };

        EngineMetrics::inc(&self.metrics.claims_won);
        info!(
            session_id = %session.id,
            session_number = %session.session_number,
            consultant_id = %consultant.id,
            "Claim won"
        );

        let claimed = ClaimedSession {
            meeting: self.provision_meeting(&session).await,
            consultant: consultant.summary(),
            session,
        };
        if let Err(e) = self.announce(conn_id, &claimed).await {
            error!(session_id = %session_id, error = %e, "Failed to announce claimed session");
        }

        let notice = sink::session_accepted(&claimed.session, &claimed.consultant.name);
        if let Err(e) = self.notifications.notify(notice).await {
            error!(session_id = %session_id, error = %e, "Failed to notify client of acceptance");
        }

        Ok(ClaimOutcome::Won(Box::new(claimed)))
    }

    async fn announce(&self, conn_id: ConnectionId, claimed: &ClaimedSession) -> AppResult<()> {
        let session = &claimed.session;
        let session_channel = Channel::Session(session.id);
        let client_channel = Channel::User(session.client_id);

        self.registry.add_to_channel(conn_id, &session_channel);
        self.fanout
            .join_members(&client_channel, &session_channel)
            .await;

        self.fanout
            .emit(
                &session_channel,
                &OutboundEvent::SessionStatusChanged(Box::new(StatusChanged {
                    session_id: session.id,
                    status: session.status,
                    session: session.clone(),
                    meeting: claimed.meeting.clone(),
                })),
            )
            .await?;
        self.fanout
            .emit(
                &client_channel,
                &OutboundEvent::SessionAccepted(Accepted {
                    session_id: session.id,
                    consultant: claimed.consultant.clone(),
                    meeting: claimed.meeting.clone(),
                }),
            )
            .await?;
        self.fanout
            .emit(
                &Channel::Room(session.room_code.clone()),
                &OutboundEvent::SessionRemovedFromQueue(SessionRef {
                    session_id: session.id,
                }),
            )
            .await?;
        Ok(())
    }

    /// Best effort; a failed meeting never undoes the claim.
    async fn provision_meeting(&self, session: &Session) -> Option<VideoMeeting> {
        let video = self.video.as_ref()?;
        let room_name = match self.rooms.find_by_id(session.room_id).await {
            Ok(Some(room)) => room.name,
            _ => session.room_code.to_string(),
        };
        let topic = format!("{room_name} - {}", session.session_number);

        match video.create_meeting(&topic).await {
            Ok(meeting) => {
                info!(
                    session_id = %session.id,
                    provider = video.name(),
                    meeting_id = %meeting.meeting_id,
                    "Meeting created"
                );
                Some(meeting)
            }
            Err(e) => {
                warn!(
                    session_id = %session.id,
                    provider = video.name(),
                    error = %e,
                    "Meeting provisioning failed"
                );
                None
            }
        }
    }

    /// Subscribe a participant's connection to `session:<id>`. Idempotent.
    pub async fn join_session(
        &self,
        conn_id: ConnectionId,
        identity: Identity,
        session_id: SessionId,
    ) -> AppResult<()> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::not_found("Session not found"))?;
        self.access
            .participant(&session, identity)
            .await?
            .ok_or_else(|| AppError::forbidden("Not authorized to join this session"))?;

        self.registry
            .add_to_channel(conn_id, &Channel::Session(session_id));
        self.fanout
            .reply(conn_id, &OutboundEvent::SessionJoined(SessionRef { session_id }));
        Ok(())
    }
}

//! Chat relay: append to the session log, then fan out to participants.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use consulthub_auth::Identity;
use consulthub_core::error::AppError;
use consulthub_core::result::AppResult;
use consulthub_core::types::SessionId;
use consulthub_database::{ChatStore, SessionStore};
use consulthub_entity::chat::{ChatMessage, MessageType, NewChatMessage};
use consulthub_entity::session::Session;

use crate::channel::Channel;
use crate::fanout::ChannelFanout;
use crate::message::OutboundEvent;
use crate::message::types::{ChatAuthor, ChatLine, MessagesRead};
use crate::message::validator::validate_chat_text;
use crate::session::SessionAccess;

#[derive(Debug)]
pub struct ChatRelay {
    chat: Arc<dyn ChatStore>,
    sessions: Arc<dyn SessionStore>,
    access: SessionAccess,
    fanout: Arc<ChannelFanout>,
    max_length: usize,
}

impl ChatRelay {
    pub fn new(
        chat: Arc<dyn ChatStore>,
        sessions: Arc<dyn SessionStore>,
        access: SessionAccess,
        fanout: Arc<ChannelFanout>,
        max_length: usize,
    ) -> Self {
        Self {
            chat,
            sessions,
            access,
            fanout,
            max_length,
        }
    }

    /// Store a message from `sender` and broadcast `chat:new-message`.
    pub async fn send(
        &self,
        sender: Identity,
        session_id: SessionId,
        text: &str,
        message_type: Option<MessageType>,
    ) -> AppResult<ChatMessage> {
        let session = self.active_session(session_id).await?;
        self.access.require_participant(&session, sender).await?;
        let text = validate_chat_text(text, self.max_length)?;

        let stored = self
            .chat
            .append(NewChatMessage {
                session_id,
                sender_id: sender.user_id,
                sender_role: sender.role,
                message: text.to_string(),
                message_type: message_type.unwrap_or_default(),
            })
            .await?;

        let line = ChatLine {
            id: stored.id,
            session_id,
            message: stored.message.clone(),
            message_type: stored.message_type,
            sent_at: stored.sent_at,
            user: ChatAuthor {
                id: stored.sender_id,
                role: stored.sender_role,
            },
        };
        self.fanout
            .emit(&Channel::Session(session_id), &OutboundEvent::ChatNewMessage(line))
            .await?;
        debug!(session_id = %session_id, message_id = %stored.id, "Chat message relayed");
        Ok(stored)
    }

    /// Mark everything the other side wrote as read by `reader`.
    pub async fn mark_read(&self, reader: Identity, session_id: SessionId) -> AppResult<u64> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::not_found("Session not found"))?;
        self.access.require_participant(&session, reader).await?;

        let marked = self
            .chat
            .mark_read(session_id, reader.user_id, Utc::now())
            .await?;
        self.fanout
            .emit(
                &Channel::Session(session_id),
                &OutboundEvent::ChatMessagesRead(MessagesRead {
                    session_id,
                    read_by: reader.user_id,
                }),
            )
            .await?;
        Ok(marked)
    }

    /// The chat log, for participants.
    pub async fn history(
        &self,
        reader: Identity,
        session_id: SessionId,
    ) -> AppResult<Vec<ChatMessage>> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::not_found("Session not found"))?;
        self.access.require_participant(&session, reader).await?;
        self.chat.list_for_session(session_id).await
    }

    async fn active_session(&self, session_id: SessionId) -> AppResult<Session> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::not_found("Session not found"))?;
        if !session.is_active() {
            return Err(AppError::invalid_state("Session is not active"));
        }
        Ok(session)
    }
}

//! Inbound and outbound WebSocket event definitions.
//!
//! Every frame is a JSON object `{"event": "<name>", "data": {...}}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use consulthub_core::error::AppError;
use consulthub_core::traits::VideoMeeting;
use consulthub_core::types::{ChatMessageId, ConsultantId, RoomCode, SessionId, UserId};
use consulthub_entity::chat::MessageType;
use consulthub_entity::consultant::ConsultantSummary;
use consulthub_entity::notification::Notification;
use consulthub_entity::session::{Session, SessionStatus};
use consulthub_entity::user::UserRole;

/// Events a client may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `consultant:join-room`
    JoinRoom { room_code: RoomCode },
    /// `consultant:go-offline`
    GoOffline,
    /// `session:accept`
    AcceptSession { session_id: SessionId },
    /// `session:join`
    JoinSession { session_id: SessionId },
    /// `chat:message`
    ChatMessage {
        session_id: SessionId,
        message: String,
        message_type: Option<MessageType>,
    },
    /// `chat:mark-read`
    MarkRead { session_id: SessionId },
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomCodeData {
    room_code: RoomCode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionIdData {
    session_id: SessionId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatMessageData {
    session_id: SessionId,
    message: String,
    #[serde(default)]
    message_type: Option<MessageType>,
}

impl InboundEvent {
    /// Parse a raw text frame.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let envelope: RawEnvelope = serde_json::from_str(raw)
            .map_err(|e| AppError::validation(format!("Malformed frame: {e}")))?;

        let event = match envelope.event.as_str() {
            "consultant:join-room" => {
                let data: RoomCodeData = payload(&envelope)?;
                Self::JoinRoom {
                    room_code: data.room_code,
                }
            }
            "consultant:go-offline" => Self::GoOffline,
            "session:accept" => {
                let data: SessionIdData = payload(&envelope)?;
                Self::AcceptSession {
                    session_id: data.session_id,
                }
            }
            "session:join" => {
                let data: SessionIdData = payload(&envelope)?;
                Self::JoinSession {
                    session_id: data.session_id,
                }
            }
            "chat:message" => {
                let data: ChatMessageData = payload(&envelope)?;
                Self::ChatMessage {
                    session_id: data.session_id,
                    message: data.message,
                    message_type: data.message_type,
                }
            }
            "chat:mark-read" => {
                let data: SessionIdData = payload(&envelope)?;
                Self::MarkRead {
                    session_id: data.session_id,
                }
            }
            other => return Err(AppError::validation(format!("Unknown event: {other}"))),
        };

        Ok(event)
    }

    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "consultant:join-room",
            Self::GoOffline => "consultant:go-offline",
            Self::AcceptSession { .. } => "session:accept",
            Self::JoinSession { .. } => "session:join",
            Self::ChatMessage { .. } => "chat:message",
            Self::MarkRead { .. } => "chat:mark-read",
        }
    }
}

fn payload<T: serde::de::DeserializeOwned>(envelope: &RawEnvelope) -> Result<T, AppError> {
    T::deserialize(&envelope.data).map_err(|e| {
        AppError::validation(format!("Invalid payload for {}: {e}", envelope.event))
    })
}

/// Events the server sends.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum OutboundEvent {
    #[serde(rename = "consultant:status-changed")]
    ConsultantStatusChanged(PresenceChanged),
    #[serde(rename = "session:new-request")]
    SessionNewRequest(NewRequest),
    #[serde(rename = "session:status-changed")]
    SessionStatusChanged(Box<StatusChanged>),
    #[serde(rename = "session:accepted")]
    SessionAccepted(Accepted),
    #[serde(rename = "session:removed-from-queue")]
    SessionRemovedFromQueue(SessionRef),
    #[serde(rename = "session:joined")]
    SessionJoined(SessionRef),
    #[serde(rename = "chat:new-message")]
    ChatNewMessage(ChatLine),
    #[serde(rename = "chat:messages-read")]
    ChatMessagesRead(MessagesRead),
    #[serde(rename = "notification:new")]
    NotificationNew(Notification),
    #[serde(rename = "error")]
    Error(ErrorPayload),
}

impl OutboundEvent {
    pub fn to_frame(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn error(err: &AppError) -> Self {
        Self::Error(ErrorPayload {
            code: err.kind.code().to_string(),
            message: err.message.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceChanged {
    pub consultant_id: ConsultantId,
    pub user_id: UserId,
    pub is_available: bool,
    pub current_room: Option<RoomCode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
    pub session_id: SessionId,
    pub session_number: String,
    pub client_id: UserId,
    pub problem: String,
    pub room: RoomCode,
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for NewRequest {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            session_number: session.session_number.clone(),
            client_id: session.client_id,
            problem: session.problem_description.clone(),
            room: session.room_code.clone(),
            created_at: session.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChanged {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub session: Session,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting: Option<VideoMeeting>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accepted {
    pub session_id: SessionId,
    pub consultant: ConsultantSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting: Option<VideoMeeting>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRef {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLine {
    pub id: ChatMessageId,
    pub session_id: SessionId,
    pub message: String,
    pub message_type: MessageType,
    pub sent_at: DateTime<Utc>,
    pub user: ChatAuthor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAuthor {
    pub id: UserId,
    pub role: UserRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesRead {
    pub session_id: SessionId,
    pub read_by: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use consulthub_core::ErrorKind;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_join_room() {
        let event =
            InboundEvent::parse(r#"{"event":"consultant:join-room","data":{"roomCode":"SALES"}}"#)
                .unwrap();
        assert_eq!(
            event,
            InboundEvent::JoinRoom {
                room_code: RoomCode::new("SALES").unwrap()
            }
        );
    }

    #[test]
    fn test_parse_go_offline_without_data() {
        assert_eq!(
            InboundEvent::parse(r#"{"event":"consultant:go-offline"}"#).unwrap(),
            InboundEvent::GoOffline
        );
        assert_eq!(
            InboundEvent::parse(r#"{"event":"consultant:go-offline","data":{}}"#).unwrap(),
            InboundEvent::GoOffline
        );
    }

    #[test]
    fn test_parse_chat_message_type_optional() {
        let id = SessionId::new();
        let raw = json!({"event": "chat:message", "data": {"sessionId": id, "message": "hi"}});
        let event = InboundEvent::parse(&raw.to_string()).unwrap();
        assert_eq!(
            event,
            InboundEvent::ChatMessage {
                session_id: id,
                message: "hi".to_string(),
                message_type: None,
            }
        );

        let raw = json!({"event": "chat:message",
            "data": {"sessionId": id, "message": "x", "messageType": "IMAGE"}});
        match InboundEvent::parse(&raw.to_string()).unwrap() {
            InboundEvent::ChatMessage { message_type, .. } => {
                assert_eq!(message_type, Some(MessageType::Image))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejections() {
        let unknown = InboundEvent::parse(r#"{"event":"files:upload","data":{}}"#).unwrap_err();
        assert_eq!(unknown.kind, ErrorKind::Validation);
        assert!(unknown.message.contains("files:upload"));

        let bad_id =
            InboundEvent::parse(r#"{"event":"session:accept","data":{"sessionId":"nope"}}"#)
                .unwrap_err();
        assert_eq!(bad_id.kind, ErrorKind::Validation);

        let bad_room =
            InboundEvent::parse(r#"{"event":"consultant:join-room","data":{"roomCode":"a b"}}"#)
                .unwrap_err();
        assert_eq!(bad_room.kind, ErrorKind::Validation);

        assert!(InboundEvent::parse("not json").is_err());
    }

    #[test]
    fn test_outbound_envelope_shape() {
        let consultant_id = ConsultantId::new();
        let user_id = UserId::new();
        let event = OutboundEvent::ConsultantStatusChanged(PresenceChanged {
            consultant_id,
            user_id,
            is_available: false,
            current_room: None,
        });
        let value: Value = serde_json::from_str(&event.to_frame().unwrap()).unwrap();
        assert_eq!(value["event"], "consultant:status-changed");
        assert_eq!(value["data"]["consultantId"], json!(consultant_id));
        assert_eq!(value["data"]["isAvailable"], false);
        assert!(value["data"]["currentRoom"].is_null());
    }

    #[test]
    fn test_error_event_carries_code() {
        let err = AppError::unavailable("Session not available for acceptance");
        let value = serde_json::to_value(OutboundEvent::error(&err)).unwrap();
        assert_eq!(
            value,
            json!({"event": "error", "data": {
                "code": "UNAVAILABLE",
                "message": "Session not available for acceptance"
            }})
        );
    }
}

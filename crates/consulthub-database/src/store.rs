//! Store traits consumed by the coordination core.
//!
//! Every write that decides a race is a single conditional statement in
//! the implementation; callers never read-then-write to change a session's
//! status.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use consulthub_core::result::AppResult;
use consulthub_core::types::{
    ConsultantId, NotificationId, RoomCode, RoomId, SessionId, UserId,
};
use consulthub_entity::chat::{ChatMessage, NewChatMessage};
use consulthub_entity::consultant::ConsultantPresence;
use consulthub_entity::notification::{NewNotification, Notification};
use consulthub_entity::room::Room;
use consulthub_entity::session::{CompleteSession, CreateSession, Session, SessionFilter};

use crate::memory::MemoryStore;
use crate::repositories::{
    ChatRepository, ConsultantRepository, NotificationRepository, RoomRepository,
    SessionRepository,
};

/// Consultant availability records.
#[async_trait]
pub trait PresenceStore: Send + Sync + Debug + 'static {
    /// The consultant profile owned by `user_id`, if any.
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Option<ConsultantPresence>>;

    async fn find_by_id(&self, id: ConsultantId) -> AppResult<Option<ConsultantPresence>>;

    /// Mark available in `room`. Returns false when the consultant does not exist.
    async fn set_available(&self, id: ConsultantId, room: &RoomCode) -> AppResult<bool>;

    /// Mark unavailable and clear the room. Returns false when the consultant does not exist.
    async fn set_unavailable(&self, id: ConsultantId) -> AppResult<bool>;

    /// Number of available consultants per room. Rooms with none are absent.
    async fn available_by_room(&self) -> AppResult<HashMap<RoomCode, i64>>;
}

/// Consulting session records.
#[async_trait]
pub trait SessionStore: Send + Sync + Debug + 'static {
    async fn find_by_id(&self, id: SessionId) -> AppResult<Option<Session>>;

    /// One page of matching sessions, newest first, plus the total match count.
    async fn list(
        &self,
        filter: &SessionFilter,
        offset: u64,
        limit: u32,
    ) -> AppResult<(Vec<Session>, i64)>;

    /// Insert a PENDING session with the next number for the current year.
    async fn create(&self, input: CreateSession) -> AppResult<Session>;

    /// Atomically move a PENDING session to ACTIVE under `consultant`.
    ///
    /// Returns `None` when the session is missing or no longer PENDING;
    /// of any number of concurrent callers at most one gets `Some`.
    async fn claim(
        &self,
        id: SessionId,
        consultant: ConsultantId,
        started_at: DateTime<Utc>,
    ) -> AppResult<Option<Session>>;

    /// Atomically move an ACTIVE session to COMPLETED. `None` if it was not ACTIVE.
    async fn complete(&self, id: SessionId, data: CompleteSession) -> AppResult<Option<Session>>;

    /// Record the client's rating on a COMPLETED session. `None` if it was not COMPLETED.
    async fn rate(
        &self,
        id: SessionId,
        rating: i16,
        feedback: Option<String>,
    ) -> AppResult<Option<Session>>;
}

/// Topic rooms. Read-only for the core.
#[async_trait]
pub trait RoomStore: Send + Sync + Debug + 'static {
    async fn find_by_id(&self, id: RoomId) -> AppResult<Option<Room>>;

    async fn find_by_code(&self, code: &RoomCode) -> AppResult<Option<Room>>;

    /// Active rooms ordered by code.
    async fn list_active(&self) -> AppResult<Vec<Room>>;
}

/// Per-session chat logs.
#[async_trait]
pub trait ChatStore: Send + Sync + Debug + 'static {
    async fn append(&self, message: NewChatMessage) -> AppResult<ChatMessage>;

    /// Mark every unread message in the session not written by `reader` as read.
    async fn mark_read(
        &self,
        session_id: SessionId,
        reader: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Messages in send order.
    async fn list_for_session(&self, session_id: SessionId) -> AppResult<Vec<ChatMessage>>;
}

/// Durable user notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync + Debug + 'static {
    async fn create(&self, notification: NewNotification) -> AppResult<Notification>;

    /// Newest first, at most `limit`.
    async fn list_for_user(
        &self,
        user_id: UserId,
        unread_only: bool,
        limit: u32,
    ) -> AppResult<Vec<Notification>>;

    async fn count_unread(&self, user_id: UserId) -> AppResult<i64>;

    /// Mark one of `user_id`'s notifications read. False if it is not theirs or missing.
    async fn mark_read(&self, id: NotificationId, user_id: UserId) -> AppResult<bool>;

    async fn mark_all_read(&self, user_id: UserId) -> AppResult<u64>;
}

/// The full set of stores, shared by the realtime engine and HTTP handlers.
#[derive(Debug, Clone)]
pub struct Stores {
    pub presence: Arc<dyn PresenceStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub rooms: Arc<dyn RoomStore>,
    pub chat: Arc<dyn ChatStore>,
    pub notifications: Arc<dyn NotificationStore>,
}

impl Stores {
    /// PostgreSQL-backed stores sharing one pool.
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            presence: Arc::new(ConsultantRepository::new(pool.clone())),
            sessions: Arc::new(SessionRepository::new(pool.clone())),
            rooms: Arc::new(RoomRepository::new(pool.clone())),
            chat: Arc::new(ChatRepository::new(pool.clone())),
            notifications: Arc::new(NotificationRepository::new(pool)),
        }
    }

    /// All stores backed by one in-memory database.
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            presence: store.clone(),
            sessions: store.clone(),
            rooms: store.clone(),
            chat: store.clone(),
            notifications: store,
        }
    }
}

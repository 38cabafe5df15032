//! In-memory store backed by DashMap tables.
//!
//! Used when no database is configured and throughout the test suites.
//! Conditional writes run under the owning shard's write guard, which makes
//! them atomic with respect to each other.

mod chat;
mod notification;
mod presence;
mod room;
mod session;

use dashmap::DashMap;

use consulthub_core::result::AppResult;
use consulthub_core::types::{
    ConsultantId, NotificationId, RoomCode, RoomId, SessionId, UserId,
};
use consulthub_entity::chat::ChatMessage;
use consulthub_entity::consultant::ConsultantPresence;
use consulthub_entity::notification::Notification;
use consulthub_entity::room::Room;
use consulthub_entity::session::Session;

/// Rooms available out of the box, matching the SQL seed.
pub const DEFAULT_ROOMS: &[(&str, &str)] = &[
    ("FINANCE", "Finance & Accounting"),
    ("PRODUCTION", "Production Planning"),
    ("SALES", "Sales & Distribution"),
    ("INVENTORY", "Inventory Management"),
    ("HR", "HR & Payroll"),
    ("TROIA", "TROIA Development"),
    ("GENERAL", "General Support"),
];

/// Every table the core touches, held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    consultants: DashMap<ConsultantId, ConsultantPresence>,
    consultants_by_user: DashMap<UserId, ConsultantId>,
    rooms: DashMap<RoomId, Room>,
    sessions: DashMap<SessionId, Session>,
    session_counters: DashMap<i32, i64>,
    chat: DashMap<SessionId, Vec<ChatMessage>>,
    notifications: DashMap<NotificationId, Notification>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with [`DEFAULT_ROOMS`].
    pub fn seeded() -> AppResult<Self> {
        let store = Self::new();
        for (code, name) in DEFAULT_ROOMS {
            store.insert_room(RoomCode::new(*code)?, name);
        }
        Ok(store)
    }

    /// Add an active room.
    pub fn insert_room(&self, code: RoomCode, name: &str) -> Room {
        let room = Room {
            id: RoomId::new(),
            code,
            name: name.to_string(),
            is_active: true,
        };
        self.rooms.insert(room.id, room.clone());
        room
    }

    /// Deactivate a room so new sessions cannot be opened in it.
    pub fn deactivate_room(&self, id: RoomId) {
        if let Some(mut room) = self.rooms.get_mut(&id) {
            room.is_active = false;
        }
    }

    /// Register a consultant profile for `user_id`, initially offline.
    pub fn insert_consultant(&self, user_id: UserId, display_name: &str) -> ConsultantPresence {
        let record = ConsultantPresence {
            id: ConsultantId::new(),
            user_id,
            display_name: display_name.to_string(),
            avatar_url: None,
            is_available: false,
            current_room: None,
        };
        self.consultants_by_user.insert(user_id, record.id);
        self.consultants.insert(record.id, record.clone());
        record
    }

    /// Number of stored notifications, across all users.
    pub fn notification_count(&self) -> usize {
        self.notifications.len()
    }
}

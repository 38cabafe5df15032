use async_trait::async_trait;

use consulthub_core::result::AppResult;
use consulthub_core::types::{RoomCode, RoomId};
use consulthub_entity::room::Room;

use super::MemoryStore;
use crate::store::RoomStore;

#[async_trait]
impl RoomStore for MemoryStore {
    async fn find_by_id(&self, id: RoomId) -> AppResult<Option<Room>> {
        Ok(self.rooms.get(&id).map(|e| e.value().clone()))
    }

    async fn find_by_code(&self, code: &RoomCode) -> AppResult<Option<Room>> {
        Ok(self
            .rooms
            .iter()
            .find(|e| &e.value().code == code)
            .map(|e| e.value().clone()))
    }

    async fn list_active(&self) -> AppResult<Vec<Room>> {
        let mut rooms: Vec<Room> = self
            .rooms
            .iter()
            .filter(|e| e.value().is_active)
            .map(|e| e.value().clone())
            .collect();
        rooms.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rooms)
    }
}

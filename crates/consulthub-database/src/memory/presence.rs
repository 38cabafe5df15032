use std::collections::HashMap;

use async_trait::async_trait;

use consulthub_core::result::AppResult;
use consulthub_core::types::{ConsultantId, RoomCode, UserId};
use consulthub_entity::consultant::ConsultantPresence;

use super::MemoryStore;
use crate::store::PresenceStore;

#[async_trait]
impl PresenceStore for MemoryStore {
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Option<ConsultantPresence>> {
        let Some(id) = self.consultants_by_user.get(&user_id).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.consultants.get(&id).map(|e| e.value().clone()))
    }

    async fn find_by_id(&self, id: ConsultantId) -> AppResult<Option<ConsultantPresence>> {
        Ok(self.consultants.get(&id).map(|e| e.value().clone()))
    }

    async fn set_available(&self, id: ConsultantId, room: &RoomCode) -> AppResult<bool> {
        Ok(match self.consultants.get_mut(&id) {
            Some(mut record) => {
                record.is_available = true;
                record.current_room = Some(room.clone());
                true
            }
            None => false,
        })
    }

    async fn set_unavailable(&self, id: ConsultantId) -> AppResult<bool> {
        Ok(match self.consultants.get_mut(&id) {
            Some(mut record) => {
                record.is_available = false;
                record.current_room = None;
                true
            }
            None => false,
        })
    }

    async fn available_by_room(&self) -> AppResult<HashMap<RoomCode, i64>> {
        let mut counts = HashMap::new();
        for entry in self.consultants.iter() {
            if let Some(room) = entry.value().state().room() {
                *counts.entry(room.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use consulthub_core::result::AppResult;
use consulthub_core::types::{ChatMessageId, SessionId, UserId};
use consulthub_entity::chat::{ChatMessage, NewChatMessage};

use super::MemoryStore;
use crate::store::ChatStore;

#[async_trait]
impl ChatStore for MemoryStore {
    async fn append(&self, message: NewChatMessage) -> AppResult<ChatMessage> {
        let stored = ChatMessage {
            id: ChatMessageId::new(),
            session_id: message.session_id,
            sender_id: message.sender_id,
            sender_role: message.sender_role,
            message: message.message,
            message_type: message.message_type,
            sent_at: Utc::now(),
            read_at: None,
        };
        self.chat
            .entry(stored.session_id)
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn mark_read(
        &self,
        session_id: SessionId,
        reader: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let Some(mut log) = self.chat.get_mut(&session_id) else {
            return Ok(0);
        };
        let mut marked = 0;
        for message in log
            .iter_mut()
            .filter(|m| m.sender_id != reader && m.read_at.is_none())
        {
            message.read_at = Some(at);
            marked += 1;
        }
        Ok(marked)
    }

    async fn list_for_session(&self, session_id: SessionId) -> AppResult<Vec<ChatMessage>> {
        Ok(self
            .chat
            .get(&session_id)
            .map(|log| log.value().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use consulthub_entity::chat::MessageType;
    use consulthub_entity::user::UserRole;

    use super::*;

    fn line(session_id: SessionId, sender_id: UserId, text: &str) -> NewChatMessage {
        NewChatMessage {
            session_id,
            sender_id,
            sender_role: UserRole::Client,
            message: text.to_string(),
            message_type: MessageType::Text,
        }
    }

    #[tokio::test]
    async fn test_mark_read_skips_own_messages() {
        let store = MemoryStore::new();
        let session = SessionId::new();
        let (alice, bob) = (UserId::new(), UserId::new());

        store.append(line(session, alice, "hi")).await.unwrap();
        store.append(line(session, bob, "hello")).await.unwrap();
        store.append(line(session, alice, "question")).await.unwrap();

        assert_eq!(store.mark_read(session, bob, Utc::now()).await.unwrap(), 2);
        assert_eq!(store.mark_read(session, bob, Utc::now()).await.unwrap(), 0);

        let log = store.list_for_session(session).await.unwrap();
        assert_eq!(log.len(), 3);
        assert!(log[1].read_at.is_none());
        assert_eq!(log[2].message, "question");
    }
}

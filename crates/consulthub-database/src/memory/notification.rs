use async_trait::async_trait;
use chrono::Utc;

use consulthub_core::result::AppResult;
use consulthub_core::types::{NotificationId, UserId};
use consulthub_entity::notification::{NewNotification, Notification};

use super::MemoryStore;
use crate::store::NotificationStore;

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create(&self, notification: NewNotification) -> AppResult<Notification> {
        let stored = Notification {
            id: NotificationId::new(),
            user_id: notification.user_id,
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            link_url: notification.link_url,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        self.notifications.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        unread_only: bool,
        limit: u32,
    ) -> AppResult<Vec<Notification>> {
        let mut found: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|e| e.user_id == user_id && (!unread_only || !e.is_read))
            .map(|e| e.value().clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn count_unread(&self, user_id: UserId) -> AppResult<i64> {
        let count = self
            .notifications
            .iter()
            .filter(|e| e.user_id == user_id && !e.is_read)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn mark_read(&self, id: NotificationId, user_id: UserId) -> AppResult<bool> {
        Ok(match self.notifications.get_mut(&id) {
            Some(mut n) if n.user_id == user_id => {
                if !n.is_read {
                    n.is_read = true;
                    n.read_at = Some(Utc::now());
                }
                true
            }
            _ => false,
        })
    }

    async fn mark_all_read(&self, user_id: UserId) -> AppResult<u64> {
        let now = Utc::now();
        let mut marked = 0;
        for mut n in self.notifications.iter_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                n.read_at = Some(now);
                marked += 1;
            }
        }
        Ok(marked)
    }
}

#[cfg(test)]
mod tests {
    use consulthub_entity::notification::NotificationKind;

    use super::*;

    fn note(user_id: UserId, title: &str) -> NewNotification {
        NewNotification {
            user_id,
            kind: NotificationKind::System,
            title: title.to_string(),
            message: "body".to_string(),
            link_url: None,
        }
    }

    #[tokio::test]
    async fn test_mark_read_is_owner_scoped() {
        let store = MemoryStore::new();
        let (owner, other) = (UserId::new(), UserId::new());
        let created = store.create(note(owner, "one")).await.unwrap();

        assert!(!store.mark_read(created.id, other).await.unwrap());
        assert!(store.mark_read(created.id, owner).await.unwrap());
        assert_eq!(store.count_unread(owner).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unread_filter_and_mark_all() {
        let store = MemoryStore::new();
        let user = UserId::new();
        for title in ["a", "b", "c"] {
            store.create(note(user, title)).await.unwrap();
        }
        store.create(note(UserId::new(), "someone else")).await.unwrap();

        assert_eq!(store.list_for_user(user, true, 10).await.unwrap().len(), 3);
        assert_eq!(store.list_for_user(user, false, 2).await.unwrap().len(), 2);
        assert_eq!(store.mark_all_read(user).await.unwrap(), 3);
        assert!(store.list_for_user(user, true, 10).await.unwrap().is_empty());
        assert_eq!(store.notification_count(), 4);
    }
}

//! Notification sink: persist, then push to `user:<id>`.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use consulthub_core::error::AppError;
use consulthub_core::result::AppResult;
use consulthub_core::types::{NotificationId, UserId};
use consulthub_database::NotificationStore;
use consulthub_entity::notification::{NewNotification, Notification, NotificationKind};
use consulthub_entity::session::Session;

use crate::channel::Channel;
use crate::fanout::ChannelFanout;
use crate::message::OutboundEvent;
use crate::metrics::EngineMetrics;

/// Largest page [`NotificationSink::list`] returns.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

#[derive(Debug)]
pub struct NotificationSink {
    store: Arc<dyn NotificationStore>,
    fanout: Arc<ChannelFanout>,
    metrics: Arc<EngineMetrics>,
}

impl NotificationSink {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        fanout: Arc<ChannelFanout>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            store,
            fanout,
            metrics,
        }
    }

    /// Persist `notification` and push `notification:new` to its owner.
    pub async fn notify(&self, notification: NewNotification) -> AppResult<Notification> {
        let user_id = notification.user_id;
        let stored = self.store.create(notification).await?;
        self.fanout
            .emit(
                &Channel::User(user_id),
                &OutboundEvent::NotificationNew(stored.clone()),
            )
            .await?;
        EngineMetrics::inc(&self.metrics.notifications_sent);
        debug!(user_id = %user_id, notification_id = %stored.id, "Notification sent");
        Ok(stored)
    }

    /// Newest first, with the owner's total unread count.
    pub async fn list(
        &self,
        user_id: UserId,
        unread_only: bool,
        limit: u32,
    ) -> AppResult<NotificationPage> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let notifications = self.store.list_for_user(user_id, unread_only, limit).await?;
        let unread_count = self.store.count_unread(user_id).await?;
        Ok(NotificationPage {
            notifications,
            unread_count,
        })
    }

    pub async fn mark_read(&self, id: NotificationId, user_id: UserId) -> AppResult<()> {
        if self.store.mark_read(id, user_id).await? {
            Ok(())
        } else {
            Err(AppError::not_found("Notification not found"))
        }
    }

    pub async fn mark_all_read(&self, user_id: UserId) -> AppResult<u64> {
        self.store.mark_all_read(user_id).await
    }
}

/// The client-facing notice for a claimed session.
pub fn session_accepted(session: &Session, consultant_name: &str) -> NewNotification {
    NewNotification {
        user_id: session.client_id,
        kind: NotificationKind::SessionRequest,
        title: "Session Accepted".to_string(),
        message: format!(
            "Your session {} has been accepted by {}",
            session.session_number,
            consultant_name.trim()
        ),
        link_url: Some(format!("/sessions/{}", session.id)),
    }
}

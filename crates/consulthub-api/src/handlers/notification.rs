//! Notification handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use consulthub_core::types::NotificationId;
use consulthub_realtime::notification::NotificationPage;

use crate::dto::request::NotificationQuery;
use crate::dto::response::{ApiResponse, MarkedResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ApiResponse<NotificationPage>>, ApiError> {
    let page = state
        .engine
        .notifications
        .list(auth.user_id, query.unread_only, query.limit())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// PUT /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.engine.notifications.mark_read(id, auth.user_id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Marked as read"))))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<MarkedResponse>>, ApiError> {
    let marked = state.engine.notifications.mark_all_read(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(MarkedResponse { marked })))
}

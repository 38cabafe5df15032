//! Consulting session handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use consulthub_core::types::SessionId;
use consulthub_entity::chat::ChatMessage;
use consulthub_entity::session::Session;
use consulthub_realtime::session::SessionPage;

use crate::dto::request::{
    CreateSessionRequest, EndSessionRequest, RateSessionRequest, SessionListQuery,
};
use crate::dto::response::ApiResponse;
use crate::dto::validated;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/sessions
pub async fn create_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Session>>), ApiError> {
    let req = validated(req)?;
    let session = state.engine.sessions.create(*auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(session))))
}

/// GET /api/sessions?status=&page=&limit=
///
/// Consultants asking for `PENDING` get their current room's queue.
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<ApiResponse<SessionPage>>, ApiError> {
    let query = validated(query)?;
    let page = state.engine.sessions.list(*auth, query.into()).await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<SessionId>,
) -> Result<Json<ApiResponse<Session>>, ApiError> {
    let session = state.engine.sessions.get(*auth, id).await?;
    Ok(Json(ApiResponse::ok(session)))
}

/// POST /api/sessions/{id}/end
pub async fn end_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<SessionId>,
    Json(req): Json<EndSessionRequest>,
) -> Result<Json<ApiResponse<Session>>, ApiError> {
    let req = validated(req)?;
    let session = state.engine.sessions.end(*auth, id, req.into()).await?;
    Ok(Json(ApiResponse::ok(session)))
}

/// POST /api/sessions/{id}/rate
pub async fn rate_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<SessionId>,
    Json(req): Json<RateSessionRequest>,
) -> Result<Json<ApiResponse<Session>>, ApiError> {
    let req = validated(req)?;
    let session = state
        .engine
        .sessions
        .rate(*auth, id, req.rating, req.feedback)
        .await?;
    Ok(Json(ApiResponse::ok(session)))
}

/// GET /api/sessions/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<SessionId>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>, ApiError> {
    let messages = state.engine.chat.history(*auth, id).await?;
    Ok(Json(ApiResponse::ok(messages)))
}

//! Room directory handlers.

use axum::Json;
use axum::extract::State;

use consulthub_realtime::presence::RoomAvailability;

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/rooms
pub async fn list_rooms(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<RoomAvailability>>>, ApiError> {
    let rooms = state.engine.presence.rooms().await?;
    Ok(Json(ApiResponse::ok(rooms)))
}

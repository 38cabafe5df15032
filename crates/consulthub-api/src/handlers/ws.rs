//! WebSocket upgrade handler and per-socket pump.

use axum::body::Bytes;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use tokio::time;
use tracing::{debug, info, warn};

use consulthub_auth::Identity;
use consulthub_realtime::WsAuthenticator;
use consulthub_realtime::connection::heartbeat::{Heartbeat, HeartbeatAction};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters accepted on the upgrade request.
#[derive(Debug, Default, serde::Deserialize)]
pub struct WsQuery {
    /// JWT access token, for clients that cannot set headers.
    pub token: Option<String>,
}

/// GET /ws?token={jwt}
///
/// The token is verified before the upgrade; a bad or missing token is a
/// plain 401 and no socket is opened.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let identity = WsAuthenticator::new(state.jwt_decoder.clone())
        .authenticate(query.token.as_deref(), authorization)?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let max_frame = state.engine.config().max_message_size_bytes;
    Ok(ws
        .max_message_size(max_frame)
        .on_upgrade(move |socket| run_socket(state, identity, socket)))
}

/// Pump one socket until either side closes or the heartbeat lapses.
async fn run_socket(state: AppState, identity: Identity, socket: WebSocket) {
    let engine = state.engine;
    let (handle, mut outbound) = engine.connect(identity).await;
    let conn_id = handle.id;
    info!(
        conn_id = %conn_id,
        user_id = %identity.user_id,
        role = %identity.role,
        "WebSocket connected"
    );

    let (inbound, worker) = engine.inbound_worker(conn_id);
    let (mut sink, mut stream) = socket.split();
    let mut heartbeat = Heartbeat::new(engine.config());
    let mut ticker = heartbeat.ticker();

    loop {
        let deadline = heartbeat.deadline();
        tokio::select! {
            _ = handle.closed() => {
                debug!(conn_id = %conn_id, "Connection closed by server");
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            frame = outbound.recv() => match frame {
                Some(text) => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if inbound.send(text.to_string()).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Pong(_))) => heartbeat.record_pong(),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
            _ = ticker.tick() => match heartbeat.on_tick() {
                HeartbeatAction::SendPing => {
                    if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
                HeartbeatAction::TimedOut => {
                    warn!(conn_id = %conn_id, "Heartbeat timed out");
                    break;
                }
            },
            _ = sleep_until(deadline) => {
                warn!(conn_id = %conn_id, "Pong not received in time");
                break;
            }
        }
    }

    // Let queued events finish before presence sees the disconnect.
    drop(inbound);
    if let Err(e) = worker.await {
        warn!(conn_id = %conn_id, error = %e, "Inbound worker failed");
    }
    engine.disconnect(conn_id).await;
    info!(conn_id = %conn_id, user_id = %identity.user_id, "WebSocket disconnected");
}

async fn sleep_until(deadline: Option<time::Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

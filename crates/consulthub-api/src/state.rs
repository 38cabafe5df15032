//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use consulthub_auth::JwtDecoder;
use consulthub_core::config::AppConfig;
use consulthub_database::DatabasePool;
use consulthub_realtime::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// PostgreSQL pool; `None` when running on in-memory stores.
    pub database: Option<DatabasePool>,
    pub started_at: Instant,

    // ── Auth ─────────────────────────────────────────────────
    pub jwt_decoder: Arc<JwtDecoder>,

    // ── Realtime ─────────────────────────────────────────────
    /// Presence, claims, chat, notifications, and the socket registry.
    pub engine: RealtimeEngine,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        database: Option<DatabasePool>,
        jwt_decoder: Arc<JwtDecoder>,
        engine: RealtimeEngine,
    ) -> Self {
        Self {
            config: Arc::new(config),
            database,
            started_at: Instant::now(),
            jwt_decoder,
            engine,
        }
    }
}

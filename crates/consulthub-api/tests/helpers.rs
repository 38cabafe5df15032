//! Shared test helpers for API tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Duration;
use serde_json::Value;
use tower::ServiceExt;

use consulthub_api::{AppState, build_router};
use consulthub_auth::{Identity, JwtDecoder, JwtEncoder};
use consulthub_core::config::AppConfig;
use consulthub_core::types::{RoomCode, RoomId, UserId};
use consulthub_database::{MemoryStore, RoomStore, Stores};
use consulthub_entity::user::UserRole;
use consulthub_realtime::{MemoryLedger, MemoryPubSub, RealtimeEngine};

/// Router over a seeded in-memory store.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    encoder: JwtEncoder,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "test-secret-with-enough-entropy".to_string();

        let store = Arc::new(MemoryStore::seeded().expect("seed store"));
        let engine = RealtimeEngine::new(
            config.realtime.clone(),
            Stores::memory(store.clone()),
            Arc::new(MemoryPubSub::new(64)),
            Arc::new(MemoryLedger::new()),
            None,
        );
        engine.start().await.expect("start engine");

        let encoder = JwtEncoder::new(&config.auth);
        let decoder = Arc::new(JwtDecoder::new(&config.auth));
        let state = AppState::new(config, None, decoder, engine);

        Self {
            router: build_router(state.clone()),
            state,
            store,
            encoder,
        }
    }

    pub fn token(&self, identity: Identity) -> String {
        self.encoder
            .encode(identity.user_id, identity.role, Duration::minutes(5))
            .expect("sign token")
    }

    pub fn client(&self) -> (Identity, String) {
        let identity = Identity::new(UserId::new(), UserRole::Client);
        (identity, self.token(identity))
    }

    pub fn consultant(&self, name: &str) -> (Identity, String) {
        let user = UserId::new();
        self.store.insert_consultant(user, name);
        let identity = Identity::new(user, UserRole::Consultant);
        (identity, self.token(identity))
    }

    pub async fn room_id(&self, code: &str) -> RoomId {
        self.store
            .find_by_code(&RoomCode::new(code).expect("room code"))
            .await
            .expect("room lookup")
            .expect("seeded room")
            .id
    }

    /// Make an HTTP request to the test app.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

//! Shared fixtures for engine scenario tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use consulthub_auth::Identity;
use consulthub_core::config::RealtimeConfig;
use consulthub_core::error::AppError;
use consulthub_core::result::AppResult;
use consulthub_core::traits::{VideoMeeting, VideoProvider};
use consulthub_core::types::{ConsultantId, RoomCode, UserId};
use consulthub_database::{MemoryStore, PresenceStore, RoomStore, Stores};
use consulthub_entity::consultant::{ConsultantPresence, PresenceState};
use consulthub_entity::room::Room;
use consulthub_entity::user::UserRole;
use consulthub_realtime::fanout::MemoryPubSub;
use consulthub_realtime::{ConnectionHandle, ConnectionLedger, MemoryLedger, RealtimeEngine};

pub const GRACE_SECONDS: u64 = 15;

pub fn config() -> RealtimeConfig {
    RealtimeConfig {
        offline_grace_period_seconds: GRACE_SECONDS,
        ..RealtimeConfig::default()
    }
}

/// One engine over a seeded in-memory store.
pub struct TestNode {
    pub engine: RealtimeEngine,
    pub store: Arc<MemoryStore>,
    pub presence: Arc<CountingPresence>,
}

impl TestNode {
    pub async fn new() -> Self {
        Self::with_video(None).await
    }

    pub async fn with_video(video: Option<Arc<dyn VideoProvider>>) -> Self {
        let store = Arc::new(MemoryStore::seeded().unwrap());
        let bus = Arc::new(MemoryPubSub::new(256));
        Self::on(store, bus, Arc::new(MemoryLedger::new()), video).await
    }

    /// A node sharing `store`, `bus` and `ledger` with other nodes.
    pub async fn on(
        store: Arc<MemoryStore>,
        bus: Arc<MemoryPubSub>,
        ledger: Arc<dyn ConnectionLedger>,
        video: Option<Arc<dyn VideoProvider>>,
    ) -> Self {
        let presence = Arc::new(CountingPresence::new(store.clone()));
        let stores = Stores {
            presence: presence.clone(),
            ..Stores::memory(store.clone())
        };
        let engine = RealtimeEngine::new(config(), stores, bus, ledger, video);
        engine.start().await.unwrap();
        Self {
            engine,
            store,
            presence,
        }
    }

    /// Presence rows written through this node so far.
    pub fn presence_writes(&self) -> usize {
        self.presence.writes()
    }

    pub async fn room(&self, code: &str) -> Room {
        self.store
            .find_by_code(&RoomCode::new(code).unwrap())
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn presence_of(&self, user: UserId) -> ConsultantPresence {
        self.store.find_by_user(user).await.unwrap().unwrap()
    }

    pub async fn state_of(&self, user: UserId) -> PresenceState {
        self.presence_of(user).await.state()
    }

    /// Connect a client with a fresh user id.
    pub async fn client(&self) -> TestConn {
        self.connect(Identity::new(UserId::new(), UserRole::Client)).await
    }

    /// Create a consultant profile and connect it.
    pub async fn consultant(&self, name: &str) -> TestConn {
        let user = UserId::new();
        self.store.insert_consultant(user, name);
        self.connect(Identity::new(user, UserRole::Consultant)).await
    }

    pub async fn admin(&self) -> TestConn {
        self.connect(Identity::new(UserId::new(), UserRole::Admin)).await
    }

    pub async fn connect(&self, identity: Identity) -> TestConn {
        let (handle, rx) = self.engine.connect(identity).await;
        TestConn {
            identity,
            handle,
            rx,
        }
    }

    /// Send an inbound frame as `conn`.
    pub async fn send(&self, conn: &TestConn, event: &str, data: Value) {
        let frame = json!({ "event": event, "data": data }).to_string();
        self.engine.handle_inbound(conn.handle.id, &frame).await;
    }

    pub async fn join_room(&self, conn: &TestConn, room: &str) {
        self.send(conn, "consultant:join-room", json!({ "roomCode": room }))
            .await;
    }

    pub async fn disconnect(&self, conn: &TestConn) {
        self.engine.disconnect(conn.handle.id).await;
    }
}

pub struct TestConn {
    pub identity: Identity,
    pub handle: Arc<ConnectionHandle>,
    pub rx: mpsc::Receiver<String>,
}

impl TestConn {
    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }

    /// Every frame queued so far, parsed.
    pub fn drain(&mut self) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(raw) = self.rx.try_recv() {
            frames.push(serde_json::from_str(&raw).unwrap());
        }
        frames
    }

    /// Queued frames named `event`, discarding the rest.
    pub fn take(&mut self, event: &str) -> Vec<Value> {
        self.drain()
            .into_iter()
            .filter(|f| f["event"] == event)
            .collect()
    }
}

/// Data of the only frame named `event` in `frames`.
pub fn only<'a>(frames: &'a [Value], event: &str) -> &'a Value {
    let matching: Vec<_> = frames.iter().filter(|f| f["event"] == event).collect();
    assert_eq!(matching.len(), 1, "expected one {event}, got {frames:?}");
    &matching[0]["data"]
}

pub fn count(frames: &[Value], event: &str) -> usize {
    frames.iter().filter(|f| f["event"] == event).count()
}

/// Let spawned tasks (timers, relays) run without advancing the clock.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Video provider that counts calls and can be told to fail or stall.
#[derive(Debug, Default)]
pub struct FakeVideo {
    pub fail: bool,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl FakeVideo {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoProvider for FakeVideo {
    fn name(&self) -> &str {
        "fake"
    }

    async fn create_meeting(&self, topic: &str) -> AppResult<VideoMeeting> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(AppError::external("video provider down"));
        }
        Ok(VideoMeeting {
            meeting_id: format!("m-{n}"),
            join_url: format!("https://video.test/j/{n}?topic={}", topic.len()),
            password: Some("secret".to_string()),
        })
    }
}

/// Presence store that counts writes and can be told to reject
/// `set_available`.
#[derive(Debug)]
pub struct CountingPresence {
    inner: Arc<MemoryStore>,
    writes: AtomicUsize,
    reject_available: AtomicBool,
}

impl CountingPresence {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            writes: AtomicUsize::new(0),
            reject_available: AtomicBool::new(false),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every later `set_available` fail.
    pub fn reject_available(&self) {
        self.reject_available.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PresenceStore for CountingPresence {
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Option<ConsultantPresence>> {
        self.inner.find_by_user(user_id).await
    }

    async fn find_by_id(&self, id: ConsultantId) -> AppResult<Option<ConsultantPresence>> {
        PresenceStore::find_by_id(self.inner.as_ref(), id).await
    }

    async fn set_available(&self, id: ConsultantId, room: &RoomCode) -> AppResult<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.reject_available.load(Ordering::SeqCst) {
            return Err(AppError::database("presence write rejected"));
        }
        self.inner.set_available(id, room).await
    }

    async fn set_unavailable(&self, id: ConsultantId) -> AppResult<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set_unavailable(id).await
    }

    async fn available_by_room(&self) -> AppResult<HashMap<RoomCode, i64>> {
        self.inner.available_by_room().await
    }
}

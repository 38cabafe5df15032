//! ConsultHub Server: realtime consulting-session broker.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use consulthub_api::{AppState, build_router};
use consulthub_auth::JwtDecoder;
use consulthub_core::config::{AppConfig, PubSubBackend, PubSubConfig};
use consulthub_core::error::AppError;
use consulthub_core::traits::VideoProvider;
use consulthub_database::{DatabasePool, MemoryStore, Stores};
use consulthub_realtime::{ConnectionLedger, MemoryLedger, MemoryPubSub, PubSub, RealtimeEngine};
use consulthub_video::ZoomProvider;

/// Buffer of the in-process fan-out bus.
const MEMORY_BUS_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() {
    let env = std::env::var("CONSULTHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting ConsultHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Stores ───────────────────────────────────────────
    let (stores, database) = match &config.database {
        Some(db_config) => {
            let pool = DatabasePool::open(db_config).await?;
            (Stores::postgres(pool.pool().clone()), Some(pool))
        }
        None => {
            tracing::warn!("No database configured, using seeded in-memory stores");
            (Stores::memory(Arc::new(MemoryStore::seeded()?)), None)
        }
    };

    // ── Step 2: Fan-out transport and connection ledger ──────────
    let (pubsub, ledger) = build_pubsub(&config.pubsub).await?;
    tracing::info!(
        backend = pubsub.name(),
        ledger = ledger.name(),
        "Pub/sub transport ready"
    );

    // ── Step 3: Video provider ───────────────────────────────────
    let video: Option<Arc<dyn VideoProvider>> = if config.video.enabled {
        let provider = ZoomProvider::new(config.video.clone())?;
        tracing::info!(provider = provider.name(), "Video provider enabled");
        Some(Arc::new(provider))
    } else {
        tracing::info!("Video provider disabled");
        None
    };

    // ── Step 4: Realtime engine ──────────────────────────────────
    let engine = RealtimeEngine::new(config.realtime.clone(), stores, pubsub, ledger, video);
    let relay = engine.start().await?;

    // ── Step 5: HTTP server ──────────────────────────────────────
    let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let shutdown_grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = AppState::new(config, database.clone(), jwt_decoder, engine.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(addr = %addr, "ConsultHub server listening");

    // ── Step 6: Graceful shutdown ────────────────────────────────
    let shutdown_engine = engine.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            // Closing the sockets lets their upgrade tasks finish.
            shutdown_engine.shutdown();
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    if tokio::time::timeout(shutdown_grace, relay).await.is_err() {
        tracing::warn!("Fan-out relay did not stop in time");
    }
    if let Some(pool) = database {
        pool.close().await;
    }

    tracing::info!("ConsultHub server shut down gracefully");
    Ok(())
}

type Backplane = (Arc<dyn PubSub>, Arc<dyn ConnectionLedger>);

async fn build_pubsub(config: &PubSubConfig) -> Result<Backplane, AppError> {
    match config.backend {
        PubSubBackend::Memory => Ok((
            Arc::new(MemoryPubSub::new(MEMORY_BUS_CAPACITY)),
            Arc::new(MemoryLedger::new()),
        )),
        #[cfg(feature = "redis-pubsub")]
        PubSubBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| AppError::configuration("pubsub.redis_url is required"))?;
            let redis =
                consulthub_realtime::fanout::RedisPubSub::connect(url, &config.channel).await?;
            let ledger =
                consulthub_realtime::presence::RedisLedger::connect(url, &config.ledger_prefix)
                    .await?;
            Ok((Arc::new(redis), Arc::new(ledger)))
        }
        #[cfg(not(feature = "redis-pubsub"))]
        PubSubBackend::Redis => Err(AppError::configuration(
            "The redis pub/sub backend requires the `redis-pubsub` feature",
        )),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

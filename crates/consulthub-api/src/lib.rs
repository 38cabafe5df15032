//! # consulthub-api
//!
//! HTTP API layer for ConsultHub built on Axum.
//!
//! Provides the session and notification endpoints, the WebSocket upgrade
//! into the realtime engine, middleware (CORS, request logging), the
//! bearer-token extractor, DTOs, and error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;

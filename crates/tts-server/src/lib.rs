//! # tts-server
//!
//! HTTP adapter for the speech host.
//!
//! Provides:
//! - `POST /api?prompt=...` returning `audio/wav`
//! - The worker-side internal synthesis endpoint
//! - Health, readiness and info endpoints
//! - Cold start and graceful shutdown wiring

pub mod error;
pub mod http;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use http::{API_PATH, InfoResponse, create_router};
pub use server::TtsServer;
pub use state::AppState;

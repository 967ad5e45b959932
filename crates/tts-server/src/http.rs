//! HTTP routes and handlers.

use std::convert::Infallible;

use axum::{
    Json, Router,
    body::Body,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info, instrument, warn};

use runtime::GENERATE_SPEECH_PATH;
use tts_core::{GenerateSpeechRequest, HostState, ServerRole, TextPrompt, TtsResult, WavAudio};

use crate::error::ApiError;
use crate::state::AppState;

/// Public synthesis endpoint.
pub const API_PATH: &str = "/api";

/// Build the router for the state's role.
///
/// Standalone and gateway processes serve `POST /api`; workers serve the
/// internal synthesis endpoint instead.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/info", get(info_handler));

    let router = match state.role {
        ServerRole::Standalone | ServerRole::Gateway => {
            router.route(API_PATH, post(api_handler))
        }
        ServerRole::Worker => router.route(GENERATE_SPEECH_PATH, post(generate_speech_handler)),
    };

    router
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Query parameters of `POST /api`.
#[derive(Debug, Deserialize)]
pub struct ApiParams {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
async fn api_handler(
    State(state): State<AppState>,
    params: Result<Query<ApiParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    synthesize(&state, params.prompt.unwrap_or_default()).await
}

#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
async fn generate_speech_handler(
    State(state): State<AppState>,
    request: Result<Json<GenerateSpeechRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request?;
    synthesize(&state, request.text).await
}

async fn synthesize(state: &AppState, raw: String) -> Result<Response, ApiError> {
    state.metrics.request_received();

    match run_synthesis(state, raw).await {
        Ok(audio) => {
            state.metrics.request_completed();
            info!(bytes = audio.len(), "Streaming audio response");
            Ok(wav_response(audio, state.stream_chunk_bytes))
        }
        Err(e) => {
            state.metrics.request_failed();
            if e.is_client_error() {
                warn!(error = %e, "Rejected synthesis request");
            } else {
                error!(error = %e, "Synthesis request failed");
            }
            Err(e.into())
        }
    }
}

async fn run_synthesis(state: &AppState, raw: String) -> TtsResult<WavAudio> {
    let prompt = TextPrompt::parse(raw, &state.limits)?;
    state.synthesizer.synthesize(&prompt).await
}

/// Stream WAV bytes back in frames of `chunk_bytes`.
fn wav_response(audio: WavAudio, chunk_bytes: usize) -> Response {
    let bytes = Bytes::from(audio.into_bytes());
    let chunk_bytes = chunk_bytes.max(1);

    let frames: Vec<Result<Bytes, Infallible>> = (0..bytes.len())
        .step_by(chunk_bytes)
        .map(|start| Ok(bytes.slice(start..(start + chunk_bytes).min(bytes.len()))))
        .collect();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, WavAudio::CONTENT_TYPE)],
        Body::from_stream(futures::stream::iter(frames)),
    )
        .into_response()
}

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Ready once the synthesizer can serve; 503 during cold start or after teardown.
async fn ready_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.synthesizer.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}

/// Info response.
#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    pub app_name: String,
    pub version: String,
    pub runtime: String,
    pub gpu: Option<String>,
    pub role: ServerRole,
    pub model: String,
    pub revision: String,
    pub max_prompt_chars: usize,
    pub host_state: Option<HostState>,
    pub device: Option<String>,
    pub sample_rate: Option<u32>,
    pub model_loads: Option<usize>,
}

async fn info_handler(State(state): State<AppState>) -> impl IntoResponse {
    let host = state.host.as_deref();

    Json(InfoResponse {
        app_name: state.deployment.app_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        runtime: state.deployment.runtime.clone(),
        gpu: state.deployment.gpu.clone(),
        role: state.role,
        model: state.model.name.clone(),
        revision: state.model.revision.clone(),
        max_prompt_chars: state.limits.max_chars,
        host_state: host.map(|h| h.state()),
        device: host.and_then(|h| h.device_name()).map(str::to_owned),
        sample_rate: host.and_then(|h| h.sample_rate()),
        model_loads: host.map(|h| h.load_count()),
    })
}

//! Handler state shared across requests.

use std::sync::Arc;
use std::time::Instant;

use runtime::{ModelHost, TtsMetrics};
use tts_core::{DeploymentConfig, ModelConfig, PromptLimits, ServerRole, ServiceConfig, Synthesizer};

/// Shared handler state.
///
/// The synthesizer is injected rather than reached through a global, so the
/// adapter can be driven by an in-process host, a remote worker, or a test
/// double alike.
#[derive(Clone)]
pub struct AppState {
    pub synthesizer: Arc<dyn Synthesizer>,
    /// Set when this process owns the model host.
    pub host: Option<Arc<ModelHost>>,
    pub role: ServerRole,
    pub limits: PromptLimits,
    pub deployment: DeploymentConfig,
    pub model: ModelConfig,
    pub stream_chunk_bytes: usize,
    pub metrics: TtsMetrics,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(synthesizer: Arc<dyn Synthesizer>, config: &ServiceConfig) -> Self {
        Self {
            synthesizer,
            host: None,
            role: config.server.role,
            limits: config.prompt.clone(),
            deployment: config.deployment.clone(),
            model: config.model.clone(),
            stream_chunk_bytes: config.server.stream_chunk_bytes,
            metrics: TtsMetrics,
            start_time: Instant::now(),
        }
    }

    /// State backed by an in-process model host.
    pub fn with_host(host: Arc<ModelHost>, config: &ServiceConfig) -> Self {
        let mut state = Self::new(host.clone(), config);
        state.host = Some(host);
        state
    }
}

//! Configuration structures for the speech host.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{TtsError, TtsResult};

/// Prefix for environment variable overrides (`SPEECH_HOST_SERVER__ROLE=worker`).
pub const ENV_PREFIX: &str = "SPEECH_HOST";

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Deployment descriptor.
    pub deployment: DeploymentConfig,
    /// Pretrained model selection.
    pub model: ModelConfig,
    /// Accelerator binding.
    pub device: DeviceConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Prompt validation limits.
    pub prompt: PromptLimits,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Metrics configuration.
    pub metrics: MetricsConfig,
}

impl ServiceConfig {
    /// Load configuration from an optional TOML file, then apply
    /// `SPEECH_HOST_*` environment overrides.
    ///
    /// Cross-field constraints are not checked here; callers layer their own
    /// overrides first and then call [`validate`](Self::validate).
    pub fn load(path: Option<&Path>) -> TtsResult<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| TtsError::config(e.to_string()))?;

        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> TtsResult<()> {
        if self.prompt.max_chars == 0 {
            return Err(TtsError::config("prompt.max_chars must be greater than 0"));
        }

        if self.server.stream_chunk_bytes == 0 {
            return Err(TtsError::config(
                "server.stream_chunk_bytes must be greater than 0",
            ));
        }

        if self.server.role == ServerRole::Gateway && self.server.worker_url.is_none() {
            return Err(TtsError::config(
                "server.worker_url is required when running as gateway",
            ));
        }

        Ok(())
    }
}

/// Deployment descriptor: what the image is and what it asks the platform for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Application name reported to the hosting platform.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Base runtime image.
    #[serde(default = "default_runtime")]
    pub runtime: String,
    /// GPU class requested per container.
    #[serde(default = "default_gpu")]
    pub gpu: Option<String>,
}

fn default_app_name() -> String {
    "chatterbox-api-service".to_string()
}

fn default_runtime() -> String {
    "rust-debian-slim".to_string()
}

fn default_gpu() -> Option<String> {
    Some("A10G".to_string())
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            runtime: default_runtime(),
            gpu: default_gpu(),
        }
    }
}

/// Model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name/identifier.
    #[serde(default = "default_model_name")]
    pub name: String,
    /// Model revision.
    #[serde(default = "default_model_revision")]
    pub revision: String,
    /// Where the pretrained artifact comes from.
    #[serde(default)]
    pub source: ArtifactSource,
    /// Text synthesized once after loading, if set.
    #[serde(default)]
    pub warmup_text: Option<String>,
}

fn default_model_name() -> String {
    "chatterbox-tts".to_string()
}

fn default_model_revision() -> String {
    "0.1.1".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            revision: default_model_revision(),
            source: ArtifactSource::default(),
            warmup_text: None,
        }
    }
}

/// Location of a pretrained model artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ArtifactSource {
    /// Parameters compiled into the binary.
    #[default]
    Builtin,
    /// A directory containing `config.json`.
    Local { path: PathBuf },
    /// A Hugging Face Hub model repository; `revision` comes from [`ModelConfig`].
    Hub { repo: String },
}

/// Compute device configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Preferred device type.
    #[serde(default)]
    pub preference: DevicePreference,
    /// GPU ordinal when binding CUDA or Metal.
    #[serde(default)]
    pub gpu_index: usize,
    /// Fail cold start if no accelerator could be bound.
    #[serde(default)]
    pub require_accelerator: bool,
}

/// Device preference for model loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// Automatically select the best available device.
    #[default]
    Auto,
    /// Force CPU usage.
    Cpu,
    /// Force CUDA GPU (NVIDIA).
    Cuda,
    /// Force Metal GPU (Apple Silicon).
    Metal,
}

impl std::str::FromStr for DevicePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" | "nvidia" => Ok(Self::Cuda),
            "metal" | "mps" | "apple" => Ok(Self::Metal),
            _ => Err(format!("unknown device: {s}")),
        }
    }
}

/// Which half of the service this process runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerRole {
    /// Adapter and model host in one process.
    #[default]
    Standalone,
    /// Model host only, behind the internal synthesis endpoint.
    Worker,
    /// Adapter only, forwarding to a worker.
    Gateway,
}

impl std::fmt::Display for ServerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerRole::Standalone => write!(f, "standalone"),
            ServerRole::Worker => write!(f, "worker"),
            ServerRole::Gateway => write!(f, "gateway"),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Process role.
    #[serde(default)]
    pub role: ServerRole,
    /// HTTP bind address.
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,
    /// Base URL of the worker (gateway role only).
    #[serde(default)]
    pub worker_url: Option<String>,
    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
    /// Size of each body frame when streaming WAV bytes.
    #[serde(default = "default_stream_chunk_bytes")]
    pub stream_chunk_bytes: usize,
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_stream_chunk_bytes() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            role: ServerRole::default(),
            http_addr: default_http_addr(),
            worker_url: None,
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            stream_chunk_bytes: default_stream_chunk_bytes(),
        }
    }
}

/// Prompt validation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptLimits {
    /// Maximum prompt length in Unicode scalar values.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_chars() -> usize {
    10_000
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format (json or text).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable the Prometheus exporter.
    #[serde(default)]
    pub enabled: bool,
    /// Prometheus exporter port (if enabled).
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

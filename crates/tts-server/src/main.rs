//! Speech host server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use runtime::logging::init_logging_from_config;
use runtime::{ToneLoader, TtsMetrics};
use tts_core::{DevicePreference, ServerRole, ServiceConfig};
use tts_server::TtsServer;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Role {
    Standalone,
    Worker,
    Gateway,
}

impl From<Role> for ServerRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Standalone => ServerRole::Standalone,
            Role::Worker => ServerRole::Worker,
            Role::Gateway => ServerRole::Gateway,
        }
    }
}

/// Text-to-speech HTTP service
#[derive(Debug, Parser)]
#[command(name = "tts-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "SPEECH_HOST_CONFIG")]
    config: Option<PathBuf>,

    /// Process role
    #[arg(long, value_enum)]
    role: Option<Role>,

    /// HTTP server address
    #[arg(long)]
    http_addr: Option<SocketAddr>,

    /// Worker base URL (gateway role)
    #[arg(long)]
    worker_url: Option<String>,

    /// Device: auto, cpu, cuda, metal
    #[arg(short, long)]
    device: Option<DevicePreference>,

    /// Log level
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn apply(&self, config: &mut ServiceConfig) {
        if let Some(role) = self.role {
            config.server.role = role.into();
        }
        if let Some(addr) = self.http_addr {
            config.server.http_addr = addr;
        }
        if let Some(url) = &self.worker_url {
            config.server.worker_url = Some(url.clone());
        }
        if let Some(device) = self.device {
            config.device.preference = device;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.json_logs {
            config.logging.format = "json".to_string();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        ServiceConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    init_logging_from_config(&config.logging).context("Failed to initialize logging")?;

    if config.metrics.enabled {
        TtsMetrics::init(config.metrics.port).context("Failed to start metrics exporter")?;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        app = %config.deployment.app_name,
        role = %config.server.role,
        http_addr = %config.server.http_addr,
        model = %config.model.name,
        "Starting speech host"
    );

    let server = TtsServer::build(config, Arc::new(ToneLoader))
        .await
        .context("Cold start failed")?;

    server.run().await.context("Server failed")?;

    info!("Server shutdown complete");
    Ok(())
}

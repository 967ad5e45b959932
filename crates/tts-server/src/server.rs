//! Process wiring: cold start, HTTP listener, graceful shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use runtime::{ModelHost, ModelLoader, RemoteSynthesizer, warm::warm_model_cache};
use tts_core::{ServerRole, ServiceConfig, TtsError, TtsResult};

use crate::http::create_router;
use crate::state::AppState;

/// The speech host server.
pub struct TtsServer {
    config: ServiceConfig,
    state: AppState,
}

impl std::fmt::Debug for TtsServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtsServer")
            .field("role", &self.config.server.role)
            .field("http_addr", &self.config.server.http_addr)
            .field("host", &self.state.host)
            .finish()
    }
}

impl TtsServer {
    /// Build the server for the configured role.
    ///
    /// Standalone and worker processes own a [`ModelHost`] and complete the
    /// cold start here, so a model that cannot load fails the process before
    /// it accepts traffic. Gateways only need a reachable worker URL.
    pub async fn build(config: ServiceConfig, loader: Arc<dyn ModelLoader>) -> TtsResult<Self> {
        let state = match config.server.role {
            ServerRole::Standalone | ServerRole::Worker => {
                let host = Arc::new(ModelHost::new(
                    loader,
                    config.model.clone(),
                    config.device.clone(),
                ));

                match &config.model.warmup_text {
                    Some(text) => warm_model_cache(&host, &config.prompt, text).await?,
                    None => host.enter().await?,
                }

                AppState::with_host(host, &config)
            }
            ServerRole::Gateway => {
                let url = config
                    .server
                    .worker_url
                    .as_deref()
                    .ok_or_else(|| TtsError::config("gateway role requires server.worker_url"))?;
                let remote = RemoteSynthesizer::new(url)?;
                info!(endpoint = remote.endpoint(), "Forwarding synthesis to worker");
                AppState::new(Arc::new(remote), &config)
            }
        };

        Ok(Self { config, state })
    }

    /// Router for this server's role.
    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Bind the configured address and serve until SIGINT or SIGTERM.
    pub async fn run(self) -> TtsResult<()> {
        let addr = self.config.server.http_addr;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> TtsResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let addr = listener.local_addr()?;
        let app = self.router();

        let http_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_rx.changed().await.ok();
                })
                .await
        });

        info!(
            %addr,
            role = %self.config.server.role,
            app = %self.config.deployment.app_name,
            "Speech host listening"
        );

        shutdown.await;
        info!("Shutdown signal received, draining connections...");
        let _ = shutdown_tx.send(true);

        let timeout = Duration::from_secs(self.config.server.shutdown_timeout_secs);
        match tokio::time::timeout(timeout, http_handle).await {
            Ok(Ok(Ok(()))) => info!("HTTP server stopped gracefully"),
            Ok(Ok(Err(e))) => error!(error = %e, "HTTP server failed"),
            Ok(Err(e)) => error!(error = %e, "HTTP server task panicked"),
            Err(_) => warn!("Shutdown timeout, forcing exit"),
        }

        if let Some(host) = &self.state.host {
            host.shutdown();
        }

        Ok(())
    }
}

/// Wait for shutdown signal (SIGINT or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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

#[cfg(test)]
mod tests {
    use super::*;
    use runtime::ToneLoader;
    use tts_core::{DevicePreference, HostState};

    fn cpu_config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.device.preference = DevicePreference::Cpu;
        config
    }

    #[test]
    fn test_default_config_serves_port_8000() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.http_addr.port(), 8000);
        assert_eq!(config.server.role, ServerRole::Standalone);
    }

    #[tokio::test]
    async fn test_build_standalone_loads_model() {
        let server = TtsServer::build(cpu_config(), Arc::new(ToneLoader))
            .await
            .unwrap();

        let host = server.state.host.as_ref().unwrap();
        assert_eq!(host.state(), HostState::Ready);
        assert_eq!(host.load_count(), 1);
    }

    #[tokio::test]
    async fn test_build_gateway_without_worker_fails() {
        let mut config = cpu_config();
        config.server.role = ServerRole::Gateway;

        let err = TtsServer::build(config, Arc::new(ToneLoader))
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::Config(_)));
    }

    #[tokio::test]
    async fn test_serve_closes_host_on_shutdown() {
        let server = TtsServer::build(cpu_config(), Arc::new(ToneLoader))
            .await
            .unwrap();
        let host = Arc::clone(server.state.host.as_ref().unwrap());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        server.serve(listener, async {}).await.unwrap();

        assert_eq!(host.state(), HostState::Closed);
    }
}

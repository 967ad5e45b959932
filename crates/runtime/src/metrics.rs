//! Metrics collection and Prometheus export.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;
use tts_core::{TtsError, TtsResult};

/// Metrics recorder for speech host operations.
///
/// Stateless handle over the global `metrics` recorder; without an installed
/// recorder every call is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct TtsMetrics;

impl TtsMetrics {
    /// Install the Prometheus exporter on `port` and register descriptions.
    pub fn init(port: u16) -> TtsResult<Self> {
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();

        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| TtsError::internal(format!("metrics init failed: {e}")))?;

        Self::register_metrics();
        info!(%addr, "Prometheus exporter listening");

        Ok(Self)
    }

    fn register_metrics() {
        describe_counter!("tts_requests_total", "Total number of synthesis requests received");
        describe_counter!(
            "tts_requests_completed",
            "Total number of synthesis requests answered with audio"
        );
        describe_counter!(
            "tts_requests_failed",
            "Total number of synthesis requests answered with an error"
        );
        describe_counter!("tts_model_loads_total", "Number of successful model loads");
        describe_histogram!(
            "tts_synthesis_latency_ms",
            "Generation plus WAV encoding time in milliseconds"
        );
        describe_histogram!("tts_audio_bytes", "Size of returned WAV payloads in bytes");
    }

    /// Record a new request received.
    pub fn request_received(&self) {
        counter!("tts_requests_total").increment(1);
    }

    /// Record a request completed successfully.
    pub fn request_completed(&self) {
        counter!("tts_requests_completed").increment(1);
    }

    /// Record a request failed.
    pub fn request_failed(&self) {
        counter!("tts_requests_failed").increment(1);
    }

    /// Record a completed model load.
    pub fn model_loaded(&self) {
        counter!("tts_model_loads_total").increment(1);
    }

    /// Record synthesis latency.
    pub fn record_synthesis_latency(&self, ms: f64) {
        histogram!("tts_synthesis_latency_ms").record(ms);
    }

    /// Record the size of a WAV payload.
    pub fn record_audio_bytes(&self, bytes: usize) {
        histogram!("tts_audio_bytes").record(bytes as f64);
    }
}

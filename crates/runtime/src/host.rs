//! The model host: owns the loaded speech model for the lifetime of the
//! process and turns prompts into WAV bytes.
//!
//! Lifecycle:
//!
//! ```text
//! Cold --enter()--> Ready --shutdown()--> Closed
//!   \
//!    `--load error--> Failed
//! ```
//!
//! `enter()` is the initialization point and runs the loader at most once,
//! no matter how many callers race on it or give up waiting. The load runs
//! on the blocking pool and publishes into a shared slot, so a caller that
//! is cancelled mid-load does not discard the result. A failed cold start
//! is final; the hosting platform is expected to replace the process.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use async_trait::async_trait;
use candle_core::Device;
use tracing::{error, info, instrument};

use tts_core::{
    DeviceConfig, HostState, ModelConfig, SpeechModel, Synthesizer, TextPrompt, TtsError,
    TtsResult, WavAudio,
};

use crate::artifact::{self, ModelArtifact};
use crate::device;
use crate::metrics::TtsMetrics;
use crate::wav;

/// Builds a [`SpeechModel`] from a resolved artifact on a bound device.
pub trait ModelLoader: Send + Sync {
    /// Load the model. Called at most once per [`ModelHost`].
    fn load(&self, artifact: &ModelArtifact, device: &Device) -> TtsResult<Arc<dyn SpeechModel>>;
}

#[derive(Clone)]
struct LoadedModel {
    model: Arc<dyn SpeechModel>,
    device: &'static str,
}

/// Long-lived owner of the loaded speech model.
pub struct ModelHost {
    loader: Arc<dyn ModelLoader>,
    model_config: ModelConfig,
    device_config: DeviceConfig,
    /// Outcome of the one load; `Err` holds the failure reason.
    slot: Arc<OnceLock<Result<LoadedModel, String>>>,
    loads: Arc<AtomicUsize>,
    closed: AtomicBool,
    metrics: TtsMetrics,
}

impl std::fmt::Debug for ModelHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHost")
            .field("model", &self.model_config.name)
            .field("revision", &self.model_config.revision)
            .field("state", &self.state())
            .field("loads", &self.load_count())
            .finish()
    }
}

impl ModelHost {
    /// Create a host in the `Cold` state. Nothing is loaded until [`enter`](Self::enter).
    pub fn new(
        loader: Arc<dyn ModelLoader>,
        model_config: ModelConfig,
        device_config: DeviceConfig,
    ) -> Self {
        Self {
            loader,
            model_config,
            device_config,
            slot: Arc::new(OnceLock::new()),
            loads: Arc::new(AtomicUsize::new(0)),
            closed: AtomicBool::new(false),
            metrics: TtsMetrics,
        }
    }

    /// Bind the device, acquire the artifact and load the model.
    ///
    /// Idempotent: after the first success, later calls return immediately.
    pub async fn enter(&self) -> TtsResult<()> {
        self.model().await.map(|_| ())
    }

    /// Synthesize `prompt` into a WAV file at the model's native sample rate.
    ///
    /// Loads the model first if [`enter`](Self::enter) was never called.
    #[instrument(skip_all, fields(chars = prompt.char_count()))]
    pub async fn generate_speech(&self, prompt: &TextPrompt) -> TtsResult<WavAudio> {
        let model = self.model().await?;
        let text = prompt.as_str().to_owned();

        info!(text = %text, "Generating audio");
        let start = Instant::now();

        let result = tokio::task::spawn_blocking(move || {
            let audio = model.generate(&text)?;
            wav::encode_wav(&audio.pcm, model.sample_rate())
        })
        .await
        .map_err(|e| {
            if e.is_panic() {
                TtsError::inference("model panicked during generation")
            } else {
                TtsError::internal(format!("generation task failed: {e}"))
            }
        })
        .and_then(|r| r);

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.metrics.record_synthesis_latency(elapsed_ms);

        match &result {
            Ok(wav) => {
                self.metrics.record_audio_bytes(wav.len());
                info!(
                    bytes = wav.len(),
                    sample_rate = wav.sample_rate(),
                    elapsed_ms,
                    "Audio generation complete"
                );
            }
            Err(e) => error!(error = %e, elapsed_ms, "Audio generation failed"),
        }

        result
    }

    /// Current lifecycle state.
    pub fn state(&self) -> HostState {
        if self.closed.load(Ordering::Acquire) {
            return HostState::Closed;
        }
        match self.slot.get() {
            Some(Ok(_)) => HostState::Ready,
            Some(Err(_)) => HostState::Failed,
            None => HostState::Cold,
        }
    }

    /// Number of times the loader has been invoked.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Acquire)
    }

    /// Native sample rate of the loaded model, if loaded.
    pub fn sample_rate(&self) -> Option<u32> {
        self.loaded().map(|l| l.model.sample_rate())
    }

    /// Name of the bound device, if loaded.
    pub fn device_name(&self) -> Option<&'static str> {
        self.loaded().map(|l| l.device)
    }

    /// Teardown hook: stop accepting synthesis calls.
    ///
    /// The model itself is released when the last handle to the host drops.
    pub fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!(model = %self.model_config.name, "Model host shut down");
        }
    }

    fn loaded(&self) -> Option<&LoadedModel> {
        self.slot.get().and_then(|r| r.as_ref().ok())
    }

    async fn model(&self) -> TtsResult<Arc<dyn SpeechModel>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TtsError::unavailable("model host is shut down"));
        }

        if let Some(loaded) = self.loaded() {
            return Ok(Arc::clone(&loaded.model));
        }

        self.load().await
    }

    /// Wait for the shared load, starting it if nobody has.
    ///
    /// Every waiter blocks on the same slot from the blocking pool. The
    /// first one in runs the loader; the rest observe its outcome. Only the
    /// caller that ran a failing load sees the original error.
    async fn load(&self) -> TtsResult<Arc<dyn SpeechModel>> {
        let slot = Arc::clone(&self.slot);
        let loads = Arc::clone(&self.loads);
        let loader = Arc::clone(&self.loader);
        let model_config = self.model_config.clone();
        let device_config = self.device_config.clone();
        let metrics = self.metrics;

        tokio::task::spawn_blocking(move || {
            let mut fresh_error = None;
            let outcome = slot.get_or_init(|| {
                loads.fetch_add(1, Ordering::AcqRel);
                let result = catch_unwind(AssertUnwindSafe(|| {
                    load_model(loader.as_ref(), &model_config, &device_config)
                }))
                .unwrap_or_else(|_| {
                    Err(TtsError::model_load(&model_config.name, "loader panicked"))
                });

                match result {
                    Ok(loaded) => {
                        metrics.model_loaded();
                        Ok(loaded)
                    }
                    Err(e) => {
                        error!(error = %e, "Speech model failed to load");
                        let reason = e.to_string();
                        fresh_error = Some(e);
                        Err(reason)
                    }
                }
            });

            match (fresh_error, outcome) {
                (Some(e), _) => Err(e),
                (None, Ok(loaded)) => Ok(Arc::clone(&loaded.model)),
                (None, Err(reason)) => Err(TtsError::unavailable(format!(
                    "model failed to load: {reason}"
                ))),
            }
        })
        .await
        .map_err(|e| TtsError::model_load(&self.model_config.name, e))
        .and_then(|r| r)
    }
}

fn load_model(
    loader: &dyn ModelLoader,
    model_config: &ModelConfig,
    device_config: &DeviceConfig,
) -> TtsResult<LoadedModel> {
    info!(
        model = %model_config.name,
        revision = %model_config.revision,
        "Loading speech model"
    );
    let start = Instant::now();

    let device = device::bind_device(device_config)?;
    let artifact = artifact::resolve(model_config)?;
    let model = loader.load(&artifact, &device)?;
    let loaded = LoadedModel {
        model,
        device: device::device_name(&device),
    };

    info!(
        model = %loaded.model.name(),
        device = loaded.device,
        sample_rate = loaded.model.sample_rate(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Speech model loaded"
    );
    Ok(loaded)
}

#[async_trait]
impl Synthesizer for ModelHost {
    async fn synthesize(&self, prompt: &TextPrompt) -> TtsResult<WavAudio> {
        self.generate_speech(prompt).await
    }

    fn is_ready(&self) -> bool {
        self.state() == HostState::Ready
    }
}

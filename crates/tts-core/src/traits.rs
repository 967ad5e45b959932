//! Trait definitions at the model-host boundary.

use async_trait::async_trait;

use crate::error::TtsResult;
use crate::prompt::TextPrompt;
use crate::types::{AudioChunk, WavAudio};

/// A loaded text-to-speech model.
///
/// Implementations are shared across concurrent requests without a lock,
/// so generation must be safe to call from several threads at once.
pub trait SpeechModel: Send + Sync {
    /// Generate a mono waveform for `text`.
    fn generate(&self, text: &str) -> TtsResult<AudioChunk>;

    /// Native sample rate of generated audio in Hz.
    fn sample_rate(&self) -> u32;

    /// Model identifier for logging.
    fn name(&self) -> &str;
}

/// Request/response synthesis interface.
///
/// The HTTP adapter only sees this trait; whether synthesis runs in the
/// same process or on another machine is up to the implementation.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Convert `prompt` into WAV bytes.
    async fn synthesize(&self, prompt: &TextPrompt) -> TtsResult<WavAudio>;

    /// Whether calls are expected to succeed right now.
    fn is_ready(&self) -> bool;
}

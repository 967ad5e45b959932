//! Core data types passed between the adapter and the model host.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A chunk of decoded audio.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// PCM samples (f32, mono).
    pub pcm: Arc<[f32]>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Start time in milliseconds.
    pub start_ms: f32,
    /// End time in milliseconds.
    pub end_ms: f32,
}

impl AudioChunk {
    /// Create a new audio chunk.
    pub fn new(pcm: Vec<f32>, sample_rate: u32, start_ms: f32, end_ms: f32) -> Self {
        Self {
            pcm: pcm.into(),
            sample_rate,
            start_ms,
            end_ms,
        }
    }

    /// Create a chunk starting at zero whose end is derived from its length.
    pub fn from_samples(pcm: Vec<f32>, sample_rate: u32) -> Self {
        let end_ms = if sample_rate == 0 {
            0.0
        } else {
            pcm.len() as f32 / sample_rate as f32 * 1000.0
        };
        Self::new(pcm, sample_rate, 0.0, end_ms)
    }

    /// Get the duration of this chunk in milliseconds.
    pub fn duration_ms(&self) -> f32 {
        self.end_ms - self.start_ms
    }

    /// Get the number of samples in this chunk.
    pub fn num_samples(&self) -> usize {
        self.pcm.len()
    }
}

/// A complete WAV file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavAudio {
    bytes: Vec<u8>,
    sample_rate: u32,
}

impl WavAudio {
    /// Media type of the encoded bytes.
    pub const CONTENT_TYPE: &'static str = "audio/wav";

    /// Wrap already-encoded WAV bytes.
    pub fn new(bytes: Vec<u8>, sample_rate: u32) -> Self {
        Self { bytes, sample_rate }
    }

    /// Sample rate written into the WAV header.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Raw WAV bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the audio and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether no bytes were produced.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Lifecycle of the model host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostState {
    /// Model not yet loaded (cold start).
    Cold,
    /// Model loaded and serving.
    Ready,
    /// Cold start failed; the host will not load again.
    Failed,
    /// Torn down; no further synthesis.
    Closed,
}

impl std::fmt::Display for HostState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostState::Cold => write!(f, "cold"),
            HostState::Ready => write!(f, "ready"),
            HostState::Failed => write!(f, "failed"),
            HostState::Closed => write!(f, "closed"),
        }
    }
}

/// Request body accepted by a worker's internal synthesis endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSpeechRequest {
    /// Text to synthesize.
    pub text: String,
}

//! Deterministic tone synthesizer.
//!
//! Stands in for a neural backend: every non-whitespace character becomes a
//! Hann-windowed sine segment whose pitch is derived from the character,
//! whitespace becomes silence of the same length. The waveform is built as a
//! tensor on the bound device and copied back to host memory once.

use std::f64::consts::PI;
use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use tracing::debug;

use tts_core::{AudioChunk, SpeechModel, TtsError, TtsResult};

use crate::artifact::{ModelArtifact, ModelManifest};
use crate::host::ModelLoader;

/// Number of distinct pitches characters are folded onto.
const PITCH_STEPS: u32 = 24;

/// Semitone ratio between adjacent pitch steps.
const SEMITONE: f64 = 1.059_463_094_359_295_3;

/// Tone synthesizer bound to a device.
#[derive(Debug)]
pub struct ToneModel {
    name: String,
    manifest: ModelManifest,
    device: Device,
}

impl ToneModel {
    /// Build a model from an artifact manifest.
    pub fn new(name: impl Into<String>, manifest: ModelManifest, device: Device) -> Self {
        Self {
            name: name.into(),
            manifest,
            device,
        }
    }

    fn segment_len(&self) -> usize {
        (self.manifest.sample_rate as usize * self.manifest.segment_ms as usize) / 1000
    }

    fn pitch_hz(&self, c: char) -> f64 {
        let step = (c as u32) % PITCH_STEPS;
        self.manifest.base_frequency_hz as f64 * SEMITONE.powi(step as i32)
    }

    fn tone(&self, freq_hz: f64, len: usize) -> candle_core::Result<Tensor> {
        let t = Tensor::arange(0u32, len as u32, &self.device)?.to_dtype(DType::F32)?;
        let omega = 2.0 * PI * freq_hz / self.manifest.sample_rate as f64;
        let wave = t.affine(omega, 0.0)?.sin()?;
        // 0.5 * (1 - cos(2πn / N))
        let window = t
            .affine(2.0 * PI / len.max(1) as f64, 0.0)?
            .cos()?
            .affine(-0.5, 0.5)?;
        (wave * window)?.affine(self.manifest.amplitude as f64, 0.0)
    }

    fn render(&self, text: &str) -> candle_core::Result<Vec<f32>> {
        let len = self.segment_len();
        let mut segments = Vec::with_capacity(text.chars().count());

        for c in text.chars() {
            if c.is_whitespace() {
                segments.push(Tensor::zeros(len, DType::F32, &self.device)?);
            } else {
                segments.push(self.tone(self.pitch_hz(c), len)?);
            }
        }

        Tensor::cat(&segments, 0)?.to_vec1::<f32>()
    }
}

impl SpeechModel for ToneModel {
    fn generate(&self, text: &str) -> TtsResult<AudioChunk> {
        if text.trim().is_empty() {
            return Err(TtsError::inference("nothing to synthesize"));
        }

        let pcm = self
            .render(text)
            .map_err(|e| TtsError::inference(e.to_string()))?;

        debug!(samples = pcm.len(), "Rendered waveform");
        Ok(AudioChunk::from_samples(pcm, self.manifest.sample_rate))
    }

    fn sample_rate(&self) -> u32 {
        self.manifest.sample_rate
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Loader producing [`ToneModel`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToneLoader;

impl ModelLoader for ToneLoader {
    fn load(&self, artifact: &ModelArtifact, device: &Device) -> TtsResult<Arc<dyn SpeechModel>> {
        debug!(
            model = %artifact.name,
            revision = %artifact.revision,
            dir = ?artifact.dir,
            "Building tone model"
        );
        Ok(Arc::new(ToneModel::new(
            artifact.name.clone(),
            artifact.manifest.clone(),
            device.clone(),
        )))
    }
}

//! Pretrained model artifact acquisition.
//!
//! An artifact is a directory holding at least `config.json` (the model
//! manifest). It is resolved once per cold start from one of three sources:
//! parameters compiled into the binary, a local directory, or a Hugging Face
//! Hub repository pinned to the configured revision.

use std::path::{Path, PathBuf};

use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tts_core::{ArtifactSource, ModelConfig, TtsError, TtsResult};

/// File name of the manifest inside an artifact.
pub const MANIFEST_FILE: &str = "config.json";

/// Model parameters read from `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Native output sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Duration of the tone emitted per character.
    #[serde(default = "default_segment_ms")]
    pub segment_ms: u32,
    /// Peak amplitude in [0, 1].
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    /// Frequency of the lowest tone.
    #[serde(default = "default_base_frequency_hz")]
    pub base_frequency_hz: f32,
}

fn default_sample_rate() -> u32 {
    24000
}

fn default_segment_ms() -> u32 {
    80
}

fn default_amplitude() -> f32 {
    0.3
}

fn default_base_frequency_hz() -> f32 {
    180.0
}

impl Default for ModelManifest {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            segment_ms: default_segment_ms(),
            amplitude: default_amplitude(),
            base_frequency_hz: default_base_frequency_hz(),
        }
    }
}

impl ModelManifest {
    fn validate(&self, model: &str) -> TtsResult<()> {
        if self.sample_rate == 0 {
            return Err(TtsError::model_load(model, "sample_rate must be positive"));
        }
        if self.segment_ms == 0 {
            return Err(TtsError::model_load(model, "segment_ms must be positive"));
        }
        if !(0.0..=1.0).contains(&self.amplitude) {
            return Err(TtsError::model_load(model, "amplitude must be within [0, 1]"));
        }
        if self.base_frequency_hz <= 0.0 {
            return Err(TtsError::model_load(
                model,
                "base_frequency_hz must be positive",
            ));
        }
        Ok(())
    }
}

/// A resolved model artifact.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    /// Model name.
    pub name: String,
    /// Model revision.
    pub revision: String,
    /// Directory the manifest was read from (`None` for builtin).
    pub dir: Option<PathBuf>,
    /// Parsed manifest.
    pub manifest: ModelManifest,
}

/// Resolve the artifact named by `config`.
///
/// Blocking: may read from disk or download from the Hub.
pub fn resolve(config: &ModelConfig) -> TtsResult<ModelArtifact> {
    let (dir, manifest) = match &config.source {
        ArtifactSource::Builtin => {
            debug!(model = %config.name, "Using builtin model parameters");
            (None, ModelManifest::default())
        }
        ArtifactSource::Local { path } => {
            let manifest = read_manifest(&config.name, &path.join(MANIFEST_FILE))?;
            (Some(path.clone()), manifest)
        }
        ArtifactSource::Hub { repo } => {
            let manifest_path = download_manifest(&config.name, repo, &config.revision)?;
            let manifest = read_manifest(&config.name, &manifest_path)?;
            (manifest_path.parent().map(Path::to_path_buf), manifest)
        }
    };

    manifest.validate(&config.name)?;

    info!(
        model = %config.name,
        revision = %config.revision,
        sample_rate = manifest.sample_rate,
        "Resolved model artifact"
    );

    Ok(ModelArtifact {
        name: config.name.clone(),
        revision: config.revision.clone(),
        dir,
        manifest,
    })
}

fn read_manifest(model: &str, path: &Path) -> TtsResult<ModelManifest> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| TtsError::model_load(model, format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| TtsError::model_load(model, format!("{}: {e}", path.display())))
}

fn download_manifest(model: &str, repo: &str, revision: &str) -> TtsResult<PathBuf> {
    info!(repo, revision, "Fetching model manifest from Hugging Face Hub");

    let token = std::env::var("HF_TOKEN").ok();
    let api = ApiBuilder::new()
        .with_token(token)
        .build()
        .map_err(|e| TtsError::model_load(model, format!("hub client: {e}")))?;

    let repo = Repo::with_revision(repo.to_string(), RepoType::Model, revision.to_string());
    api.repo(repo)
        .get(MANIFEST_FILE)
        .map_err(|e| TtsError::model_load(model, format!("hub download: {e}")))
}

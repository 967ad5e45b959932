//! # runtime
//!
//! Model host runtime for the speech host.
//!
//! This crate provides:
//! - The [`ModelHost`] lifecycle (cold start, load-once, teardown)
//! - Pretrained artifact acquisition (builtin, local directory, Hugging Face Hub)
//! - Accelerator binding
//! - In-memory WAV encoding
//! - A deterministic tone synthesizer backend
//! - [`RemoteSynthesizer`] for calling a model host on another machine
//! - Structured logging and metrics

pub mod artifact;
pub mod device;
pub mod host;
pub mod logging;
pub mod metrics;
pub mod remote;
pub mod tone;
pub mod warm;
pub mod wav;

pub use artifact::{ModelArtifact, ModelManifest};
pub use host::{ModelHost, ModelLoader};
pub use metrics::TtsMetrics;
pub use remote::{GENERATE_SPEECH_PATH, RemoteSynthesizer};
pub use tone::{ToneLoader, ToneModel};

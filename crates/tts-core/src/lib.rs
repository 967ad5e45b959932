//! # tts-core
//!
//! Core types, traits, and error definitions for the speech host.
//!
//! This crate provides the foundational abstractions shared by the model
//! host and the HTTP adapter:
//!
//! - Validated prompts (`TextPrompt`) and audio containers (`AudioChunk`, `WavAudio`)
//! - The `SpeechModel` and `Synthesizer` seams
//! - Unified error handling via `TtsError`
//! - Configuration structures

pub mod config;
pub mod error;
pub mod prompt;
pub mod traits;
pub mod types;

pub use config::{
    ArtifactSource, DeploymentConfig, DeviceConfig, DevicePreference, ModelConfig, PromptLimits,
    ServerConfig, ServerRole, ServiceConfig,
};
pub use error::{TtsError, TtsResult};
pub use prompt::TextPrompt;
pub use traits::{SpeechModel, Synthesizer};
pub use types::{AudioChunk, GenerateSpeechRequest, HostState, WavAudio};

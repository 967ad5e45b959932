//! Unified error types for the speech host.

/// Main error type for speech host operations.
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    /// The pretrained model could not be acquired or loaded.
    #[error("model load failed for {model}: {reason}")]
    ModelLoad { model: String, reason: String },

    /// No usable compute device could be bound.
    #[error("device error: {0}")]
    Device(String),

    /// Model inference error.
    #[error("inference error: {0}")]
    Inference(String),

    /// Writing the WAV container failed.
    #[error("audio encode error: {0}")]
    AudioEncode(String),

    /// Invalid input provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The model host is not serving (closed or never loaded).
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// A remote model host could not be reached or answered with an error.
    #[error("remote host error: {0}")]
    Remote(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen in normal operation).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for Results with TtsError.
pub type TtsResult<T> = Result<T, TtsError>;

impl TtsError {
    /// Create a model load error for the named model.
    pub fn model_load(model: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ModelLoad {
            model: model.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a device error with message.
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Create an inference error with message.
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create an audio encode error with message.
    pub fn audio_encode(msg: impl Into<String>) -> Self {
        Self::AudioEncode(msg.into())
    }

    /// Create an invalid input error with message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an unavailable error with message.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a remote host error with message.
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    /// Create a config error with message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error with message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

impl From<serde_json::Error> for TtsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TtsError::model_load("chatterbox-tts", "config.json missing");
        assert_eq!(
            err.to_string(),
            "model load failed for chatterbox-tts: config.json missing"
        );

        let err = TtsError::invalid_input("prompt is empty");
        assert_eq!(err.to_string(), "invalid input: prompt is empty");
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(TtsError::device("no gpu"), TtsError::Device(_)));
        assert!(matches!(
            TtsError::inference("model failed"),
            TtsError::Inference(_)
        ));
        assert!(matches!(
            TtsError::audio_encode("short write"),
            TtsError::AudioEncode(_)
        ));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(TtsError::invalid_input("x").is_client_error());
        assert!(!TtsError::inference("x").is_client_error());
        assert!(!TtsError::unavailable("x").is_client_error());
    }

    #[test]
    fn test_from_serde_json() {
        let err: TtsError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, TtsError::Serialization(_)));
    }
}

//! Cross-process synthesis: forwards prompts to a worker's model host.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

use tts_core::{GenerateSpeechRequest, Synthesizer, TextPrompt, TtsError, TtsResult, WavAudio};

use crate::wav;

/// Path of the worker's internal synthesis endpoint.
pub const GENERATE_SPEECH_PATH: &str = "/internal/generate_speech";

/// [`Synthesizer`] that calls a remote worker over HTTP and waits for the
/// complete WAV payload.
#[derive(Debug, Clone)]
pub struct RemoteSynthesizer {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteSynthesizer {
    /// Create a client for the worker at `base_url` (e.g. `http://worker:8000`).
    pub fn new(base_url: &str) -> TtsResult<Self> {
        let base = base_url.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(TtsError::config(format!(
                "worker url must be http(s): {base_url}"
            )));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TtsError::config(format!("http client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{base}{GENERATE_SPEECH_PATH}"),
        })
    }

    /// Full URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Synthesizer for RemoteSynthesizer {
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn synthesize(&self, prompt: &TextPrompt) -> TtsResult<WavAudio> {
        let body = serde_json::to_vec(&GenerateSpeechRequest {
            text: prompt.as_str().to_owned(),
        })?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| TtsError::remote(format!("worker unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or(body);
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    TtsError::invalid_input(message)
                }
                StatusCode::SERVICE_UNAVAILABLE => TtsError::unavailable(message),
                _ => TtsError::remote(format!("worker returned {status}: {message}")),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::remote(format!("reading worker response: {e}")))?
            .to_vec();
        let sample_rate = wav::read_sample_rate(&bytes)
            .map_err(|e| TtsError::remote(format!("worker sent invalid audio: {e}")))?;

        debug!(bytes = bytes.len(), sample_rate, "Received audio from worker");
        Ok(WavAudio::new(bytes, sample_rate))
    }

    fn is_ready(&self) -> bool {
        true
    }
}

/// Extract `error.message` from a JSON error body.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(|m| m.as_str())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::header, response::IntoResponse, routing::post};
    use tts_core::PromptLimits;

    async fn spawn_worker(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn prompt(text: &str) -> TextPrompt {
        TextPrompt::parse(text, &PromptLimits::default()).unwrap()
    }

    #[test]
    fn test_endpoint_joining() {
        let remote = RemoteSynthesizer::new("http://worker:8000/").unwrap();
        assert_eq!(
            remote.endpoint(),
            "http://worker:8000/internal/generate_speech"
        );
        assert!(RemoteSynthesizer::new("worker:8000").is_err());
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error":{"message":"prompt cannot be empty","type":"invalid_request_error"}}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("prompt cannot be empty")
        );
        assert!(error_message("plain text").is_none());
    }

    #[tokio::test]
    async fn test_forwards_text_and_returns_wav() {
        let app = Router::new().route(
            GENERATE_SPEECH_PATH,
            post(|Json(req): Json<GenerateSpeechRequest>| async move {
                let samples = vec![0.1f32; req.text.len()];
                let wav = wav::encode_wav(&samples, 16000).unwrap();
                ([(header::CONTENT_TYPE, "audio/wav")], wav.into_bytes()).into_response()
            }),
        );
        let url = spawn_worker(app).await;

        let remote = RemoteSynthesizer::new(&url).unwrap();
        let audio = remote.synthesize(&prompt("four")).await.unwrap();

        assert_eq!(audio.sample_rate(), 16000);
        assert_eq!(audio.len(), wav::WAV_HEADER_LEN + 4 * 2);
    }

    #[tokio::test]
    async fn test_worker_error_is_mapped() {
        let app = Router::new().route(
            GENERATE_SPEECH_PATH,
            post(|| async {
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": {"message": "inference error: boom"}})),
                )
            }),
        );
        let url = spawn_worker(app).await;

        let err = RemoteSynthesizer::new(&url)
            .unwrap()
            .synthesize(&prompt("hi"))
            .await
            .unwrap_err();

        assert!(matches!(err, TtsError::Remote(_)));
        assert!(err.to_string().contains("inference error: boom"));
    }

    #[tokio::test]
    async fn test_worker_rejection_is_client_error() {
        let app = Router::new().route(
            GENERATE_SPEECH_PATH,
            post(|| async {
                (
                    axum::http::StatusCode::UNPROCESSABLE_ENTITY,
                    Json(serde_json::json!({"error": {"message": "missing field `text`"}})),
                )
            }),
        );
        let url = spawn_worker(app).await;

        let err = RemoteSynthesizer::new(&url)
            .unwrap()
            .synthesize(&prompt("hi"))
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        assert!(err.to_string().contains("missing field"));
    }

    #[tokio::test]
    async fn test_unreachable_worker() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = RemoteSynthesizer::new(&format!("http://{addr}"))
            .unwrap()
            .synthesize(&prompt("hi"))
            .await
            .unwrap_err();

        assert!(matches!(err, TtsError::Remote(_)));
    }
}

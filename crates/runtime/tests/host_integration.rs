//! Integration tests for the model host.
//!
//! These drive the host the way the server does: many prompts against one
//! host, checking the audio that comes out and how often the model loads.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use candle_core::Device;
use runtime::{ModelArtifact, ModelHost, ModelLoader, ToneLoader};
use tts_core::{
    ArtifactSource, DeviceConfig, DevicePreference, HostState, ModelConfig, PromptLimits,
    SpeechModel, Synthesizer, TextPrompt, TtsResult,
};

/// Loader wrapper that counts invocations and takes `delay` to finish.
struct CountingLoader {
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingLoader {
    fn new(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
        }
    }
}

impl Default for CountingLoader {
    fn default() -> Self {
        // Wide enough for concurrent first calls to overlap.
        Self::new(Duration::from_millis(50))
    }
}

impl ModelLoader for CountingLoader {
    fn load(&self, artifact: &ModelArtifact, device: &Device) -> TtsResult<Arc<dyn SpeechModel>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        ToneLoader.load(artifact, device)
    }
}

fn cpu() -> DeviceConfig {
    DeviceConfig {
        preference: DevicePreference::Cpu,
        ..DeviceConfig::default()
    }
}

fn prompt(text: &str) -> TextPrompt {
    TextPrompt::parse(text, &PromptLimits::default()).unwrap()
}

fn decode(bytes: &[u8]) -> (hound::WavSpec, Vec<i16>) {
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).expect("valid WAV");
    let spec = reader.spec();
    let samples = reader.samples::<i16>().map(Result::unwrap).collect();
    (spec, samples)
}

#[tokio::test]
async fn test_hello_world_is_valid_wav() {
    let host = ModelHost::new(Arc::new(ToneLoader), ModelConfig::default(), cpu());
    host.enter().await.unwrap();

    let wav = host.generate_speech(&prompt("Hello world")).await.unwrap();
    let bytes = wav.as_bytes();

    assert_eq!(&bytes[0..4], b"RIFF");
    assert!(bytes.len() > 44);

    let (spec, samples) = decode(bytes);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(Some(spec.sample_rate), host.sample_rate());
    assert!(!samples.is_empty());
}

#[tokio::test]
async fn test_distinct_texts_each_produce_valid_wav() {
    let host = ModelHost::new(Arc::new(ToneLoader), ModelConfig::default(), cpu());

    for text in ["First sentence.", "A second, longer sentence!"] {
        let wav = host.generate_speech(&prompt(text)).await.unwrap();
        let (spec, samples) = decode(wav.as_bytes());
        assert_eq!(spec.sample_rate, 24000);
        assert!(!samples.is_empty(), "{text} produced no samples");
    }
}

#[tokio::test]
async fn test_model_loads_once_across_sequential_calls() {
    let loader = Arc::new(CountingLoader::default());
    let host = ModelHost::new(loader.clone(), ModelConfig::default(), cpu());

    host.enter().await.unwrap();
    for i in 0..10 {
        host.generate_speech(&prompt(&format!("Request number {i}")))
            .await
            .unwrap();
    }
    host.enter().await.unwrap();

    assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    assert_eq!(host.load_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_model_loads_once_across_concurrent_first_calls() {
    let loader = Arc::new(CountingLoader::default());
    let host = Arc::new(ModelHost::new(
        loader.clone(),
        ModelConfig::default(),
        cpu(),
    ));

    let mut handles = Vec::new();
    for i in 0..16 {
        let host = Arc::clone(&host);
        handles.push(tokio::spawn(async move {
            host.synthesize(&prompt(&format!("concurrent {i}"))).await
        }));
    }

    for handle in handles {
        let wav = handle.await.unwrap().unwrap();
        assert_eq!(&wav.as_bytes()[0..4], b"RIFF");
    }

    assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    assert_eq!(host.state(), HostState::Ready);
}

#[tokio::test]
async fn test_abandoned_first_call_does_not_reload() {
    let loader = Arc::new(CountingLoader::new(Duration::from_millis(300)));
    let host = ModelHost::new(loader.clone(), ModelConfig::default(), cpu());

    let first = tokio::time::timeout(
        Duration::from_millis(50),
        host.generate_speech(&prompt("given up on")),
    )
    .await;
    assert!(first.is_err(), "first call should time out mid-load");

    let wav = host.generate_speech(&prompt("Hello world")).await.unwrap();
    assert_eq!(&wav.as_bytes()[0..4], b"RIFF");

    assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    assert_eq!(host.load_count(), 1);
    assert_eq!(host.state(), HostState::Ready);
}

#[tokio::test]
async fn test_abandoned_load_completes_in_background() {
    let loader = Arc::new(CountingLoader::new(Duration::from_millis(100)));
    let host = ModelHost::new(loader.clone(), ModelConfig::default(), cpu());

    let first = tokio::time::timeout(Duration::from_millis(10), host.enter()).await;
    assert!(first.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(host.state(), HostState::Ready);

    host.enter().await.unwrap();
    assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_local_artifact_sets_sample_rate() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        r#"{"sample_rate": 22050, "segment_ms": 40}"#,
    )
    .unwrap();

    let config = ModelConfig {
        source: ArtifactSource::Local {
            path: dir.path().to_path_buf(),
        },
        ..ModelConfig::default()
    };
    let host = ModelHost::new(Arc::new(ToneLoader), config, cpu());

    let wav = host.generate_speech(&prompt("Hello world")).await.unwrap();
    let (spec, samples) = decode(wav.as_bytes());

    assert_eq!(spec.sample_rate, 22050);
    assert_eq!(samples.len(), 11 * 882);
}

#[tokio::test]
async fn test_missing_local_artifact_fails_cold_start() {
    let config = ModelConfig {
        source: ArtifactSource::Local {
            path: "/nonexistent/model".into(),
        },
        ..ModelConfig::default()
    };
    let host = ModelHost::new(Arc::new(ToneLoader), config, cpu());

    assert!(host.enter().await.is_err());
    assert_eq!(host.state(), HostState::Failed);
    assert!(!host.is_ready());
}

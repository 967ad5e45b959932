use tracing::{info, warn};
use tts_core::{PromptLimits, TextPrompt, TtsResult};

use crate::host::ModelHost;

/// Load the model and run one synthesis so the first user request does not
/// pay for kernel compilation and allocator growth.
///
/// Cold-start errors propagate; a failing warmup synthesis is only logged.
pub async fn warm_model_cache(
    host: &ModelHost,
    limits: &PromptLimits,
    sample_text: &str,
) -> TtsResult<()> {
    host.enter().await?;

    let prompt = match TextPrompt::parse(sample_text, limits) {
        Ok(prompt) => prompt,
        Err(e) => {
            warn!("Skipping warmup, sample text rejected: {e}");
            return Ok(());
        }
    };

    info!("Warming model cache with sample synthesis...");
    match host.generate_speech(&prompt).await {
        Ok(wav) => info!(bytes = wav.len(), "Cold start pre-warming complete"),
        Err(e) => warn!("Warmup synthesis failed: {e}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tone::ToneLoader;
    use std::sync::Arc;
    use tts_core::{DeviceConfig, DevicePreference, HostState, ModelConfig};

    fn host() -> ModelHost {
        let device = DeviceConfig {
            preference: DevicePreference::Cpu,
            ..DeviceConfig::default()
        };
        ModelHost::new(Arc::new(ToneLoader), ModelConfig::default(), device)
    }

    #[tokio::test]
    async fn test_warmup_loads_model() {
        let host = host();
        warm_model_cache(&host, &PromptLimits::default(), "Warm up.")
            .await
            .unwrap();
        assert_eq!(host.state(), HostState::Ready);
        assert_eq!(host.load_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_sample_text_is_not_fatal() {
        let host = host();
        warm_model_cache(&host, &PromptLimits::default(), "   ")
            .await
            .unwrap();
        assert_eq!(host.state(), HostState::Ready);
    }
}

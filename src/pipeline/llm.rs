//! VLM interaction: send the prompt and image, return the raw text.
//!
//! [`InferenceClient`] is the seam between the orchestrator and the network.
//! [`ProviderClient`] implements it over any edgequake-llm provider; tests
//! substitute their own implementation.
//!
//! Exactly one request is issued per scan. There is no retry: any transport,
//! authentication, or service error fails the scan with its message passed
//! through unchanged.

use crate::config::ScanConfig;
use crate::error::ScanError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Raw text returned by one inference call, plus usage accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceResponse {
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl InferenceResponse {
    /// A response carrying only text (no token accounting).
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// One remote multimodal inference call.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send `prompt` with `image` and return the model's unstructured text.
    async fn infer(&self, prompt: &str, image: ImageData) -> Result<InferenceResponse, ScanError>;
}

/// [`InferenceClient`] backed by an edgequake-llm provider.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ScanConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }
}

#[async_trait]
impl InferenceClient for ProviderClient {
    async fn infer(&self, prompt: &str, image: ImageData) -> Result<InferenceResponse, ScanError> {
        let start = Instant::now();

        // Prompt and image travel together in a single user turn.
        let messages = vec![ChatMessage::user_with_images(prompt, vec![image])];

        match self.provider.chat(&messages, Some(&self.options)).await {
            Ok(response) => {
                debug!(
                    "Inference: {} input tokens, {} output tokens, {:?}",
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                Ok(InferenceResponse {
                    text: response.content,
                    input_tokens: response.prompt_tokens,
                    output_tokens: response.completion_tokens,
                })
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Inference failed after {:?}: {}", start.elapsed(), message);
                Err(ScanError::InferenceFailed { message })
            }
        }
    }
}

/// Build `CompletionOptions` from the scan config.
fn build_options(config: &ScanConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(&'static str);

    #[async_trait]
    impl InferenceClient for Canned {
        async fn infer(&self, prompt: &str, _image: ImageData) -> Result<InferenceResponse, ScanError> {
            assert!(!prompt.is_empty());
            Ok(InferenceResponse::text(self.0))
        }
    }

    #[test]
    fn build_options_defaults() {
        let config = ScanConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(2048));
    }

    #[test]
    fn trait_object_is_callable() {
        let client: Arc<dyn InferenceClient> = Arc::new(Canned("{}"));
        let image = ImageData::new("AAAA".to_string(), "image/png");
        let response = tokio_test::block_on(client.infer("prompt", image)).unwrap();
        assert_eq!(response.text, "{}");
        assert_eq!(response.input_tokens, 0);
    }
}

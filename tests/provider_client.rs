//! Scans routed through a real edgequake-llm provider object.
//!
//! `ScanConfig::provider` takes the `ProviderClient` path, so these cover the
//! chat request, response mapping and error passthrough without the network.

use async_trait::async_trait;
use edgequake_llm::{
    ChatMessage, CompletionOptions, LLMProvider, LLMResponse, LlmError, MockProvider,
};
use imei_scan::{AnalysisOutcome, OutcomeKind, ScanConfig, ScanError, ScanRequest};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";

fn png() -> ScanRequest {
    ScanRequest::new(PNG_MAGIC, "image/png")
}

fn config_for(provider: Arc<dyn LLMProvider>) -> ScanConfig {
    ScanConfig::builder().provider(provider).build().unwrap()
}

/// Provider whose every chat call fails with a network error.
#[derive(Default)]
struct Unreachable {
    calls: AtomicUsize,
}

#[async_trait]
impl LLMProvider for Unreachable {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn model(&self) -> &str {
        "unreachable-model"
    }

    fn max_context_length(&self) -> usize {
        4096
    }

    async fn complete(&self, _prompt: &str) -> edgequake_llm::Result<LLMResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LlmError::NetworkError("connection reset by peer".into()))
    }

    async fn complete_with_options(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> edgequake_llm::Result<LLMResponse> {
        self.complete(prompt).await
    }

    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _options: Option<&CompletionOptions>,
    ) -> edgequake_llm::Result<LLMResponse> {
        self.complete("").await
    }
}

#[tokio::test]
async fn mock_provider_reply_becomes_success() {
    let mock = MockProvider::new();
    mock.add_response(
        "```json\n{\"description\":\"one box\",\"deviceCount\":1,\"devices\":[{\"position\":\"center\",\"imei\":\"351756051523999\"}]}\n```",
    )
    .await;

    let outcome = imei_scan::scan(png(), &config_for(Arc::new(mock))).await;
    let result = match outcome {
        AnalysisOutcome::Success(result) => result,
        other => panic!("expected success, got {other:?}"),
    };
    assert_eq!(result.description, "one box");
    assert_eq!(result.device_count, 1);
    assert_eq!(result.devices[0].position, "center");
    assert_eq!(result.devices[0].imei, "351756051523999");
}

#[tokio::test]
async fn exhausted_mock_placeholder_text_is_soft_error() {
    // With nothing queued the mock answers "Mock response", which is prose.
    let outcome = imei_scan::scan(png(), &config_for(Arc::new(MockProvider::new()))).await;
    assert_eq!(outcome.kind(), OutcomeKind::SoftError);
    assert!(outcome.devices().is_empty());
}

#[tokio::test]
async fn provider_error_message_passes_through_without_retry() {
    let provider = Arc::new(Unreachable::default());
    let outcome = imei_scan::scan(
        png(),
        &config_for(Arc::clone(&provider) as Arc<dyn LLMProvider>),
    )
    .await;

    match outcome {
        AnalysisOutcome::HardError(ScanError::InferenceFailed { ref message }) => {
            assert_eq!(
                message,
                &LlmError::NetworkError("connection reset by peer".into()).to_string()
            );
            assert!(message.contains("connection reset by peer"));
        }
        ref other => panic!("expected InferenceFailed, got {other:?}"),
    }
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

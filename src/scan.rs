//! Scan orchestration: encode → prompt → call → extract → validate.
//!
//! Every invocation walks the same stages:
//!
//! ```text
//! Idle ─▶ Encoding ─▶ AwaitingInference ─▶ Validating ─▶ Succeeded
//!            │               │                  │
//!            └── HardError ──┴── HardError      └── SoftError ─▶ Failed
//! ```
//!
//! Nothing survives between calls: the encoded image, the raw response and
//! the parsed result are all local to one [`scan`]. Callers that need a
//! deadline wrap the future in their own timeout; the core imposes none.

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::input::{load_request, ScanRequest};
use crate::output::AnalysisOutcome;
use crate::pipeline::llm::{InferenceClient, ProviderClient};
use crate::pipeline::{encode, extract, validate};
use crate::prompts;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Orchestrator state for one invocation.
///
/// Every run starts in `Idle`, which is never reported. Observers see each
/// working stage as it is entered and then exactly one terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanStage {
    Idle,
    Encoding,
    AwaitingInference,
    Validating,
    Succeeded,
    Failed,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScanStage::Idle => "idle",
            ScanStage::Encoding => "encoding",
            ScanStage::AwaitingInference => "awaiting inference",
            ScanStage::Validating => "validating",
            ScanStage::Succeeded => "succeeded",
            ScanStage::Failed => "failed",
        })
    }
}

/// Tracks the current stage and reports transitions.
struct ScanRun<'a> {
    config: &'a ScanConfig,
    stage: ScanStage,
    start: Instant,
}

impl<'a> ScanRun<'a> {
    fn new(config: &'a ScanConfig) -> Self {
        Self {
            config,
            stage: ScanStage::Idle,
            start: Instant::now(),
        }
    }

    fn enter(&mut self, stage: ScanStage) {
        debug!("Scan stage: {} → {}", self.stage, stage);
        self.stage = stage;
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage(stage);
        }
    }

    fn hard(self, err: ScanError) -> AnalysisOutcome {
        warn!("Scan failed during {}: {}", self.stage, err);
        self.finish(AnalysisOutcome::HardError(err))
    }

    fn finish(mut self, outcome: AnalysisOutcome) -> AnalysisOutcome {
        let terminal = if outcome.is_success() {
            ScanStage::Succeeded
        } else {
            ScanStage::Failed
        };
        self.enter(terminal);

        info!(
            "Scan complete: {:?}, {} devices, {}ms",
            outcome.kind(),
            outcome.devices().len(),
            self.start.elapsed().as_millis()
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_scan_complete(outcome.kind());
        }
        outcome
    }
}

/// Scan one packaging photo.
///
/// This is the primary entry point for the library. It never panics and never
/// returns `Err`: every failure is folded into the returned
/// [`AnalysisOutcome`].
///
/// # Outcomes
/// - `HardError` — unsupported/empty image (no network call made), provider
///   not configured, or the single inference call failed
/// - `SoftError` — the model answered but the answer was not a valid payload
/// - `Success`   — a parsed [`crate::output::ScanResult`]; if the model flagged
///   the image as unusable, `soft_error` is set and the device list is empty
pub async fn scan(request: ScanRequest, config: &ScanConfig) -> AnalysisOutcome {
    let mut run = ScanRun::new(config);
    info!(
        "Starting scan: {} bytes, declared {}",
        request.bytes().len(),
        request.media_type()
    );

    // ── Step 1: Encode ───────────────────────────────────────────────────
    run.enter(ScanStage::Encoding);
    let image = match encode::encode_image(&request) {
        Ok(image) => image,
        Err(e) => return run.hard(e),
    };
    drop(request);

    // ── Step 2: Resolve client (credentials are read here, not earlier) ──
    run.enter(ScanStage::AwaitingInference);
    let client = match resolve_client(config) {
        Ok(client) => client,
        Err(e) => return run.hard(e),
    };

    // ── Step 3: Inference ────────────────────────────────────────────────
    let response = match client.infer(prompts::scan_prompt(), image).await {
        Ok(response) => response,
        Err(e) => return run.hard(e),
    };
    debug!("Raw response: {} bytes", response.text.len());
    if let Some(ref cb) = config.progress_callback {
        cb.on_inference_complete(response.text.len());
    }

    // ── Step 4: Extract + validate ───────────────────────────────────────
    run.enter(ScanStage::Validating);
    let extraction = extract::extract_candidate(&response.text);
    debug!(
        "Extracted {} bytes via {} strategy",
        extraction.candidate.len(),
        extraction.strategy
    );

    let outcome = match validate::validate_candidate(extraction) {
        Ok(result) => {
            let result = result.enforce_soft_error();
            if let Some(ref message) = result.soft_error {
                warn!("Model declared the image unusable: {}", message);
            } else if let Some(mismatch) = result.count_mismatch() {
                warn!("Device count mismatch: {}", mismatch);
            }
            AnalysisOutcome::Success(result)
        }
        Err(e) => {
            warn!("Unparseable model response ({}): {}", e.strategy, e.detail);
            AnalysisOutcome::SoftError(e)
        }
    };

    run.finish(outcome)
}

/// Resolve `input` (path, `data:` URL, or HTTP(S) URL) and scan it.
///
/// Input failures are reported as `HardError` like every other pre-network
/// failure.
pub async fn scan_input(input: impl AsRef<str>, config: &ScanConfig) -> AnalysisOutcome {
    match load_request(input.as_ref(), config.download_timeout_secs).await {
        Ok(request) => scan(request, config).await,
        Err(e) => {
            warn!("Could not load input: {}", e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_stage(ScanStage::Failed);
                cb.on_scan_complete(crate::output::OutcomeKind::HardError);
            }
            AnalysisOutcome::HardError(e)
        }
    }
}

/// Synchronous wrapper around [`scan`].
///
/// Creates a temporary tokio runtime internally.
pub fn scan_sync(request: ScanRequest, config: &ScanConfig) -> AnalysisOutcome {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(scan(request, config)),
        Err(e) => AnalysisOutcome::HardError(ScanError::Internal(format!(
            "Failed to create tokio runtime: {e}"
        ))),
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the inference client, from most-specific to least-specific:
///
/// 1. **Pre-built client** (`config.client`)
/// 2. **Pre-built provider** (`config.provider`)
/// 3. **Named provider + model** (`config.provider_name`)
/// 4. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`)
/// 5. **Gemini key** (`GEMINI_API_KEY`) with the configured model
/// 6. **Full auto-detection** (`ProviderFactory::from_env`)
fn resolve_client(config: &ScanConfig) -> Result<Arc<dyn InferenceClient>, ScanError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }
    let provider = resolve_provider(config)?;
    Ok(Arc::new(ProviderClient::new(provider, config)))
}

fn resolve_provider(config: &ScanConfig) -> Result<Arc<dyn LLMProvider>, ScanError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            return create_vision_provider("gemini", config.model_or_default());
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ScanError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or ANTHROPIC_API_KEY.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ScanError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ScanError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutcomeKind;
    use crate::pipeline::llm::InferenceResponse;
    use crate::progress::ScanProgressCallback;
    use async_trait::async_trait;
    use edgequake_llm::ImageData;
    use std::sync::Mutex;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    struct Reply(Result<&'static str, &'static str>);

    #[async_trait]
    impl InferenceClient for Reply {
        async fn infer(&self, _prompt: &str, _image: ImageData) -> Result<InferenceResponse, ScanError> {
            match self.0 {
                Ok(text) => Ok(InferenceResponse::text(text)),
                Err(message) => Err(ScanError::InferenceFailed {
                    message: message.into(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct Stages(Mutex<Vec<ScanStage>>, Mutex<Vec<OutcomeKind>>);

    impl ScanProgressCallback for Stages {
        fn on_stage(&self, stage: ScanStage) {
            self.0.lock().unwrap().push(stage);
        }
        fn on_scan_complete(&self, kind: OutcomeKind) {
            self.1.lock().unwrap().push(kind);
        }
    }

    fn config_with(reply: Reply, stages: Arc<Stages>) -> ScanConfig {
        ScanConfig::builder()
            .client(Arc::new(reply))
            .progress_callback(stages)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn success_walks_every_stage() {
        let stages = Arc::new(Stages::default());
        let config = config_with(
            Reply(Ok(r#"{"description":"d","deviceCount":0,"devices":[]}"#)),
            Arc::clone(&stages),
        );
        let outcome = scan(ScanRequest::new(PNG_MAGIC, "image/png"), &config).await;
        assert!(outcome.is_success());
        assert_eq!(
            *stages.0.lock().unwrap(),
            vec![
                ScanStage::Encoding,
                ScanStage::AwaitingInference,
                ScanStage::Validating,
                ScanStage::Succeeded
            ]
        );
        assert_eq!(*stages.1.lock().unwrap(), vec![OutcomeKind::Success]);
    }

    #[tokio::test]
    async fn encoding_failure_stops_before_inference() {
        let stages = Arc::new(Stages::default());
        let config = config_with(Reply(Ok("{}")), Arc::clone(&stages));
        let outcome = scan(ScanRequest::new(b"GIF89a".to_vec(), "image/gif"), &config).await;
        assert_eq!(outcome.kind(), OutcomeKind::HardError);
        assert_eq!(
            *stages.0.lock().unwrap(),
            vec![ScanStage::Encoding, ScanStage::Failed]
        );
    }

    #[tokio::test]
    async fn inference_failure_is_hard() {
        let stages = Arc::new(Stages::default());
        let config = config_with(Reply(Err("401 Unauthorized")), Arc::clone(&stages));
        let outcome = scan(ScanRequest::new(PNG_MAGIC, "image/png"), &config).await;
        match outcome {
            AnalysisOutcome::HardError(ScanError::InferenceFailed { message }) => {
                assert_eq!(message, "401 Unauthorized")
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let seen = stages.0.lock().unwrap();
        assert!(!seen.contains(&ScanStage::Validating));
        assert_eq!(seen.last(), Some(&ScanStage::Failed));
    }

    #[tokio::test]
    async fn missing_provider_fails_while_awaiting_inference() {
        let stages = Arc::new(Stages::default());
        let config = ScanConfig::builder()
            .provider_name("no-such-provider")
            .progress_callback(stages.clone())
            .build()
            .unwrap();
        let outcome = scan(ScanRequest::new(PNG_MAGIC, "image/png"), &config).await;
        assert!(matches!(
            outcome,
            AnalysisOutcome::HardError(ScanError::ProviderNotConfigured { .. })
        ));
        assert_eq!(
            *stages.0.lock().unwrap(),
            vec![
                ScanStage::Encoding,
                ScanStage::AwaitingInference,
                ScanStage::Failed
            ]
        );
    }

    #[tokio::test]
    async fn input_failure_reports_terminal_stage() {
        let stages = Arc::new(Stages::default());
        let config = config_with(Reply(Ok("{}")), Arc::clone(&stages));
        let outcome = scan_input("/definitely/not/here.png", &config).await;
        assert_eq!(outcome.kind(), OutcomeKind::HardError);
        assert_eq!(*stages.0.lock().unwrap(), vec![ScanStage::Failed]);
        assert_eq!(*stages.1.lock().unwrap(), vec![OutcomeKind::HardError]);
    }

    #[tokio::test]
    async fn unparseable_response_is_soft() {
        let stages = Arc::new(Stages::default());
        let config = config_with(Reply(Ok("no idea")), Arc::clone(&stages));
        let outcome = scan(ScanRequest::new(PNG_MAGIC, "image/png"), &config).await;
        assert_eq!(outcome.kind(), OutcomeKind::SoftError);
        assert_eq!(*stages.1.lock().unwrap(), vec![OutcomeKind::SoftError]);
    }

    #[test]
    fn scan_sync_runs_outside_a_runtime() {
        let config = ScanConfig::builder()
            .client(Arc::new(Reply(Ok(r#"{"deviceCount":0,"devices":[]}"#))))
            .build()
            .unwrap();
        let outcome = scan_sync(ScanRequest::new(PNG_MAGIC, "image/png"), &config);
        assert!(outcome.is_success());
    }

    #[test]
    fn stage_display() {
        assert_eq!(ScanStage::AwaitingInference.to_string(), "awaiting inference");
    }
}

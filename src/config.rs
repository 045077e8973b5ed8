//! Configuration for a scan.
//!
//! All scan behaviour is controlled through [`ScanConfig`], built via its
//! [`ScanConfigBuilder`]. The builder lets callers set only what they care
//! about and rely on documented defaults for the rest.
//!
//! No credential is read here. Provider resolution happens inside
//! [`crate::scan::scan`], so a missing API key surfaces as a hard error on the
//! first scan rather than when the config is built.

use crate::error::ScanError;
use crate::pipeline::llm::InferenceClient;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Default vision model.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Configuration for image scanning.
///
/// # Example
/// ```rust
/// use imei_scan::ScanConfig;
///
/// let config = ScanConfig::builder()
///     .model("gemini-2.0-flash")
///     .provider_name("gemini")
///     .temperature(0.0)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ScanConfig {
    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic", "ollama").
    /// If None, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed inference client. Takes precedence over everything
    /// else; used for custom transports and tests.
    pub client: Option<Arc<dyn InferenceClient>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Digit transcription wants a deterministic model.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 2048.
    ///
    /// A box photo with twenty devices needs roughly 1 000 output tokens.
    pub max_tokens: usize,

    /// Download timeout for URL inputs in seconds. Default: 60.
    pub download_timeout_secs: u64,

    /// Stage observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            client: None,
            temperature: 0.1,
            max_tokens: 2048,
            download_timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("client", &self.client.as_ref().map(|_| "<dyn InferenceClient>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl ScanConfig {
    /// Create a new builder for `ScanConfig`.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model that will be requested.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`ScanConfig`].
#[derive(Debug)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn client(mut self, client: Arc<dyn InferenceClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScanConfig, ScanError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(ScanError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.download_timeout_secs == 0 {
            return Err(ScanError::InvalidConfig(
                "download timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

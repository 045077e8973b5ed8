//! Error types for the imei-scan library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ScanError`] — **Hard**: the scan cannot produce any usable payload
//!   (unsupported image, provider not configured, transport or service
//!   failure). Carried by [`crate::output::AnalysisOutcome::HardError`].
//!
//! * [`SoftParseError`] — **Soft**: the inference call succeeded but its text
//!   could not be interpreted as a scan result. Carried by
//!   [`crate::output::AnalysisOutcome::SoftError`] and rendered as a
//!   recoverable "try a clearer image" message.
//!
//! A third failure, the model declaring the image unusable, is not an error
//! type at all: it arrives as a successful [`crate::output::ScanResult`] whose
//! `soft_error` field is set.

use crate::pipeline::extract::ExtractionStrategy;
use std::path::PathBuf;
use thiserror::Error;

/// User-facing text shown whenever the model's answer could not be parsed.
pub const SOFT_PARSE_MESSAGE: &str =
    "Could not understand the AI response. Please try again with a clearer image.";

/// All hard errors returned by the imei-scan library.
#[derive(Debug, Error)]
pub enum ScanError {
    // ── Encoding errors ───────────────────────────────────────────────────
    /// The image type is not on the allow-list (JPEG, PNG).
    #[error("Unsupported image type '{media_type}'. Only JPEG and PNG images are accepted.")]
    UnsupportedMediaType { media_type: String },

    /// The image payload contained no bytes.
    #[error("Image is empty: no bytes were provided")]
    EmptyImage,

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a file path, data URL, or HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file path, data URL, or valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// A `data:` URL was malformed or not base64-encoded.
    #[error("Invalid data URL: {reason}")]
    InvalidDataUrl { reason: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Inference errors ──────────────────────────────────────────────────
    /// No provider could be constructed (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Transport, authentication, or service-side failure. The message is
    /// passed through verbatim from the provider.
    #[error("API Error: {message}")]
    InferenceFailed { message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the CSV export.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScanError {
    /// True for failures detected before any network call was attempted
    /// because the image is missing, unreadable or of an unsupported type.
    pub fn is_encoding_error(&self) -> bool {
        matches!(
            self,
            ScanError::UnsupportedMediaType { .. }
                | ScanError::EmptyImage
                | ScanError::FileNotFound { .. }
                | ScanError::PermissionDenied { .. }
                | ScanError::InvalidInput { .. }
                | ScanError::InvalidDataUrl { .. }
        )
    }
}

/// The inference call succeeded but its payload did not match the expected
/// schema.
///
/// `Display` always yields [`SOFT_PARSE_MESSAGE`]; the underlying parser
/// diagnostic is kept in `detail` for logs and never shown to end users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", SOFT_PARSE_MESSAGE)]
pub struct SoftParseError {
    /// Which extraction strategy produced the rejected candidate.
    pub strategy: ExtractionStrategy,
    /// Parser diagnostic (line/column, missing field, ...).
    pub detail: String,
}

impl SoftParseError {
    /// The fixed user-facing message.
    pub fn user_message(&self) -> &'static str {
        SOFT_PARSE_MESSAGE
    }
}

//! Result validation: extracted candidate → [`ScanResult`].
//!
//! The schema lives on [`ScanResult`] itself (serde attributes) and must stay
//! in step with [`crate::prompts::SCAN_PROMPT`]. Required fields are
//! `deviceCount` (non-negative integer) and `devices` (array of
//! `{position, imei}`); `description` defaults to empty and `error` is
//! optional.
//!
//! Any failure becomes a [`SoftParseError`], never a hard error: the remote
//! call succeeded, only its payload was unusable. The soft-content invariant
//! is not applied here; see [`ScanResult::enforce_soft_error`].

use crate::error::SoftParseError;
use crate::output::ScanResult;
use crate::pipeline::extract::Extraction;
use tracing::debug;

/// Parse an extraction candidate into a [`ScanResult`].
pub fn validate_candidate(extraction: Extraction<'_>) -> Result<ScanResult, SoftParseError> {
    let candidate = extraction.candidate.trim();
    if candidate.is_empty() {
        return Err(SoftParseError {
            strategy: extraction.strategy,
            detail: "empty response".into(),
        });
    }

    serde_json::from_str::<ScanResult>(candidate).map_err(|e| {
        debug!("Rejected {} candidate: {}", extraction.strategy, e);
        SoftParseError {
            strategy: extraction.strategy,
            detail: e.to_string(),
        }
    })
}

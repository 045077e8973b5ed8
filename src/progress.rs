//! Progress-callback trait for scan stage events.
//!
//! Inject an [`Arc<dyn ScanProgressCallback>`] via
//! [`crate::config::ScanConfigBuilder::progress_callback`] to observe the
//! orchestrator moving through its stages, e.g. to drive a spinner or to
//! disable a submit button while a scan is in flight.
//!
//! # Example
//!
//! ```rust
//! use imei_scan::{ScanConfig, ScanProgressCallback, ScanStage};
//! use std::sync::Arc;
//!
//! struct PrintStages;
//!
//! impl ScanProgressCallback for PrintStages {
//!     fn on_stage(&self, stage: ScanStage) {
//!         eprintln!("→ {stage}");
//!     }
//! }
//!
//! let config = ScanConfig::builder()
//!     .progress_callback(Arc::new(PrintStages))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::OutcomeKind;
use crate::scan::ScanStage;
use std::sync::Arc;

/// Called by the orchestrator as a scan progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ScanProgressCallback: Send + Sync {
    /// Called on entry to each working stage (`Encoding`,
    /// `AwaitingInference`, `Validating`) and once more with the terminal
    /// `Succeeded` or `Failed`. `Idle` is never reported.
    fn on_stage(&self, stage: ScanStage) {
        let _ = stage;
    }

    /// Called once the inference call returned text.
    ///
    /// # Arguments
    /// * `response_len` — byte length of the raw response
    fn on_inference_complete(&self, response_len: usize) {
        let _ = response_len;
    }

    /// Called exactly once per scan with the terminal outcome kind.
    fn on_scan_complete(&self, kind: OutcomeKind) {
        let _ = kind;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ScanProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ScanConfig`].
pub type ProgressCallback = Arc<dyn ScanProgressCallback>;

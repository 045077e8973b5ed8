//! # imei-scan
//!
//! Read device positions and IMEI numbers off a photo of device packaging
//! using a Vision Language Model (VLM).
//!
//! The model does the visual work. This crate turns a raw image into one
//! well-typed [`AnalysisOutcome`]: it encodes the image, sends a fixed
//! prompt, digs the JSON answer out of whatever text comes back, validates
//! it, and classifies every failure.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image bytes
//!  │
//!  ├─ 1. Encode    JPEG/PNG allow-list → base64 ImageData
//!  ├─ 2. Prompt    fixed JSON-schema instruction
//!  ├─ 3. VLM       one call, no retry
//!  ├─ 4. Extract   fenced block → brace scan → raw text
//!  ├─ 5. Validate  serde into ScanResult
//!  └─ 6. Outcome   Success | SoftError | HardError
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imei_scan::{scan, AnalysisOutcome, ScanConfig, ScanRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / ANTHROPIC_API_KEY
//!     let config = ScanConfig::default();
//!     let request = ScanRequest::from_path("boxes.jpg")?;
//!     match scan(request, &config).await {
//!         AnalysisOutcome::Success(result) => {
//!             for device in &result.devices {
//!                 println!("{}: {}", device.position, device.imei);
//!             }
//!         }
//!         AnalysisOutcome::SoftError(e) => eprintln!("{e}"),
//!         AnalysisOutcome::HardError(e) => eprintln!("{e}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `imei-scan` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod scan;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ScanConfig, ScanConfigBuilder, DEFAULT_MODEL};
pub use error::{ScanError, SoftParseError, SOFT_PARSE_MESSAGE};
pub use export::{default_csv_filename, devices_to_csv, write_csv};
pub use input::{MediaType, ScanRequest};
pub use output::{AnalysisOutcome, CountMismatch, DeviceRecord, OutcomeKind, ScanResult};
pub use pipeline::extract::{extract_candidate, Extraction, ExtractionStrategy};
pub use pipeline::llm::{InferenceClient, InferenceResponse, ProviderClient};
pub use progress::{NoopProgressCallback, ProgressCallback, ScanProgressCallback};
pub use scan::{scan, scan_input, scan_sync, ScanStage};

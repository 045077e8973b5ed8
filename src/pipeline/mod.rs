//! Pipeline stages for image-to-device-list scanning.
//!
//! Each submodule implements exactly one transformation step so each is
//! independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! encode ──▶ llm ──▶ extract ──▶ validate
//! (base64)   (VLM)   (find JSON)  (serde)
//! ```
//!
//! 1. [`encode`]   — allow-list check and base64 wrap of the request image
//! 2. [`llm`]      — one VLM call; the only stage with network I/O
//! 3. [`extract`]  — ordered strategies to find the JSON object in free text
//! 4. [`validate`] — parse the candidate into [`crate::output::ScanResult`]

pub mod encode;
pub mod extract;
pub mod llm;
pub mod validate;

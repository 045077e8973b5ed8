//! Result types returned by a scan.
//!
//! [`ScanResult`] doubles as the wire schema requested by
//! [`crate::prompts::SCAN_PROMPT`]: its serde attributes define exactly which
//! JSON the validator accepts.

use crate::error::{ScanError, SoftParseError};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One device located on the packaging photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Free-text locator, e.g. "top-left" or "second from left".
    pub position: String,
    /// IMEI as reported by the model. Not checksum-validated.
    #[serde(deserialize_with = "string_or_number")]
    pub imei: String,
}

/// Parsed model answer for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// One or two sentences describing the image. Missing or `null` reads
    /// as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Device count as reported by the model.
    pub device_count: u32,
    /// Devices in the order the model listed them.
    pub devices: Vec<DeviceRecord>,
    /// Set when the model judged the image unusable.
    #[serde(
        rename = "error",
        alias = "softError",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub soft_error: Option<String>,
}

impl ScanResult {
    /// Apply the soft-content invariant: a result that carries a soft error
    /// reports zero devices. Blank error strings are treated as absent.
    pub fn enforce_soft_error(mut self) -> Self {
        if self
            .soft_error
            .as_deref()
            .is_some_and(|e| e.trim().is_empty())
        {
            self.soft_error = None;
        }
        if self.soft_error.is_some() {
            self.device_count = 0;
            self.devices.clear();
        }
        self
    }

    /// Returns the disagreement between `device_count` and `devices.len()`,
    /// if any. Neither value is corrected.
    pub fn count_mismatch(&self) -> Option<CountMismatch> {
        let listed = self.devices.len();
        if self.device_count as usize != listed {
            Some(CountMismatch {
                reported: self.device_count,
                listed,
            })
        } else {
            None
        }
    }
}

/// The model's own count disagrees with the list it returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountMismatch {
    pub reported: u32,
    pub listed: usize,
}

impl fmt::Display for CountMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "model reported {} devices but listed {}",
            self.reported, self.listed
        )
    }
}

/// Discriminant of an [`AnalysisOutcome`], convenient for callbacks and
/// exit-code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    SoftError,
    HardError,
}

/// The orchestrator's only return shape.
///
/// A `Success` may still carry a soft-content message in
/// [`ScanResult::soft_error`]; in that case its device list is empty.
#[derive(Debug)]
pub enum AnalysisOutcome {
    /// The model answered with a well-formed payload.
    Success(ScanResult),
    /// The model answered, but its text was not interpretable.
    SoftError(SoftParseError),
    /// The pipeline aborted (unsupported image, transport/service failure).
    HardError(ScanError),
}

impl AnalysisOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            AnalysisOutcome::Success(_) => OutcomeKind::Success,
            AnalysisOutcome::SoftError(_) => OutcomeKind::SoftError,
            AnalysisOutcome::HardError(_) => OutcomeKind::HardError,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Success(_))
    }

    /// The parsed result, if the scan succeeded.
    pub fn result(&self) -> Option<&ScanResult> {
        match self {
            AnalysisOutcome::Success(r) => Some(r),
            _ => None,
        }
    }

    /// Detected devices; empty for every error path.
    pub fn devices(&self) -> &[DeviceRecord] {
        self.result().map(|r| r.devices.as_slice()).unwrap_or(&[])
    }

    /// Message for an error banner: the hard error text, the fixed soft-parse
    /// message, or the model's own soft-content message.
    pub fn message(&self) -> Option<String> {
        match self {
            AnalysisOutcome::Success(r) => r.soft_error.clone(),
            AnalysisOutcome::SoftError(e) => Some(e.to_string()),
            AnalysisOutcome::HardError(e) => Some(e.to_string()),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept IMEIs emitted either as JSON strings or as bare integers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::ExtractionStrategy;

    fn device(position: &str, imei: &str) -> DeviceRecord {
        DeviceRecord {
            position: position.into(),
            imei: imei.into(),
        }
    }

    #[test]
    fn null_description_keeps_model_error() {
        let r: ScanResult = serde_json::from_str(
            r#"{"description":null,"deviceCount":0,"devices":[],"error":"blurry"}"#,
        )
        .unwrap();
        assert_eq!(r.description, "");
        assert_eq!(r.soft_error.as_deref(), Some("blurry"));
    }

    #[test]
    fn soft_error_forces_zero_devices() {
        let r = ScanResult {
            description: "blurry".into(),
            device_count: 2,
            devices: vec![device("left", "1")],
            soft_error: Some("too blurry".into()),
        }
        .enforce_soft_error();
        assert_eq!(r.device_count, 0);
        assert!(r.devices.is_empty());
        assert_eq!(r.soft_error.as_deref(), Some("too blurry"));
    }

    #[test]
    fn blank_soft_error_is_dropped() {
        let r = ScanResult {
            description: String::new(),
            device_count: 1,
            devices: vec![device("left", "1")],
            soft_error: Some("  ".into()),
        }
        .enforce_soft_error();
        assert_eq!(r.soft_error, None);
        assert_eq!(r.devices.len(), 1);
    }

    #[test]
    fn count_mismatch_detected() {
        let r = ScanResult {
            description: String::new(),
            device_count: 3,
            devices: vec![device("a", "1")],
            soft_error: None,
        };
        let m = r.count_mismatch().unwrap();
        assert_eq!(m.reported, 3);
        assert_eq!(m.listed, 1);
        assert!(m.to_string().contains("reported 3"));
    }

    #[test]
    fn serialises_with_wire_field_names() {
        let r = ScanResult {
            description: "x".into(),
            device_count: 0,
            devices: vec![],
            soft_error: Some("blurry".into()),
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"deviceCount\":0"));
        assert!(json.contains("\"error\":\"blurry\""));
    }

    #[test]
    fn numeric_imei_becomes_string() {
        let d: DeviceRecord =
            serde_json::from_str(r#"{"position":"left","imei":351756051523999}"#).unwrap();
        assert_eq!(d.imei, "351756051523999");
    }

    #[test]
    fn outcome_devices_empty_on_errors() {
        let soft = AnalysisOutcome::SoftError(SoftParseError {
            strategy: ExtractionStrategy::Raw,
            detail: "eof".into(),
        });
        assert!(soft.devices().is_empty());
        assert_eq!(soft.kind(), OutcomeKind::SoftError);

        let hard = AnalysisOutcome::HardError(ScanError::EmptyImage);
        assert!(hard.devices().is_empty());
        assert!(hard.message().unwrap().contains("empty"));
    }
}

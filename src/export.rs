//! CSV projection of detected devices.
//!
//! Format: header `Position,IMEI`, one row per device, rows joined by `\n`,
//! no trailing newline. Fields are written verbatim without quoting; IMEIs
//! are numeric, and a position containing a comma will shift columns.

use crate::error::ScanError;
use crate::output::DeviceRecord;
use chrono::NaiveDate;
use std::path::Path;
use tracing::info;

/// CSV header row.
pub const CSV_HEADER: &str = "Position,IMEI";

/// Render devices as CSV text.
pub fn devices_to_csv(devices: &[DeviceRecord]) -> String {
    std::iter::once(CSV_HEADER.to_string())
        .chain(
            devices
                .iter()
                .map(|d| format!("{},{}", d.position, d.imei)),
        )
        .collect::<Vec<_>>()
        .join("\n")
}

/// `imei-scan-YYYY-MM-DD.csv` for the given date.
pub fn csv_filename(date: NaiveDate) -> String {
    format!("imei-scan-{}.csv", date.format("%Y-%m-%d"))
}

/// `imei-scan-YYYY-MM-DD.csv` for today's local date.
pub fn default_csv_filename() -> String {
    csv_filename(chrono::Local::now().date_naive())
}

/// Write devices as CSV to `path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_csv(devices: &[DeviceRecord], path: impl AsRef<Path>) -> Result<(), ScanError> {
    let path = path.as_ref();
    let write_err = |source| ScanError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
    }

    let tmp_path = path.with_extension("csv.tmp");
    tokio::fs::write(&tmp_path, devices_to_csv(devices))
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Wrote {} devices to {}", devices.len(), path.display());
    Ok(())
}

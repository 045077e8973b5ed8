//! Scan requests: the image bytes plus their declared media type.
//!
//! A [`ScanRequest`] can be built directly from bytes, from a local file, from
//! a `data:` URL as produced by a browser file reader, or by downloading an
//! HTTP(S) URL. No validation happens here beyond what is needed to read the
//! bytes; the allow-list check belongs to [`crate::pipeline::encode`].

use crate::error::ScanError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Media types accepted by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Jpeg,
    Png,
}

impl MediaType {
    /// Canonical MIME string sent to the provider.
    pub fn as_mime(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
        }
    }

    /// Parse a declared MIME type. Case-insensitive; parameters such as
    /// `; charset=binary` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(MediaType::Jpeg),
            "image/png" => Some(MediaType::Png),
            _ => None,
        }
    }

    /// Guess from a file extension (`jpg`, `jpeg`, `png`).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "png" => Some(MediaType::Png),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

/// One user submission. Immutable; consumed by [`crate::scan::scan`].
#[derive(Clone, PartialEq, Eq)]
pub struct ScanRequest {
    bytes: Vec<u8>,
    media_type: String,
}

impl fmt::Debug for ScanRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanRequest")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("media_type", &self.media_type)
            .finish()
    }
}

impl ScanRequest {
    /// Wrap raw bytes with the media type declared by the caller.
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The media type as declared, before normalisation.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self, ScanError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| ScanError::InvalidDataUrl {
                reason: "missing 'data:' prefix".into(),
            })?;
        let (header, payload) = rest.split_once(',').ok_or_else(|| ScanError::InvalidDataUrl {
            reason: "missing ',' separator".into(),
        })?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| ScanError::InvalidDataUrl {
                reason: "only base64 data URLs are supported".into(),
            })?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ScanError::InvalidDataUrl {
                reason: e.to_string(),
            })?;
        Ok(Self::new(bytes, media_type))
    }

    /// Read a local image. The media type comes from the extension, falling
    /// back to content sniffing; unknown types are kept as
    /// `application/octet-stream` so the encoder rejects them.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScanError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => ScanError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ScanError::Internal(format!("Failed to read '{}': {e}", path.display())),
        })?;

        let media_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(MediaType::from_extension)
            .map(|m| m.as_mime().to_string())
            .or_else(|| sniff_mime(&bytes))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        debug!("Read {} bytes from {} ({})", bytes.len(), path.display(), media_type);
        Ok(Self::new(bytes, media_type))
    }
}

/// Check if the input string looks like an HTTP(S) URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Check if the input string is a `data:` URL.
pub fn is_data_url(input: &str) -> bool {
    input.starts_with("data:")
}

/// Resolve a user-supplied path, data URL, or HTTP(S) URL into a request.
pub async fn load_request(input: &str, timeout_secs: u64) -> Result<ScanRequest, ScanError> {
    if input.trim().is_empty() {
        return Err(ScanError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_data_url(input) {
        ScanRequest::from_data_url(input)
    } else if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        ScanRequest::from_path(PathBuf::from(input))
    }
}

/// Download an image into memory. The `Content-Type` header supplies the
/// declared media type.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ScanRequest, ScanError> {
    info!("Downloading image from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ScanError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ScanError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ScanError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ScanError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let header_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ScanError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let media_type = header_type
        .or_else(|| sniff_mime(&bytes))
        .unwrap_or_else(|| "application/octet-stream".to_string());

    info!("Downloaded {} bytes ({})", bytes.len(), media_type);
    Ok(ScanRequest::new(bytes.to_vec(), media_type))
}

/// MIME type of the bytes according to their magic number, if recognised.
pub(crate) fn sniff_mime(bytes: &[u8]) -> Option<String> {
    image::guess_format(bytes)
        .ok()
        .map(|f| f.to_mime_type().to_string())
}

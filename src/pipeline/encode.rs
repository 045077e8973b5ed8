//! Image encoding: `ScanRequest` → base64 payload wrapped in `ImageData`.
//!
//! Multimodal APIs accept images as base64 data embedded in the JSON request
//! body. The bytes are passed through unchanged: no resizing, no re-encoding.
//! Only JPEG and PNG are accepted, and anything else is rejected here, before
//! a network call is attempted.

use crate::error::ScanError;
use crate::input::{sniff_mime, MediaType, ScanRequest};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use tracing::debug;

/// Resolve the effective media type of a request.
///
/// The declared type must be on the allow-list. When the bytes identify a
/// different allowed type, the sniffed type wins; when they identify a format
/// outside the allow-list, the request is rejected.
pub fn resolve_media_type(request: &ScanRequest) -> Result<MediaType, ScanError> {
    let declared = MediaType::from_mime(request.media_type()).ok_or_else(|| {
        ScanError::UnsupportedMediaType {
            media_type: request.media_type().to_string(),
        }
    })?;

    match sniff_mime(request.bytes()) {
        None => Ok(declared),
        Some(sniffed) => match MediaType::from_mime(&sniffed) {
            Some(actual) => {
                if actual != declared {
                    debug!("Declared {} but content is {}; using {}", declared, actual, actual);
                }
                Ok(actual)
            }
            None => Err(ScanError::UnsupportedMediaType {
                media_type: sniffed,
            }),
        },
    }
}

/// Encode the request image as a base64 payload ready for the VLM API.
///
/// `detail: "high"` asks GPT-class models for the full tile budget; IMEI
/// digits on box labels are small print.
pub fn encode_image(request: &ScanRequest) -> Result<ImageData, ScanError> {
    if request.bytes().is_empty() {
        return Err(ScanError::EmptyImage);
    }
    let media_type = resolve_media_type(request)?;

    let b64 = STANDARD.encode(request.bytes());
    debug!(
        "Encoded {} image: {} bytes → {} bytes base64",
        media_type,
        request.bytes().len(),
        b64.len()
    );

    Ok(ImageData::new(b64, media_type.as_mime()).with_detail("high"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn tiny(format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([200, 10, 10])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn encode_png() {
        let bytes = tiny(ImageFormat::Png);
        let data = encode_image(&ScanRequest::new(bytes.clone(), "image/png")).unwrap();
        assert_eq!(data.mime_type, "image/png");
        assert_eq!(STANDARD.decode(&data.data).unwrap(), bytes);
    }

    #[test]
    fn encode_jpeg_passes_bytes_through() {
        let bytes = tiny(ImageFormat::Jpeg);
        let data = encode_image(&ScanRequest::new(bytes.clone(), "image/jpeg")).unwrap();
        assert_eq!(data.mime_type, "image/jpeg");
        assert_eq!(STANDARD.decode(&data.data).unwrap(), bytes);
    }

    #[test]
    fn sniffed_type_overrides_declared() {
        let bytes = tiny(ImageFormat::Png);
        let data = encode_image(&ScanRequest::new(bytes, "image/jpeg")).unwrap();
        assert_eq!(data.mime_type, "image/png");
    }

    #[test]
    fn rejects_unlisted_declared_type() {
        let err = encode_image(&ScanRequest::new(vec![1, 2, 3], "image/gif")).unwrap_err();
        assert!(matches!(err, ScanError::UnsupportedMediaType { .. }));
    }

    #[test]
    fn rejects_gif_content_declared_as_png() {
        let err = encode_image(&ScanRequest::new(b"GIF89a\x01\x00".to_vec(), "image/png"))
            .unwrap_err();
        match err {
            ScanError::UnsupportedMediaType { media_type } => assert_eq!(media_type, "image/gif"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_empty_payload() {
        let err = encode_image(&ScanRequest::new(Vec::new(), "image/png")).unwrap_err();
        assert!(matches!(err, ScanError::EmptyImage));
    }

    #[test]
    fn undetectable_bytes_keep_declared_type() {
        let data = encode_image(&ScanRequest::new(b"opaque".to_vec(), "image/jpeg")).unwrap();
        assert_eq!(data.mime_type, "image/jpeg");
    }
}

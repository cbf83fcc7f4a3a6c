// src/image_ingest.rs
//! Upload validation and data-URI encoding for profile images.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Max accepted upload size (10MB).
const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

const PNG_SIGNATURE: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];
const GIF_SIGNATURE: &[u8] = b"GIF8";

#[derive(Debug, Clone)]
pub struct ImageValidationError {
    pub error_type: ImageErrorType,
    pub message: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageErrorType {
    EmptyFile,
    TooLarge,
    CorruptedFile,
}

impl ImageErrorType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyFile => "IMAGE_EMPTY",
            Self::TooLarge => "IMAGE_TOO_LARGE",
            Self::CorruptedFile => "IMAGE_CORRUPTED",
        }
    }
}

impl std::fmt::Display for ImageValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_type.code(), self.message)
    }
}

pub struct ImageValidator;

impl ImageValidator {
    /// Validate an in-memory upload before encoding it.
    pub fn validate_upload(bytes: &[u8]) -> Result<(), ImageValidationError> {
        if bytes.is_empty() {
            return Err(ImageValidationError {
                error_type: ImageErrorType::EmptyFile,
                message: "Uploaded image is empty".to_string(),
                suggestion: "Please upload a valid image file".to_string(),
            });
        }

        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(ImageValidationError {
                error_type: ImageErrorType::TooLarge,
                message: format!(
                    "Image too large: {:.1}MB (max 10MB)",
                    bytes.len() as f64 / 1024.0 / 1024.0
                ),
                suggestion: "Please resize or compress your image and try again".to_string(),
            });
        }

        if bytes.len() < 8 {
            return Err(ImageValidationError {
                error_type: ImageErrorType::CorruptedFile,
                message: "Image file too small or corrupted".to_string(),
                suggestion: "Please upload a valid image file".to_string(),
            });
        }

        Ok(())
    }

    /// Sniff the real format from magic bytes.
    pub fn detect_mime(bytes: &[u8]) -> Option<&'static str> {
        if bytes.starts_with(PNG_SIGNATURE) {
            Some("image/png")
        } else if bytes.starts_with(JPEG_SIGNATURE) {
            Some("image/jpeg")
        } else if bytes.starts_with(GIF_SIGNATURE) {
            Some("image/gif")
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some("image/webp")
        } else {
            None
        }
    }

    /// Sniffed type wins over the declared one; unknown content falls back
    /// to the declared type and then to image/jpeg.
    pub fn resolve_mime(bytes: &[u8], declared: Option<&str>) -> String {
        Self::detect_mime(bytes)
            .map(str::to_string)
            .or_else(|| declared.map(str::to_string))
            .unwrap_or_else(|| "image/jpeg".to_string())
    }
}

/// Encode raw image bytes as an embeddable data URI.
pub fn encode_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Decode a data URI back to raw bytes. The payload sits after the first
/// comma; everything before it is the header.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let encoded = uri
        .split_once(',')
        .map(|(_, payload)| payload)
        .context("Data URI has no payload separator")?;

    STANDARD
        .decode(encoded.trim())
        .context("Failed to decode base64 image payload")
}

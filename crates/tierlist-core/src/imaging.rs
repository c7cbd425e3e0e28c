//! Image intake: format detection, data URLs and square normalization.

use crate::config::ImageConfig;
use base64::{Engine, engine::general_purpose::STANDARD};
use image::GenericImageView;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown in place of an image whose stored payload could not be found.
pub const IMAGE_PLACEHOLDER: &str = "tierlist:missing-image";

/// Image errors.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Accepted input image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        None
    }
}

impl From<ImageFormat> for image::ImageFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::WebP => image::ImageFormat::WebP,
        }
    }
}

/// A raw image as handed over by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    /// File contents.
    Bytes(Vec<u8>),
    /// A `data:` URL, e.g. from `FileReader.readAsDataURL`.
    DataUrl(String),
}

impl ImageInput {
    fn into_bytes(self) -> Result<Vec<u8>, ImageError> {
        match self {
            ImageInput::Bytes(bytes) => Ok(bytes),
            ImageInput::DataUrl(url) => decode_data_url(&url),
        }
    }
}

/// Whether a string is an inline image payload.
pub fn is_image_data_url(s: &str) -> bool {
    s.starts_with("data:image/")
}

/// Build a base64 data URL.
pub fn to_data_url(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(data))
}

/// Extract the bytes of a base64 data URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, ImageError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ImageError::InvalidDataUrl("missing data: scheme".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::InvalidDataUrl("missing payload".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(ImageError::InvalidDataUrl("payload is not base64".to_string()));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| ImageError::InvalidDataUrl(e.to_string()))
}

/// Normalize an image to a fixed square JPEG data URL.
///
/// The image is center-cropped to its shorter side, resized to
/// `config.size` pixels and re-encoded at `config.quality`.
pub fn normalize_image(input: ImageInput, config: &ImageConfig) -> Result<String, ImageError> {
    let bytes = input.into_bytes()?;
    let format = ImageFormat::from_magic_bytes(&bytes).ok_or(ImageError::UnsupportedFormat)?;

    let decoded = image::load_from_memory_with_format(&bytes, format.into())
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    let (width, height) = decoded.dimensions();
    let side = width.min(height);
    if side == 0 {
        return Err(ImageError::Decode("image has no pixels".to_string()));
    }

    let square = decoded
        .crop_imm((width - side) / 2, (height - side) / 2, side, side)
        .resize_exact(config.size, config.size, FilterType::Triangle)
        .to_rgb8();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, config.quality.clamp(1, 100))
        .encode_image(&square)
        .map_err(|e| ImageError::Encode(e.to_string()))?;

    log::debug!(
        "Normalized {:?} image {}x{} to {}px ({} bytes)",
        format,
        width,
        height,
        config.size,
        out.len()
    );
    Ok(to_data_url(ImageFormat::Jpeg.mime_type(), &out))
}

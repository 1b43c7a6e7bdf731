//! Image preprocessing for uploaded problem photos.
//!
//! Uploads are resized and re-encoded before being inlined into a model
//! request; typical phone photos shrink by an order of magnitude.

use crate::models::InlineData;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops::FilterType, ImageOutputFormat};
use service_core::error::AppError;
use std::io::Cursor;

/// Longest-dimension ceiling after resizing.
pub const MAX_DIMENSION: u32 = 1200;

/// JPEG re-encode quality.
const JPEG_QUALITY: u8 = 80;

/// Header-only probe result.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: Option<String>,
    pub size_kb: f64,
    pub aspect_ratio: f64,
}

/// Decode, constrain the longest dimension to [`MAX_DIMENSION`] preserving
/// aspect ratio (never upscaling), and re-encode as JPEG.
pub fn compress(raw: &[u8]) -> Result<Vec<u8>, AppError> {
    let img = image::load_from_memory(raw)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to decode image: {}", e)))?;

    let resized = if img.width().max(img.height()) > MAX_DIMENSION {
        img.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
    } else {
        img
    };

    let mut buffer = Cursor::new(Vec::new());
    resized
        .write_to(&mut buffer, ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to encode image: {}", e))
        })?;

    tracing::debug!(
        input_bytes = raw.len(),
        output_bytes = buffer.get_ref().len(),
        width = resized.width(),
        height = resized.height(),
        "Compressed uploaded image"
    );

    Ok(buffer.into_inner())
}

/// Base64-encode bytes verbatim into an inline model payload. Empty input
/// yields an empty data string.
pub fn to_inline_payload(bytes: &[u8], mime_type: &str) -> InlineData {
    InlineData {
        mime_type: mime_type.to_string(),
        data: STANDARD.encode(bytes),
    }
}

/// Probe format and dimensions without a full decode. Diagnostic only.
pub fn validate(raw: &[u8]) -> Result<ImageMetadata, AppError> {
    let reader = image::io::Reader::new(Cursor::new(raw))
        .with_guessed_format()
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Unreadable image data: {}", e)))?;

    let format = reader.format().map(|f| format!("{:?}", f).to_lowercase());
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid image data: {}", e)))?;

    Ok(ImageMetadata {
        width,
        height,
        format,
        size_kb: raw.len() as f64 / 1024.0,
        aspect_ratio: width as f64 / height as f64,
    })
}

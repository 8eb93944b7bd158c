//! Image upload pipeline: validate, downscale, re-encode, store.
//!
//! DESIGN
//! ======
//! The declared content type is checked first, then the bytes are sniffed
//! with `image::guess_format` so a renamed file cannot slip through. Decoding
//! and encoding are CPU-bound and run on the blocking pool. Output is always
//! WebP, at most `MAX_WIDTH` pixels wide, never enlarged.

use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use rand::Rng;
use time::OffsetDateTime;

use super::session::bytes_to_hex;
use super::storage::{ObjectStorage, StorageError};
use crate::error::ApiError;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_WIDTH: u32 = 1600;
pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];
const OUTPUT_CONTENT_TYPE: &str = "image/webp";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    MissingFile,
    #[error("Invalid image type")]
    UnsupportedType,
    #[error("File too large (max 5MB)")]
    TooLarge,
    #[error("Invalid image data: {0}")]
    Decode(String),
    #[error("image encoding failed: {0}")]
    Encode(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::MissingFile | UploadError::UnsupportedType | UploadError::TooLarge | UploadError::Decode(_) => {
                Self::Upload(err.to_string())
            }
            UploadError::Encode(_) | UploadError::Storage(_) => Self::internal(err),
        }
    }
}

/// Reject declared types outside the allow-list.
///
/// # Errors
///
/// Returns [`UploadError::UnsupportedType`] for anything not in
/// [`ALLOWED_CONTENT_TYPES`].
pub fn check_content_type(content_type: Option<&str>) -> Result<(), UploadError> {
    let declared = content_type
        .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .unwrap_or_default();
    if ALLOWED_CONTENT_TYPES.contains(&declared.as_str()) {
        Ok(())
    } else {
        Err(UploadError::UnsupportedType)
    }
}

/// Output dimensions: scaled to `MAX_WIDTH` when wider, otherwise unchanged.
#[must_use]
pub fn target_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width <= MAX_WIDTH || width == 0 {
        return (width, height);
    }
    let scaled = u64::from(height) * u64::from(MAX_WIDTH) / u64::from(width);
    (MAX_WIDTH, u32::try_from(scaled).unwrap_or(u32::MAX).max(1))
}

/// Decode, downscale and re-encode an image as WebP.
///
/// # Errors
///
/// Returns `UnsupportedType` when the bytes are not JPEG, PNG, WebP or GIF,
/// `Decode` when they cannot be read, and `Encode` when WebP output fails.
pub fn process_image(bytes: &[u8]) -> Result<Vec<u8>, UploadError> {
    let format = image::guess_format(bytes).map_err(|_| UploadError::UnsupportedType)?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP | ImageFormat::Gif) {
        return Err(UploadError::UnsupportedType);
    }
    let decoded = image::load_from_memory_with_format(bytes, format).map_err(|e| UploadError::Decode(e.to_string()))?;

    let (width, height) = target_dimensions(decoded.width(), decoded.height());
    let resized = if width == decoded.width() {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Lanczos3)
    };

    // Lossless WebP takes 8-bit RGB(A) only.
    let rgba = DynamicImage::ImageRgba8(resized.to_rgba8());
    let mut out = Vec::new();
    rgba.write_with_encoder(WebPEncoder::new_lossless(&mut out))
        .map_err(|e| UploadError::Encode(e.to_string()))?;
    Ok(out)
}

/// Storage key of a new upload: `uploads/<unix millis>-<random hex>.webp`.
#[must_use]
pub fn new_object_key(now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    let suffix: [u8; 6] = rand::rng().random();
    format!("uploads/{millis}-{}.webp", bytes_to_hex(&suffix))
}

/// Validate, process and store one uploaded image, returning its public URL.
///
/// # Errors
///
/// Any [`UploadError`]; client-side problems are checked before decoding.
pub async fn store_image(
    storage: &dyn ObjectStorage,
    bytes: Vec<u8>,
    content_type: Option<&str>,
) -> Result<String, UploadError> {
    check_content_type(content_type)?;
    if bytes.is_empty() {
        return Err(UploadError::MissingFile);
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge);
    }

    let encoded = tokio::task::spawn_blocking(move || process_image(&bytes))
        .await
        .map_err(|e| UploadError::Encode(e.to_string()))??;

    let key = new_object_key(OffsetDateTime::now_utc());
    let url = storage.put(&key, encoded, OUTPUT_CONTENT_TYPE).await?;
    tracing::info!(%key, "image stored");
    Ok(url)
}

#[cfg(test)]
#[path = "upload_test.rs"]
mod tests;

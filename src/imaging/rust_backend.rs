//! Pure Rust decode, libwebp encode.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, WebP) | `image` crate decoders, format sniffed from content |
//! | Encode → lossy WebP | `webp::Encoder` (libwebp) |
//!
//! The `image` crate's own WebP encoder is lossless-only, which is why the
//! encoder comes from the `webp` crate.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::Quality;
use image::{DynamicImage, ImageReader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Source extensions the batch accepts by default.
pub const DEFAULT_INPUT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Extension written for every derived image.
pub const OUTPUT_EXTENSION: &str = "webp";

/// Backend built on the `image` crate and libwebp.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Open a file with its format guessed from the leading bytes.
fn open_reader(path: &Path) -> Result<ImageReader<BufReader<File>>, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)
}

/// Encode to lossy WebP, keeping the alpha channel when the source has one.
fn encode_webp(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let (width, height) = (img.width(), img.height());
    let quality = quality.value() as f32;

    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), width, height).encode_simple(false, quality)
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode_simple(false, quality)
    };

    encoded
        .map(|memory| memory.to_vec())
        .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {e:?}")))
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = open_reader(path)?.into_dimensions().map_err(|e| {
            BackendError::UnsupportedFormat(format!("{}: {}", path.display(), e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        open_reader(path)?
            .decode()
            .map_err(|e| BackendError::UnsupportedFormat(format!("{}: {}", path.display(), e)))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        output: &Path,
        quality: Quality,
    ) -> Result<(), BackendError> {
        let bytes = encode_webp(image, quality)?;
        std::fs::write(output, bytes)?;
        Ok(())
    }
}

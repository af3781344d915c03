//! Image backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the seam between the batch processor and the
//! codecs: identify (header only), decode, and encode. Geometry does not go
//! through the backend; it lives in [`operations`](super::operations) and works
//! on decoded images directly.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::Quality;
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Degenerate target size {width}x{height}")]
    DegenerateTarget { width: u32, height: u32 },
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image codec backends.
///
/// `Sync` so a single backend can serve rayon workers.
pub trait ImageBackend: Sync {
    /// Read image dimensions without decoding pixel data.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode a source file into an owned image.
    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Encode `image` as lossy WebP and write it to `output`.
    fn encode(&self, image: &DynamicImage, output: &Path, quality: Quality)
    -> Result<(), BackendError>;
}

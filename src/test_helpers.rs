//! Shared test utilities for the cropbatch test suite.
//!
//! Writes small synthetic source images to disk and provides assertions over
//! the WebP files a batch produces.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let source = tmp.path().join("wide.jpg");
//! create_test_jpeg(&source, 2000, 1000);
//!
//! // ... run a batch ...
//!
//! assert_webp_dimensions(&output, 300, 300);
//! ```

use image::{ImageFormat, ImageReader, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;

// =========================================================================
// Fixture images
// =========================================================================

/// Write a `width`×`height` JPEG with a horizontal gradient.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    img.save_with_format(path, ImageFormat::Jpeg).unwrap();
}

/// Write a `width`×`height` PNG whose left half is opaque red and right half
/// is fully transparent.
pub fn create_test_png_with_alpha(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    img.save_with_format(path, ImageFormat::Png).unwrap();
}

// =========================================================================
// Output assertions
// =========================================================================

/// Assert that `path` is a WebP file of exactly `width`×`height`.
pub fn assert_webp_dimensions(path: &Path, width: u32, height: u32) {
    let reader = ImageReader::open(path)
        .unwrap_or_else(|e| panic!("cannot open {}: {e}", path.display()))
        .with_guessed_format()
        .unwrap();
    assert_eq!(
        reader.format(),
        Some(ImageFormat::WebP),
        "{} is not WebP",
        path.display()
    );
    let dims = reader.into_dimensions().unwrap();
    assert_eq!(dims, (width, height), "{} has wrong size", path.display());
}

/// Names of the files directly inside `dir`, sorted.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("cannot list {}: {e}", dir.display()))
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

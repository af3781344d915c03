//! High-level image operations.
//!
//! These functions combine the [`calculations`](super::calculations) with the
//! `image` crate's resampling. Each one borrows the source and returns a new
//! image, so a single decoded source can feed every target size in turn.
//!
//! Resampling always uses Lanczos3 and is skipped when the computed size
//! equals the source size. The color type is carried through unchanged; an
//! alpha channel is never flattened.

use super::backend::BackendError;
use super::calculations::{center_offset, contain_dimensions, cover_window};
use super::params::FitMode;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, RgbaImage};

/// The single resampling filter used for every resize.
pub const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

fn check_inputs(image: &DynamicImage, target: (u32, u32)) -> Result<()> {
    let (width, height) = target;
    if width == 0 || height == 0 {
        return Err(BackendError::DegenerateTarget { width, height });
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "source image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }
    Ok(())
}

/// Resize to exact dimensions, or clone when nothing would change.
fn resample(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.dimensions() == (width, height) {
        image.clone()
    } else {
        image.resize_exact(width, height, RESAMPLE_FILTER)
    }
}

/// Crop the centered window with the target's aspect, then scale it to `target`.
///
/// The output is always exactly `target`, upscaling small sources as needed.
/// The only intermediate buffer is the window itself, never larger than the
/// source.
pub fn cover_crop(image: &DynamicImage, target: (u32, u32)) -> Result<DynamicImage> {
    check_inputs(image, target)?;

    let ((left, top), (win_w, win_h)) = cover_window(image.dimensions(), target);
    let window = image.crop_imm(left, top, win_w, win_h);
    Ok(resample(&window, target.0, target.1))
}

/// Scale to fit inside `target` and center on a transparent canvas.
///
/// The output is always exactly `target` and always RGBA; uncovered canvas
/// pixels are fully transparent.
pub fn contain_crop(image: &DynamicImage, target: (u32, u32)) -> Result<DynamicImage> {
    check_inputs(image, target)?;

    let (fit_w, fit_h) = contain_dimensions(image.dimensions(), target);
    let fitted = resample(image, fit_w, fit_h).to_rgba8();

    let (left, top) = center_offset(target, (fit_w, fit_h));
    let mut canvas = RgbaImage::new(target.0, target.1);
    imageops::replace(&mut canvas, &fitted, i64::from(left), i64::from(top));
    Ok(DynamicImage::ImageRgba8(canvas))
}

/// Fit `image` to `target` with the given mode.
pub fn fit(image: &DynamicImage, target: (u32, u32), mode: FitMode) -> Result<DynamicImage> {
    match mode {
        FitMode::Cover => cover_crop(image, target),
        FitMode::Contain => contain_crop(image, target),
    }
}

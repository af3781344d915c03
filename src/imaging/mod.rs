//! Image processing: codecs and fit geometry.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Decode** | `image` crate (JPEG, PNG, WebP) |
//! | **Cover / contain** | `resize_exact` with Lanczos3, then crop or canvas placement |
//! | **Encode** | lossy WebP via `webp` (libwebp) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: [`Quality`] and [`FitMode`]
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Geometry applied to decoded images

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use operations::{contain_crop, cover_crop, fit};
pub use params::{FitMode, Quality};
pub use rust_backend::{DEFAULT_INPUT_EXTENSIONS, OUTPUT_EXTENSION, RustBackend};

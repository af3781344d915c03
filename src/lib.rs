//! # cropbatch
//!
//! Batch image transformation for web publishing. Give it a list of source
//! images and a named profile; it writes one lossy WebP per target size per
//! source into a fresh output directory next to the sources.
//!
//! # Architecture: One Batch, Four Steps
//!
//! ```text
//! 1. Resolve   request  →  BatchPlan        (profile, sizes, layout, naming)
//! 2. Check     sources  →  accepted set     (extension filter, size guard)
//! 3. Prepare   plan     →  output dirs      (confirm before clearing)
//! 4. Process   sources  →  *.webp           (decode once, fit, encode)
//! ```
//!
//! Steps 1 and 2 never touch the disk beyond reading image headers, so any
//! request error surfaces before an existing directory is cleared. Step 4
//! records per-source failures and carries on.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`batch`] | Orchestration: request resolution, prechecks, per-source processing, status codes |
//! | [`catalog`] | Built-in profiles: named size tables, aspect-ratio tables, pass-through |
//! | [`imaging`] | Geometry (cover/contain) and the codec backend (decode, WebP encode) |
//! | [`naming`] | Filename sanitizing and output names (random token or sanitized stem) |
//! | [`output_dir`] | Output directory placement and the confirm-then-recreate lifecycle |
//! | [`config`] | Optional `config.toml`: quality, accepted extensions, parallelism |
//! | [`output`] | CLI output formatting for progress events, outcomes and profiles |
//!
//! # Design Decisions
//!
//! ## WebP-Only Output
//!
//! Every derivative is lossy WebP. One output format means one extension, one
//! encoder setting, and no format negotiation per profile. Alpha is preserved.
//!
//! ## Pure-Rust Geometry
//!
//! Resampling and cropping use the `image` crate (Lanczos3). Only the final
//! WebP encode goes through libwebp, because the `image` crate writes lossless
//! WebP only.
//!
//! ## Profiles Are Data
//!
//! Profiles are plain tables in [`catalog`]. Adding a profile means adding
//! rows; the engine has no per-profile code paths.

pub mod batch;
pub mod catalog;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod output_dir;

#[cfg(test)]
pub(crate) mod test_helpers;

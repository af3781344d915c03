//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Batch progress
//!
//! ```text
//! Output: shoot/resized_images (cleared)
//! Skipped notes.txt: unsupported extension
//! 001/003 cat.jpg
//!     small → 48213907_small.webp (300x300)
//!     large → 48213907_large.webp (900x900)
//! 002/003 broken.jpg
//!     failed broken.jpg: unrecognized image data
//! 003/003 dog.png
//!     ...
//! Wrote 4 images (1 failed, 1 skipped)
//! ```
//!
//! With parallel workers, lines from different sources may interleave; each
//! line names enough to stand on its own.
//!
//! ## Profiles
//!
//! ```text
//! lith (resized_images, per-source)
//!     small 225x300
//!     large 500x667
//! product (product_images, shared, undersized guard)
//!     3:4 → 3x4 900x1200
//! optimize (optimized_images, shared)
//!     re-encode only
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, BatchOutcome};
use crate::catalog::{Profile, ProfileCatalog, ProfileSizes};
use std::path::Path;

/// Format a 1-based position as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// File name of `path`, or the whole path when it has none.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Batch progress
// ============================================================================

/// Format one progress event.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::DirectoryPrepared { path, recreated } => {
            let suffix = if *recreated { " (cleared)" } else { "" };
            vec![format!("Output: {}{}", path.display(), suffix)]
        }
        BatchEvent::SourceSkipped { source, reason } => {
            vec![format!("Skipped {}: {}", display_name(source), reason)]
        }
        BatchEvent::SourceStarted {
            index,
            total,
            source,
        } => vec![format!(
            "{}/{} {}",
            format_index(*index),
            format_index(*total),
            display_name(source)
        )],
        BatchEvent::VariantWritten(written) => {
            let label = written.label.as_deref().unwrap_or("re-encoded");
            vec![format!(
                "{}{} → {} ({}x{})",
                indent(1),
                label,
                display_name(&written.path),
                written.width,
                written.height
            )]
        }
        BatchEvent::SourceFailed(failure) => vec![format!(
            "{}failed {}: {}",
            indent(1),
            display_name(&failure.source),
            failure.reason
        )],
        BatchEvent::Finished {
            written,
            failed,
            skipped,
        } => {
            let noun = if *written == 1 { "image" } else { "images" };
            let mut details = Vec::new();
            if *failed > 0 {
                details.push(format!("{failed} failed"));
            }
            if *skipped > 0 {
                details.push(format!("{skipped} skipped"));
            }
            if details.is_empty() {
                vec![format!("Wrote {written} {noun}")]
            } else {
                vec![format!("Wrote {written} {noun} ({})", details.join(", "))]
            }
        }
    }
}

/// Final summary after a batch returns.
pub fn format_outcome(outcome: &BatchOutcome) -> Vec<String> {
    let mut lines = vec![format!("==> {}", outcome.output_dir.display())];
    if !outcome.failures.is_empty() {
        lines.push("Failed".to_string());
        for failure in &outcome.failures {
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                failure.source.display(),
                failure.reason
            ));
        }
    }
    lines
}

pub fn print_outcome(outcome: &BatchOutcome) {
    for line in format_outcome(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Profiles
// ============================================================================

fn profile_header(profile: &Profile) -> String {
    let mut traits = vec![profile.category.clone(), profile.default_layout.to_string()];
    if profile.guard_undersized {
        traits.push("undersized guard".to_string());
    }
    format!("{} ({})", profile.id, traits.join(", "))
}

/// Every profile with its sizes, in catalog order.
pub fn format_profiles(catalog: &ProfileCatalog) -> Vec<String> {
    let mut lines = Vec::new();
    for profile in catalog.profiles() {
        lines.push(profile_header(profile));
        match &profile.sizes {
            ProfileSizes::Sized(sizes) => {
                for (label, size) in sizes {
                    lines.push(format!("{}{} {}", indent(1), label, size));
                }
            }
            ProfileSizes::AspectRatio(entries) => {
                for entry in entries {
                    lines.push(format!(
                        "{}{} → {} {}",
                        indent(1),
                        entry.key,
                        entry.label,
                        entry.size
                    ));
                }
            }
            ProfileSizes::PassThrough => {
                lines.push(format!("{}re-encode only", indent(1)));
            }
        }
    }
    lines
}

pub fn print_profiles(catalog: &ProfileCatalog) {
    for line in format_profiles(catalog) {
        println!("{}", line);
    }
}

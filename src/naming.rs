//! Output filename generation.
//!
//! Two schemes, chosen per batch:
//!
//! - **Random**: `<8-digit number>_<label>.webp`. One number is drawn per
//!   source and shared by all of that source's labels, so a source's
//!   derivatives sort together. Names are claimed in a [`NameRegistry`]; a
//!   name drawn twice in one batch is refused rather than overwritten.
//! - **SanitizedStem**: `<stem>.webp` (pass-through) or `<stem>_<label>.webp`.
//!   Two sources with the same sanitized stem produce the same name and the
//!   later one wins.
//!
//! ## Sanitizing
//!
//! Every character outside `[A-Za-z0-9._-]` becomes `_`, then the result is
//! lowercased. One input character always maps to one output character, and
//! sanitizing twice changes nothing:
//! - `Photo #1 (final).JPG-stem` → `photo__1__final_.jpg-stem`
//! - `Été` → `_t_`

use crate::imaging::OUTPUT_EXTENSION;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use thiserror::Error;

/// Stem used when sanitizing leaves nothing.
const FALLBACK_STEM: &str = "image";

/// Replace every character outside `[A-Za-z0-9._-]` with `_` and lowercase.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Sanitized file stem of `path`, or `image` when nothing is left.
pub fn sanitized_stem(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| sanitize(&s.to_string_lossy()))
        .unwrap_or_default();
    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingScheme {
    Random,
    SanitizedStem,
}

impl fmt::Display for NamingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingScheme::Random => f.write_str("random"),
            NamingScheme::SanitizedStem => f.write_str("stem"),
        }
    }
}

impl FromStr for NamingScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(NamingScheme::Random),
            "stem" => Ok(NamingScheme::SanitizedStem),
            other => Err(format!("unknown naming scheme '{other}' (expected random or stem)")),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("output name {} is already used in this batch", .0.display())]
pub struct NameCollision(pub PathBuf);

/// Per-batch random source and record of claimed output paths.
///
/// Both halves sit behind mutexes so parallel workers can share one registry.
pub struct NameRegistry {
    rng: Mutex<StdRng>,
    claimed: Mutex<HashSet<PathBuf>>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Deterministic registry for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// A random number in `10000000..=99999999`.
    pub fn random_token(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.random_range(10_000_000u32..=99_999_999).to_string()
    }

    /// Claim every path or none of them.
    pub fn claim_all(&self, paths: &[PathBuf]) -> Result<(), NameCollision> {
        let mut claimed = self.claimed.lock().unwrap_or_else(|e| e.into_inner());
        let mut fresh = HashSet::new();
        for path in paths {
            if claimed.contains(path) || !fresh.insert(path.clone()) {
                return Err(NameCollision(path.clone()));
            }
        }
        claimed.extend(fresh);
        Ok(())
    }
}

impl Default for NameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Filenames for one source, one per label (or a single name for pass-through).
pub fn output_names(
    scheme: NamingScheme,
    source: &Path,
    labels: &[&str],
    registry: &NameRegistry,
) -> Vec<String> {
    let base = match scheme {
        NamingScheme::Random => registry.random_token(),
        NamingScheme::SanitizedStem => sanitized_stem(source),
    };
    if labels.is_empty() {
        return vec![format!("{base}.{OUTPUT_EXTENSION}")];
    }
    labels
        .iter()
        .map(|label| format!("{base}_{}.{OUTPUT_EXTENSION}", sanitize(label)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_and_lowercases() {
        assert_eq!(
            sanitize("Photo #1 (final).JPG-stem"),
            "photo__1__final_.jpg-stem"
        );
    }

    #[test]
    fn sanitize_keeps_allowed_characters() {
        assert_eq!(sanitize("a-b_c.d-09"), "a-b_c.d-09");
    }

    #[test]
    fn sanitize_maps_each_non_ascii_char_to_one_underscore() {
        assert_eq!(sanitize("Été"), "_t_");
        assert_eq!(sanitize("日本"), "__");
    }

    #[test]
    fn sanitize_empty_is_empty() {
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn sanitized_stem_drops_extension() {
        assert_eq!(sanitized_stem(Path::new("/in/My Photo.PNG")), "my_photo");
    }

    #[test]
    fn sanitized_stem_falls_back_when_empty() {
        assert_eq!(sanitized_stem(Path::new("/in/.png")), ".png");
        assert_eq!(sanitized_stem(Path::new("/")), "image");
    }

    #[test]
    fn naming_scheme_round_trips_through_text() {
        for scheme in [NamingScheme::Random, NamingScheme::SanitizedStem] {
            assert_eq!(scheme.to_string().parse::<NamingScheme>(), Ok(scheme));
        }
        assert!("hash".parse::<NamingScheme>().is_err());
    }

    #[test]
    fn random_token_is_eight_digits() {
        let registry = NameRegistry::seeded(7);
        for _ in 0..200 {
            let token = registry.random_token();
            assert_eq!(token.len(), 8);
            assert!(token.chars().all(|c| c.is_ascii_digit()));
            assert!(!token.starts_with('0'));
        }
    }

    #[test]
    fn seeded_registries_are_reproducible() {
        let a = NameRegistry::seeded(42);
        let b = NameRegistry::seeded(42);
        assert_eq!(a.random_token(), b.random_token());
    }

    #[test]
    fn random_names_share_one_token_per_source() {
        let registry = NameRegistry::seeded(1);
        let names = output_names(
            NamingScheme::Random,
            Path::new("/in/cat.jpg"),
            &["small", "large"],
            &registry,
        );
        assert_eq!(names.len(), 2);
        let (token, rest) = names[0].split_once('_').unwrap();
        assert_eq!(rest, "small.webp");
        assert_eq!(names[1], format!("{token}_large.webp"));
    }

    #[test]
    fn stem_names_for_pass_through_and_sized() {
        let registry = NameRegistry::seeded(1);
        let source = Path::new("/in/Summer Sale.JPG");
        assert_eq!(
            output_names(NamingScheme::SanitizedStem, source, &[], &registry),
            ["summer_sale.webp"]
        );
        assert_eq!(
            output_names(NamingScheme::SanitizedStem, source, &["3x4"], &registry),
            ["summer_sale_3x4.webp"]
        );
    }

    #[test]
    fn claim_rejects_a_second_claim() {
        let registry = NameRegistry::seeded(1);
        let path = PathBuf::from("/out/12345678_small.webp");
        registry.claim_all(std::slice::from_ref(&path)).unwrap();
        assert_eq!(
            registry.claim_all(std::slice::from_ref(&path)),
            Err(NameCollision(path))
        );
    }

    #[test]
    fn claim_is_all_or_nothing() {
        let registry = NameRegistry::seeded(1);
        let taken = PathBuf::from("/out/a.webp");
        let free = PathBuf::from("/out/b.webp");
        registry.claim_all(std::slice::from_ref(&taken)).unwrap();

        assert!(registry.claim_all(&[free.clone(), taken]).is_err());
        // `free` was not claimed by the failed call
        registry.claim_all(&[free]).unwrap();
    }

    #[test]
    fn claim_rejects_duplicates_within_one_call() {
        let registry = NameRegistry::seeded(1);
        let path = PathBuf::from("/out/dup.webp");
        assert!(registry.claim_all(&[path.clone(), path]).is_err());
    }
}

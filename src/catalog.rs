//! Profile catalog: named sets of target sizes.
//!
//! A profile decides which derivatives a batch produces. There are three
//! shapes of profile:
//!
//! - **Sized**: an ordered list of `label → width×height` (e.g. `small`, `large`).
//!   Every label produces one output per source.
//! - **Aspect ratio**: a list of `ratio key → width×height`; the caller picks one
//!   key per batch (e.g. `3:4`), producing one output per source.
//! - **Pass-through**: no sizes; sources are only re-encoded.
//!
//! ## Built-in profiles
//!
//! | id | shape | sizes | folder | layout | undersized guard |
//! |---|---|---|---|---|---|
//! | `lith` | sized | small 225×300, large 500×667 | `resized_images` | per source | no |
//! | `tys` | sized | small 150×150, large 450×450 | `resized_images` | per source | no |
//! | `product` | aspect | `3:4` 900×1200, `4:4` 900×900 | `product_images` | shared | yes |
//! | `resize` | sized | small 300×300, medium 600×600, large 900×900 | `resized_images` | shared | yes |
//! | `optimize` | pass-through | none | `optimized_images` | shared | no |
//!
//! The tables are plain data: adding a profile means adding rows, and
//! [`ProfileCatalog::new`] accepts extra profiles built the same way. Label
//! order is declaration order and is what output filenames follow.

use crate::imaging::calculations::minimum_source_dimensions;
use crate::output_dir::DirectoryLayout;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown profile '{0}'")]
    UnknownProfile(String),
    #[error("profile '{profile}' has no aspect ratio '{ratio}'")]
    UnknownAspectRatio { profile: String, ratio: String },
    #[error("profile '{0}' requires an aspect ratio")]
    MissingAspectRatio(String),
    #[error("profile '{0}' does not take an aspect ratio")]
    UnexpectedAspectRatio(String),
    #[error("profile '{profile}' has a non-positive target size {width}x{height}")]
    DegenerateTarget {
        profile: String,
        width: u32,
        height: u32,
    },
    #[error("profile '{0}' declares no target sizes")]
    EmptyProfile(String),
    #[error("profile '{0}' is declared twice")]
    DuplicateProfile(String),
}

/// A target `(width, height)` in pixels. Both dimensions are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetSize {
    width: u32,
    height: u32,
}

impl TargetSize {
    /// Returns `None` if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One selectable entry of an aspect-ratio profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AspectEntry {
    /// Key the caller selects, e.g. `3:4`.
    pub key: String,
    /// Label used in filenames, e.g. `3x4`.
    pub label: String,
    pub size: TargetSize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSizes {
    Sized(Vec<(String, TargetSize)>),
    AspectRatio(Vec<AspectEntry>),
    PassThrough,
}

/// Sizes resolved for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeTable {
    /// Re-encode without resizing.
    PassThrough,
    /// Ordered `label → size`; never empty.
    Sized(Vec<(String, TargetSize)>),
}

impl SizeTable {
    pub fn is_pass_through(&self) -> bool {
        matches!(self, SizeTable::PassThrough)
    }

    /// Smallest source accepted without upscaling past the largest output.
    pub fn minimum_source(&self) -> (u32, u32) {
        match self {
            SizeTable::PassThrough => (0, 0),
            SizeTable::Sized(sizes) => {
                minimum_source_dimensions(sizes.iter().map(|(_, size)| size.as_tuple()))
            }
        }
    }
}

/// A named sizing policy plus its output placement defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub sizes: ProfileSizes,
    /// Folder name used by [`DirectoryLayout::SharedCategoryFolder`].
    pub category: String,
    pub default_layout: DirectoryLayout,
    /// Reject sources smaller than the largest target before writing anything.
    pub guard_undersized: bool,
}

fn target(profile: &str, width: u32, height: u32) -> Result<TargetSize, CatalogError> {
    TargetSize::new(width, height).ok_or_else(|| CatalogError::DegenerateTarget {
        profile: profile.to_string(),
        width,
        height,
    })
}

impl Profile {
    /// A profile producing one output per `(label, width, height)` row.
    pub fn sized(id: &str, rows: &[(&str, u32, u32)]) -> Result<Self, CatalogError> {
        if rows.is_empty() {
            return Err(CatalogError::EmptyProfile(id.to_string()));
        }
        let sizes = rows
            .iter()
            .map(|&(label, w, h)| Ok((label.to_string(), target(id, w, h)?)))
            .collect::<Result<Vec<_>, CatalogError>>()?;
        Ok(Self::with_sizes(id, ProfileSizes::Sized(sizes)))
    }

    /// A profile whose single output size is picked by `(key, label, width, height)`.
    pub fn aspect_ratio(id: &str, rows: &[(&str, &str, u32, u32)]) -> Result<Self, CatalogError> {
        if rows.is_empty() {
            return Err(CatalogError::EmptyProfile(id.to_string()));
        }
        let entries = rows
            .iter()
            .map(|&(key, label, w, h)| {
                Ok(AspectEntry {
                    key: key.to_string(),
                    label: label.to_string(),
                    size: target(id, w, h)?,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;
        Ok(Self::with_sizes(id, ProfileSizes::AspectRatio(entries)))
    }

    /// A profile that only re-encodes.
    pub fn pass_through(id: &str) -> Self {
        Self::with_sizes(id, ProfileSizes::PassThrough)
    }

    fn with_sizes(id: &str, sizes: ProfileSizes) -> Self {
        Self {
            id: id.to_string(),
            sizes,
            category: "resized_images".to_string(),
            default_layout: DirectoryLayout::SharedCategoryFolder,
            guard_undersized: false,
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn with_layout(mut self, layout: DirectoryLayout) -> Self {
        self.default_layout = layout;
        self
    }

    pub fn with_undersized_guard(mut self, guard: bool) -> Self {
        self.guard_undersized = guard;
        self
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self.sizes, ProfileSizes::PassThrough)
    }

    pub fn takes_aspect_ratio(&self) -> bool {
        matches!(self.sizes, ProfileSizes::AspectRatio(_))
    }

    /// Resolve the sizes for one batch.
    pub fn sizes_for(&self, aspect_ratio: Option<&str>) -> Result<SizeTable, CatalogError> {
        match (&self.sizes, aspect_ratio) {
            (ProfileSizes::AspectRatio(entries), Some(ratio)) => entries
                .iter()
                .find(|e| e.key == ratio)
                .map(|e| SizeTable::Sized(vec![(e.label.clone(), e.size)]))
                .ok_or_else(|| CatalogError::UnknownAspectRatio {
                    profile: self.id.clone(),
                    ratio: ratio.to_string(),
                }),
            (ProfileSizes::AspectRatio(_), None) => {
                Err(CatalogError::MissingAspectRatio(self.id.clone()))
            }
            (_, Some(_)) => Err(CatalogError::UnexpectedAspectRatio(self.id.clone())),
            (ProfileSizes::Sized(sizes), None) => Ok(SizeTable::Sized(sizes.clone())),
            (ProfileSizes::PassThrough, None) => Ok(SizeTable::PassThrough),
        }
    }
}

/// Ordered collection of profiles, looked up by id.
#[derive(Debug, Clone)]
pub struct ProfileCatalog {
    profiles: Vec<Profile>,
}

const LITH: &[(&str, u32, u32)] = &[("small", 225, 300), ("large", 500, 667)];
const TYS: &[(&str, u32, u32)] = &[("small", 150, 150), ("large", 450, 450)];
const PRODUCT: &[(&str, &str, u32, u32)] = &[("3:4", "3x4", 900, 1200), ("4:4", "4x4", 900, 900)];
const RESIZE: &[(&str, u32, u32)] = &[
    ("small", 300, 300),
    ("medium", 600, 600),
    ("large", 900, 900),
];

fn builtin_profiles() -> Result<Vec<Profile>, CatalogError> {
    Ok(vec![
        Profile::sized("lith", LITH)?.with_layout(DirectoryLayout::PerSourceFolder),
        Profile::sized("tys", TYS)?.with_layout(DirectoryLayout::PerSourceFolder),
        Profile::aspect_ratio("product", PRODUCT)?
            .with_category("product_images")
            .with_undersized_guard(true),
        Profile::sized("resize", RESIZE)?.with_undersized_guard(true),
        Profile::pass_through("optimize").with_category("optimized_images"),
    ])
}

static BUILTIN: LazyLock<ProfileCatalog> = LazyLock::new(|| {
    builtin_profiles()
        .and_then(ProfileCatalog::new)
        .expect("built-in profile tables must be valid")
});

impl ProfileCatalog {
    /// Build a catalog, rejecting duplicate ids.
    pub fn new(profiles: Vec<Profile>) -> Result<Self, CatalogError> {
        for (i, profile) in profiles.iter().enumerate() {
            if profiles[..i].iter().any(|p| p.id == profile.id) {
                return Err(CatalogError::DuplicateProfile(profile.id.clone()));
            }
        }
        Ok(Self { profiles })
    }

    /// The fixed built-in catalog.
    pub fn builtin() -> &'static ProfileCatalog {
        &BUILTIN
    }

    /// Append more profiles to a copy of this catalog.
    pub fn extended(&self, more: Vec<Profile>) -> Result<Self, CatalogError> {
        let mut profiles = self.profiles.clone();
        profiles.extend(more);
        Self::new(profiles)
    }

    pub fn get(&self, id: &str) -> Result<&Profile, CatalogError> {
        self.profiles
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| CatalogError::UnknownProfile(id.to_string()))
    }

    /// Ordered `label → size` for a profile, or [`SizeTable::PassThrough`].
    pub fn sizes_for(
        &self,
        profile_id: &str,
        aspect_ratio: Option<&str>,
    ) -> Result<SizeTable, CatalogError> {
        self.get(profile_id)?.sizes_for(aspect_ratio)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter()
    }
}

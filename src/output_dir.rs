//! Output directory placement and lifecycle.
//!
//! ## Layouts
//!
//! ```text
//! SharedCategoryFolder              PerSourceFolder
//! shoot/                            shoot/
//! ├── cat.jpg                       ├── cat.jpg
//! ├── dog.png                       ├── dog.png
//! └── resized_images/               ├── cat/
//!     ├── 48213907_small.webp       │   ├── 48213907_small.webp
//!     ├── 48213907_large.webp       │   └── 48213907_large.webp
//!     └── ...                       └── dog/
//!                                       └── ...
//! ```
//!
//! The shared folder sits next to the *first* source and is named after the
//! profile's category. Per-source folders sit next to each source and are
//! named after its sanitized stem. "First" means first among the sources the
//! batch accepts: a leading path that is skipped for its extension does not
//! decide where output goes.
//!
//! ## Lifecycle
//!
//! A missing directory is created (with parents). An existing one is only
//! touched after the caller's [`ConfirmOverwrite`] says yes; it is then
//! removed recursively and recreated empty. A "no" aborts with nothing
//! changed on disk. [`prepare_all`] asks about every existing candidate
//! before mutating any of them.
//!
//! A directory that holds one of the batch's own sources is never a valid
//! candidate: [`check_sources_outside`] rejects it before anyone is asked.

use crate::naming::sanitized_stem;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputDirError {
    #[error("user declined overwrite")]
    Aborted(PathBuf),
    #[error("{} exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("cannot prepare {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error(
        "output directory {} contains source {}; move the source or pick another layout",
        dir.display(),
        source_file.display()
    )]
    ContainsSource { dir: PathBuf, source_file: PathBuf },
}

/// Where derived images are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryLayout {
    /// One `<parent of source>/<sanitized stem>/` folder per source.
    PerSourceFolder,
    /// One `<parent of first source>/<category>/` folder for the whole batch.
    SharedCategoryFolder,
}

impl fmt::Display for DirectoryLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryLayout::PerSourceFolder => f.write_str("per-source"),
            DirectoryLayout::SharedCategoryFolder => f.write_str("shared"),
        }
    }
}

impl FromStr for DirectoryLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per-source" => Ok(DirectoryLayout::PerSourceFolder),
            "shared" => Ok(DirectoryLayout::SharedCategoryFolder),
            other => Err(format!(
                "unknown layout '{other}' (expected per-source or shared)"
            )),
        }
    }
}

/// Caller-supplied yes/no decision for replacing an existing directory.
///
/// Implemented for any `FnMut(&Path) -> bool`.
pub trait ConfirmOverwrite {
    fn confirm_overwrite(&mut self, existing: &Path) -> bool;
}

impl<F> ConfirmOverwrite for F
where
    F: FnMut(&Path) -> bool,
{
    fn confirm_overwrite(&mut self, existing: &Path) -> bool {
        self(existing)
    }
}

fn parent_of(source: &Path) -> &Path {
    source.parent().unwrap_or_else(|| Path::new("."))
}

/// Output directory for one source under `layout`.
pub fn directory_for(
    layout: DirectoryLayout,
    category: &str,
    first: &Path,
    source: &Path,
) -> PathBuf {
    match layout {
        DirectoryLayout::SharedCategoryFolder => parent_of(first).join(category),
        DirectoryLayout::PerSourceFolder => parent_of(source).join(sanitized_stem(source)),
    }
}

/// Distinct output directories for a batch, in first-use order.
pub fn plan_directories(
    layout: DirectoryLayout,
    category: &str,
    sources: &[PathBuf],
) -> Vec<PathBuf> {
    let Some(first) = sources.first() else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = Vec::new();
    for source in sources {
        let dir = directory_for(layout, category, first, source);
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs
}

/// Reject candidates that are, or sit above, any of `sources`.
///
/// Paths are compared in absolute form so relative and absolute inputs mix.
pub fn check_sources_outside(
    candidates: &[PathBuf],
    sources: &[PathBuf],
) -> Result<(), OutputDirError> {
    let absolute = |p: &Path| std::path::absolute(p).unwrap_or_else(|_| p.to_path_buf());
    let sources: Vec<(PathBuf, &PathBuf)> = sources.iter().map(|s| (absolute(s), s)).collect();
    for candidate in candidates {
        let dir = absolute(candidate);
        if let Some((_, source)) = sources.iter().find(|(abs, _)| abs.starts_with(&dir)) {
            return Err(OutputDirError::ContainsSource {
                dir: candidate.clone(),
                source_file: source.to_path_buf(),
            });
        }
    }
    Ok(())
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> OutputDirError + '_ {
    move |source| OutputDirError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Check a candidate without touching it. Returns whether it already exists.
fn inspect(candidate: &Path) -> Result<bool, OutputDirError> {
    match std::fs::symlink_metadata(candidate) {
        Ok(meta) if meta.is_dir() => Ok(true),
        Ok(_) => Err(OutputDirError::NotADirectory(candidate.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error(candidate)(e)),
    }
}

fn recreate(candidate: &Path, exists: bool) -> Result<(), OutputDirError> {
    if exists {
        std::fs::remove_dir_all(candidate).map_err(io_error(candidate))?;
    }
    std::fs::create_dir_all(candidate).map_err(io_error(candidate))
}

/// Prepared output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDir {
    pub path: PathBuf,
    /// True when an existing directory was cleared.
    pub recreated: bool,
}

/// Make `candidate` an empty, existing directory.
///
/// Asks `confirm` only if `candidate` already exists.
pub fn prepare(
    candidate: &Path,
    confirm: &mut dyn ConfirmOverwrite,
) -> Result<PreparedDir, OutputDirError> {
    let mut prepared = prepare_all(std::slice::from_ref(&candidate.to_path_buf()), confirm)?;
    Ok(prepared.remove(0))
}

/// Prepare several directories as one decision.
///
/// Every candidate is inspected and every existing one confirmed before
/// anything is removed or created.
pub fn prepare_all(
    candidates: &[PathBuf],
    confirm: &mut dyn ConfirmOverwrite,
) -> Result<Vec<PreparedDir>, OutputDirError> {
    let mut plan = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        plan.push((candidate, inspect(candidate)?));
    }

    for (candidate, exists) in &plan {
        if *exists && !confirm.confirm_overwrite(candidate) {
            return Err(OutputDirError::Aborted(candidate.to_path_buf()));
        }
    }

    plan.into_iter()
        .map(|(candidate, exists)| {
            recreate(candidate, exists)?;
            Ok(PreparedDir {
                path: candidate.clone(),
                recreated: exists,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn never(_: &Path) -> bool {
        panic!("confirmation must not be requested")
    }

    // =========================================================================
    // Placement
    // =========================================================================

    #[test]
    fn shared_folder_sits_next_to_first_source() {
        let dir = directory_for(
            DirectoryLayout::SharedCategoryFolder,
            "product_images",
            Path::new("/shoot/a/cat.jpg"),
            Path::new("/shoot/b/dog.jpg"),
        );
        assert_eq!(dir, PathBuf::from("/shoot/a/product_images"));
    }

    #[test]
    fn per_source_folder_uses_sanitized_stem() {
        let dir = directory_for(
            DirectoryLayout::PerSourceFolder,
            "ignored",
            Path::new("/shoot/first.jpg"),
            Path::new("/shoot/Red Shoes.PNG"),
        );
        assert_eq!(dir, PathBuf::from("/shoot/red_shoes"));
    }

    #[test]
    fn plan_deduplicates_in_order() {
        let sources = vec![
            PathBuf::from("/s/cat.jpg"),
            PathBuf::from("/s/dog.jpg"),
            PathBuf::from("/s/cat.png"),
        ];
        assert_eq!(
            plan_directories(DirectoryLayout::PerSourceFolder, "x", &sources),
            [PathBuf::from("/s/cat"), PathBuf::from("/s/dog")]
        );
        assert_eq!(
            plan_directories(DirectoryLayout::SharedCategoryFolder, "x", &sources),
            [PathBuf::from("/s/x")]
        );
    }

    #[test]
    fn source_inside_shared_folder_is_rejected() {
        let candidates = [PathBuf::from("/shoot/resized_images")];
        let sources = [
            PathBuf::from("/shoot/a.jpg"),
            PathBuf::from("/shoot/resized_images/b.jpg"),
        ];
        let err = check_sources_outside(&candidates, &sources).unwrap_err();
        assert!(matches!(
            err,
            OutputDirError::ContainsSource { ref source_file, .. }
                if source_file == Path::new("/shoot/resized_images/b.jpg")
        ));
    }

    #[test]
    fn source_inside_per_source_folder_is_rejected() {
        let sources = vec![PathBuf::from("/shoot/cat.jpg"), PathBuf::from("/shoot/cat/x.jpg")];
        let candidates = plan_directories(DirectoryLayout::PerSourceFolder, "x", &sources);
        assert!(check_sources_outside(&candidates, &sources).is_err());
    }

    #[test]
    fn siblings_with_a_shared_prefix_are_fine() {
        // `cat_old/` starts with the text `cat` but is not inside `cat/`.
        let candidates = [PathBuf::from("/shoot/cat")];
        let sources = [PathBuf::from("/shoot/cat.jpg"), PathBuf::from("/shoot/cat_old/x.jpg")];
        check_sources_outside(&candidates, &sources).unwrap();
    }

    #[test]
    fn relative_source_is_compared_in_absolute_form() {
        let cwd = std::env::current_dir().unwrap();
        let candidates = [cwd.join("out")];
        let sources = [PathBuf::from("out/a.jpg")];
        assert!(check_sources_outside(&candidates, &sources).is_err());
    }

    #[test]
    fn layout_round_trips_through_text() {
        for layout in [
            DirectoryLayout::PerSourceFolder,
            DirectoryLayout::SharedCategoryFolder,
        ] {
            assert_eq!(layout.to_string().parse::<DirectoryLayout>(), Ok(layout));
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    #[test]
    fn prepare_creates_missing_directory_with_parents() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("a/b/out");

        let prepared = prepare(&target, &mut never).unwrap();

        assert!(target.is_dir());
        assert_eq!(prepared.path, target);
        assert!(!prepared.recreated);
    }

    #[test]
    fn prepare_clears_existing_directory_after_confirmation() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("out");
        fs::create_dir_all(target.join("nested")).unwrap();
        fs::write(target.join("old.webp"), b"old").unwrap();
        fs::write(target.join("nested/deep.webp"), b"old").unwrap();

        let mut asked = Vec::new();
        let prepared = prepare(&target, &mut |p: &Path| {
            asked.push(p.to_path_buf());
            true
        })
        .unwrap();

        assert_eq!(asked, [target.clone()]);
        assert!(prepared.recreated);
        assert!(target.is_dir());
        assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
    }

    #[test]
    fn declined_overwrite_leaves_directory_untouched() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("out");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("keep.webp"), b"precious bytes").unwrap();

        let err = prepare(&target, &mut |_: &Path| false).unwrap_err();

        assert!(matches!(err, OutputDirError::Aborted(_)));
        assert_eq!(err.to_string(), "user declined overwrite");
        assert_eq!(fs::read(target.join("keep.webp")).unwrap(), b"precious bytes");
    }

    #[test]
    fn file_in_the_way_is_not_a_directory() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("out");
        fs::write(&target, b"file").unwrap();

        let err = prepare(&target, &mut never).unwrap_err();
        assert!(matches!(err, OutputDirError::NotADirectory(_)));
        assert_eq!(fs::read(&target).unwrap(), b"file");
    }

    #[test]
    fn prepare_all_asks_before_mutating_anything() {
        let tmp = TempDir::new().unwrap();
        let fresh = tmp.path().join("fresh");
        let first = tmp.path().join("first");
        let second = tmp.path().join("second");
        for dir in [&first, &second] {
            fs::create_dir_all(dir).unwrap();
            fs::write(dir.join("old.webp"), b"old").unwrap();
        }

        // Accept the first, decline the second.
        let mut answers = vec![false, true];
        let err = prepare_all(
            &[fresh.clone(), first.clone(), second.clone()],
            &mut |_: &Path| answers.pop().unwrap(),
        )
        .unwrap_err();

        assert!(matches!(err, OutputDirError::Aborted(p) if p == second));
        assert!(!fresh.exists());
        assert!(first.join("old.webp").exists());
        assert!(second.join("old.webp").exists());
    }

    #[test]
    fn prepare_all_reports_each_directory() {
        let tmp = TempDir::new().unwrap();
        let fresh = tmp.path().join("fresh");
        let existing = tmp.path().join("existing");
        fs::create_dir_all(&existing).unwrap();

        let prepared =
            prepare_all(&[fresh.clone(), existing.clone()], &mut |_: &Path| true).unwrap();

        assert_eq!(
            prepared,
            [
                PreparedDir {
                    path: fresh,
                    recreated: false
                },
                PreparedDir {
                    path: existing,
                    recreated: true
                },
            ]
        );
    }
}

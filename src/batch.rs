//! Batch processing: sources in, derived WebP images out.
//!
//! ## Flow
//!
//! ```text
//! BatchRequest ──resolve──▶ BatchPlan            (no filesystem access)
//!      │
//!      ├─ filter sources by extension            (rejects reported as skipped)
//!      ├─ undersized precheck, all sources       (profiles with the guard only)
//!      ├─ plan output directories                (none may contain a source)
//!      ├─ prepare output directories             (may ask ConfirmOverwrite)
//!      └─ for each source:
//!           decode once → claim names → fit each target → encode → write
//! ```
//!
//! Everything before directory preparation fails fast and leaves the disk
//! untouched. After that, a source that fails to decode, collides on a name,
//! or fails to encode is recorded in [`BatchOutcome::failures`] and the batch
//! moves on to the next source.
//!
//! ## Parallel Processing
//!
//! Sources are processed one at a time unless `processing.max_processes` is
//! above one *and* the batch uses random names, in which case a
//! [rayon](https://docs.rs/rayon) pool processes sources concurrently. Stem
//! names define last-writer-wins, which only holds in order, so those batches
//! stay sequential. Directory preparation always completes first.
//!
//! ## Caller contract
//!
//! [`status_of`] turns a run into `(status, message)`: `0` and the absolute
//! output directory on success, non-zero and a readable message otherwise.
//! See [`BatchError::status_code`] for the codes.

use crate::catalog::{CatalogError, Profile, ProfileCatalog, SizeTable};
use crate::config::{EngineConfig, effective_threads};
use crate::imaging::{BackendError, FitMode, ImageBackend, RustBackend, fit};
use crate::naming::{NameRegistry, NamingScheme, output_names};
use crate::output_dir::{
    ConfirmOverwrite, DirectoryLayout, OutputDirError, check_sources_outside, directory_for,
    plan_directories, prepare_all,
};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Status for a batch where some sources failed after processing started.
pub const STATUS_PARTIAL_FAILURE: i32 = 7;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("{}", describe_undersized(.0))]
    UndersizedSource(Vec<UndersizedFile>),
    #[error("unsupported image {}: {reason}", path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    OutputDir(#[from] OutputDirError),
}

impl BatchError {
    /// Non-zero status reported to the caller.
    ///
    /// | code | meaning |
    /// |---|---|
    /// | 1 | overwrite declined |
    /// | 2 | invalid request, unknown profile or aspect ratio, output would hold a source |
    /// | 3 | undersized source |
    /// | 4 | undecodable source |
    /// | 5 | I/O failure |
    /// | 6 | corrupt profile table |
    pub fn status_code(&self) -> i32 {
        match self {
            BatchError::OutputDir(OutputDirError::Aborted(_)) => 1,
            BatchError::InvalidRequest(_)
            | BatchError::OutputDir(OutputDirError::ContainsSource { .. }) => 2,
            BatchError::Catalog(
                CatalogError::DegenerateTarget { .. }
                | CatalogError::EmptyProfile(_)
                | CatalogError::DuplicateProfile(_),
            ) => 6,
            BatchError::Catalog(_) => 2,
            BatchError::UndersizedSource(_) => 3,
            BatchError::UnsupportedFormat { .. } => 4,
            BatchError::Io { .. } | BatchError::OutputDir(_) => 5,
        }
    }
}

/// A source that fails a profile's minimum-size check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndersizedFile {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub required: (u32, u32),
}

impl fmt::Display for UndersizedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is {}x{}, needs at least {}x{}",
            self.path.display(),
            self.width,
            self.height,
            self.required.0,
            self.required.1
        )
    }
}

fn describe_undersized(files: &[UndersizedFile]) -> String {
    let lines: Vec<String> = files.iter().map(|f| f.to_string()).collect();
    format!("source images too small: {}", lines.join("; "))
}

/// What to do with each source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CoverCrop,
    ContainCrop,
    PassThroughReencode,
}

impl Operation {
    /// The natural operation for a profile: re-encode for pass-through, cover otherwise.
    pub fn default_for(profile: &Profile) -> Self {
        if profile.is_pass_through() {
            Operation::PassThroughReencode
        } else {
            Operation::CoverCrop
        }
    }

    fn fit_mode(self) -> Option<FitMode> {
        match self {
            Operation::CoverCrop => Some(FitMode::Cover),
            Operation::ContainCrop => Some(FitMode::Contain),
            Operation::PassThroughReencode => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CoverCrop => f.write_str("cover-crop"),
            Operation::ContainCrop => f.write_str("contain-crop"),
            Operation::PassThroughReencode => f.write_str("pass-through-reencode"),
        }
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cover-crop" => Ok(Operation::CoverCrop),
            "contain-crop" => Ok(Operation::ContainCrop),
            "pass-through-reencode" => Ok(Operation::PassThroughReencode),
            other => Err(format!(
                "unknown operation '{other}' \
                 (expected cover-crop, contain-crop or pass-through-reencode)"
            )),
        }
    }
}

/// One batch, fixed before the engine starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub sources: Vec<PathBuf>,
    pub profile: String,
    pub operation: Operation,
    pub aspect_ratio: Option<String>,
    /// `None` uses the profile's default layout.
    pub layout: Option<DirectoryLayout>,
    /// `None` uses stem names for pass-through profiles and random names otherwise.
    pub naming: Option<NamingScheme>,
}

impl BatchRequest {
    pub fn new(sources: Vec<PathBuf>, profile: impl Into<String>, operation: Operation) -> Self {
        Self {
            sources,
            profile: profile.into(),
            operation,
            aspect_ratio: None,
            layout: None,
            naming: None,
        }
    }

    pub fn with_aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(ratio.into());
        self
    }

    pub fn with_layout(mut self, layout: DirectoryLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_naming(mut self, naming: NamingScheme) -> Self {
        self.naming = Some(naming);
        self
    }

    /// Check the request against the catalog. Touches nothing on disk.
    pub fn resolve(&self, catalog: &ProfileCatalog) -> Result<BatchPlan, BatchError> {
        if self.sources.is_empty() {
            return Err(BatchError::InvalidRequest("no source files given".into()));
        }
        let profile = catalog.get(&self.profile)?;
        let sizes = profile.sizes_for(self.aspect_ratio.as_deref())?;

        let fit = match (self.operation.fit_mode(), &sizes) {
            (None, SizeTable::PassThrough) => None,
            (Some(mode), SizeTable::Sized(_)) => Some(mode),
            (None, SizeTable::Sized(_)) => {
                return Err(BatchError::InvalidRequest(format!(
                    "profile '{}' has target sizes; use cover-crop or contain-crop",
                    profile.id
                )));
            }
            (Some(_), SizeTable::PassThrough) => {
                return Err(BatchError::InvalidRequest(format!(
                    "{} needs a profile with target sizes; '{}' only re-encodes",
                    self.operation, profile.id
                )));
            }
        };

        let naming = self.naming.unwrap_or(if sizes.is_pass_through() {
            NamingScheme::SanitizedStem
        } else {
            NamingScheme::Random
        });

        Ok(BatchPlan {
            profile: profile.id.clone(),
            category: profile.category.clone(),
            guard_undersized: profile.guard_undersized,
            layout: self.layout.unwrap_or(profile.default_layout),
            naming,
            fit,
            sizes,
        })
    }
}

/// A validated request with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub profile: String,
    pub category: String,
    pub guard_undersized: bool,
    pub layout: DirectoryLayout,
    pub naming: NamingScheme,
    /// `None` for pass-through re-encoding.
    pub fit: Option<FitMode>,
    pub sizes: SizeTable,
}

impl BatchPlan {
    fn labels(&self) -> Vec<&str> {
        match &self.sizes {
            SizeTable::Sized(sizes) => sizes.iter().map(|(label, _)| label.as_str()).collect(),
            SizeTable::PassThrough => Vec::new(),
        }
    }
}

/// One file written by the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenImage {
    pub source: PathBuf,
    /// Size label, `None` for pass-through.
    pub label: Option<String>,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// A source that could not be fully processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: PathBuf,
    pub reason: String,
}

/// Progress events, sent as the batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    DirectoryPrepared {
        path: PathBuf,
        recreated: bool,
    },
    SourceSkipped {
        source: PathBuf,
        reason: String,
    },
    SourceStarted {
        index: usize,
        total: usize,
        source: PathBuf,
    },
    VariantWritten(WrittenImage),
    SourceFailed(SourceFailure),
    Finished {
        written: usize,
        failed: usize,
        skipped: usize,
    },
}

/// Result of a batch that got as far as writing.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    /// Directory reported to the caller.
    pub output_dir: PathBuf,
    /// Every directory prepared for this batch.
    pub directories: Vec<PathBuf>,
    pub written: Vec<WrittenImage>,
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<SourceFailure>,
}

impl BatchOutcome {
    pub fn status_code(&self) -> i32 {
        if self.failures.is_empty() {
            0
        } else {
            STATUS_PARTIAL_FAILURE
        }
    }

    /// The output directory, followed by failed filenames if any.
    pub fn message(&self) -> String {
        let dir = self.output_dir.display().to_string();
        if self.failures.is_empty() {
            return dir;
        }
        let failed: Vec<String> = self
            .failures
            .iter()
            .map(|f| {
                let name = f
                    .source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| f.source.display().to_string());
                format!("{} ({})", name, f.reason)
            })
            .collect();
        format!("{}; failed: {}", dir, failed.join(", "))
    }
}

/// `(status, message)` for the caller.
pub fn status_of(result: &Result<BatchOutcome, BatchError>) -> (i32, String) {
    match result {
        Ok(outcome) => (outcome.status_code(), outcome.message()),
        Err(err) => (err.status_code(), err.to_string()),
    }
}

/// Everything a batch needs besides the request.
pub struct BatchContext<'a, B: ImageBackend> {
    pub backend: &'a B,
    pub catalog: &'a ProfileCatalog,
    pub config: &'a EngineConfig,
    pub names: NameRegistry,
    pub events: Option<Sender<BatchEvent>>,
}

impl<'a, B: ImageBackend> BatchContext<'a, B> {
    /// Built-in catalog, fresh random names, no events.
    pub fn new(backend: &'a B, config: &'a EngineConfig) -> Self {
        Self {
            backend,
            catalog: ProfileCatalog::builtin(),
            config,
            names: NameRegistry::new(),
            events: None,
        }
    }

    pub fn with_catalog(mut self, catalog: &'a ProfileCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_names(mut self, names: NameRegistry) -> Self {
        self.names = names;
        self
    }

    pub fn with_events(mut self, events: Sender<BatchEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is listening.
            let _ = tx.send(event);
        }
    }
}

/// Run a batch with the production backend and the built-in catalog.
pub fn run(
    request: &BatchRequest,
    config: &EngineConfig,
    confirm: &mut dyn ConfirmOverwrite,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchOutcome, BatchError> {
    let backend = RustBackend::new();
    let mut ctx = BatchContext::new(&backend, config);
    ctx.events = events;
    run_with_backend(&ctx, request, confirm)
}

/// The caller contract in one call: default config, `(status, message)` back.
pub fn optimize(
    sources: &[PathBuf],
    profile: &str,
    operation: Operation,
    aspect_ratio: Option<&str>,
    confirm: &mut dyn ConfirmOverwrite,
) -> (i32, String) {
    let mut request = BatchRequest::new(sources.to_vec(), profile, operation);
    request.aspect_ratio = aspect_ratio.map(str::to_string);
    status_of(&run(&request, &EngineConfig::default(), confirm, None))
}

/// Run a batch against a specific backend (allows testing with mock).
pub fn run_with_backend<B: ImageBackend>(
    ctx: &BatchContext<'_, B>,
    request: &BatchRequest,
    confirm: &mut dyn ConfirmOverwrite,
) -> Result<BatchOutcome, BatchError> {
    let plan = request.resolve(ctx.catalog)?;

    let (accepted, skipped): (Vec<PathBuf>, Vec<PathBuf>) = request
        .sources
        .iter()
        .cloned()
        .partition(|source| ctx.config.accepts(source));
    if accepted.is_empty() {
        return Err(BatchError::InvalidRequest(format!(
            "none of the {} source(s) has an accepted extension ({})",
            skipped.len(),
            ctx.config.input.extensions.join(", ")
        )));
    }

    if plan.guard_undersized {
        check_minimum_sizes(ctx.backend, &accepted, plan.sizes.minimum_source())?;
    }

    let directories = plan_directories(plan.layout, &plan.category, &accepted);
    check_sources_outside(&directories, &accepted)?;
    let prepared = prepare_all(&directories, confirm)?;

    for source in &skipped {
        ctx.emit(BatchEvent::SourceSkipped {
            source: source.clone(),
            reason: "unsupported extension".into(),
        });
    }
    for dir in &prepared {
        ctx.emit(BatchEvent::DirectoryPrepared {
            path: dir.path.clone(),
            recreated: dir.recreated,
        });
    }

    let reports = process_sources(ctx, &plan, &accepted);

    let mut written = Vec::new();
    let mut failures = Vec::new();
    for report in reports {
        written.extend(report.written);
        failures.extend(report.failure);
    }

    ctx.emit(BatchEvent::Finished {
        written: written.len(),
        failed: failures.len(),
        skipped: skipped.len(),
    });

    let reported = match plan.layout {
        DirectoryLayout::SharedCategoryFolder => directories[0].clone(),
        DirectoryLayout::PerSourceFolder => {
            let last = &accepted[accepted.len() - 1];
            directory_for(plan.layout, &plan.category, &accepted[0], last)
        }
    };

    Ok(BatchOutcome {
        output_dir: std::path::absolute(&reported).unwrap_or(reported),
        directories,
        written,
        skipped,
        failures,
    })
}

/// Identify every source and reject the batch if any is too small.
fn check_minimum_sizes(
    backend: &impl ImageBackend,
    sources: &[PathBuf],
    (min_w, min_h): (u32, u32),
) -> Result<(), BatchError> {
    let mut undersized = Vec::new();
    for source in sources {
        let dims = backend.identify(source).map_err(|e| match e {
            BackendError::Io(io) => BatchError::Io {
                path: source.clone(),
                source: io,
            },
            other => BatchError::UnsupportedFormat {
                path: source.clone(),
                reason: other.to_string(),
            },
        })?;
        if dims.width < min_w || dims.height < min_h {
            undersized.push(UndersizedFile {
                path: source.clone(),
                width: dims.width,
                height: dims.height,
                required: (min_w, min_h),
            });
        }
    }
    if undersized.is_empty() {
        Ok(())
    } else {
        Err(BatchError::UndersizedSource(undersized))
    }
}

/// What happened to one source.
struct SourceReport {
    written: Vec<WrittenImage>,
    failure: Option<SourceFailure>,
}

fn process_sources<B: ImageBackend>(
    ctx: &BatchContext<'_, B>,
    plan: &BatchPlan,
    sources: &[PathBuf],
) -> Vec<SourceReport> {
    let total = sources.len();
    let first = &sources[0];
    let job = |(index, source): (usize, &PathBuf)| {
        let dir = directory_for(plan.layout, &plan.category, first, source);
        process_source(ctx, plan, index + 1, total, source, &dir)
    };

    let threads = effective_threads(&ctx.config.processing);
    let parallel = threads > 1 && plan.naming == NamingScheme::Random && total > 1;
    let pool = parallel
        .then(|| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .ok()
        })
        .flatten();

    match pool {
        Some(pool) => pool.install(|| sources.par_iter().enumerate().map(job).collect()),
        None => sources.iter().enumerate().map(job).collect(),
    }
}

/// Decode one source and write all of its derivatives.
///
/// Names are claimed before anything is written, so a collision leaves the
/// source with no output at all.
fn process_source<B: ImageBackend>(
    ctx: &BatchContext<'_, B>,
    plan: &BatchPlan,
    index: usize,
    total: usize,
    source: &Path,
    dir: &Path,
) -> SourceReport {
    ctx.emit(BatchEvent::SourceStarted {
        index,
        total,
        source: source.to_path_buf(),
    });

    let mut written = Vec::new();
    let failure = write_derivatives(ctx, plan, source, dir, &mut written)
        .err()
        .map(|reason| {
            let failure = SourceFailure {
                source: source.to_path_buf(),
                reason,
            };
            ctx.emit(BatchEvent::SourceFailed(failure.clone()));
            failure
        });

    SourceReport { written, failure }
}

fn write_derivatives<B: ImageBackend>(
    ctx: &BatchContext<'_, B>,
    plan: &BatchPlan,
    source: &Path,
    dir: &Path,
    written: &mut Vec<WrittenImage>,
) -> Result<(), String> {
    let image = ctx.backend.decode(source).map_err(|e| e.to_string())?;

    let labels = plan.labels();
    let paths: Vec<PathBuf> = output_names(plan.naming, source, &labels, &ctx.names)
        .into_iter()
        .map(|name| dir.join(name))
        .collect();
    if plan.naming == NamingScheme::Random {
        ctx.names.claim_all(&paths).map_err(|e| e.to_string())?;
    }

    let quality = ctx.config.quality();
    let mut record = |label: Option<&str>, path: &Path, width: u32, height: u32| {
        let image = WrittenImage {
            source: source.to_path_buf(),
            label: label.map(str::to_string),
            path: path.to_path_buf(),
            width,
            height,
        };
        ctx.emit(BatchEvent::VariantWritten(image.clone()));
        written.push(image);
    };

    match (&plan.sizes, plan.fit) {
        (SizeTable::Sized(sizes), Some(mode)) => {
            for ((label, size), path) in sizes.iter().zip(&paths) {
                let derived = fit(&image, size.as_tuple(), mode).map_err(|e| e.to_string())?;
                ctx.backend
                    .encode(&derived, path, quality)
                    .map_err(|e| e.to_string())?;
                record(Some(label.as_str()), path, derived.width(), derived.height());
            }
        }
        _ => {
            let path = &paths[0];
            ctx.backend
                .encode(&image, path, quality)
                .map_err(|e| e.to_string())?;
            record(None, path, image.width(), image.height());
        }
    }
    Ok(())
}

//! End-to-end `build` pipeline: registry → copy → compile → post-process → manifest.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;
use tracing::{debug, error, info, instrument, warn};

use notesite_preview::{PreviewSource, extract_preview};
use notesite_render::RenderedArtifact;
use notesite_shared::{
    BuildConfig, NoteDescriptor, NoteRecord, NotesiteError, RenderStrategy, Result,
};

use crate::assembler;
use crate::compiler::{CompileRequest, CompileStatus, Compiler, OutputFormat};
use crate::registry;
use crate::timestamp::TimestampSource;

/// Rendered page of every note.
pub const NOTE_PAGE: &str = "index.html";

/// Synthesized source that fixes page geometry for the SVG strategy.
pub const WRAPPER_FILE: &str = "_wrapper.typ";

/// Scratch directory inside a note's output folder that receives the SVG pages.
pub const PAGES_DIR: &str = ".pages";

/// Output path pattern of per-page SVG files; `{n}` is the page number.
const SVG_PAGE_PATTERN: &str = "page-{n}.svg";

static SVG_PAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^page-(\d+)\.svg$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a note produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The note's source folder does not exist.
    MissingSource(PathBuf),
    /// The compiler exited with a non-zero status.
    CompileFailed { status: Option<i32>, stderr: String },
    /// The compiler succeeded but its SVG pages are missing or not numbered 1..=n.
    PageOutput(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSource(path) => write!(f, "folder not found: {}", path.display()),
            Self::CompileFailed {
                status: Some(code), ..
            } => write!(f, "compiler exited with status {code}"),
            Self::CompileFailed { status: None, .. } => {
                f.write_str("compiler terminated by signal")
            }
            Self::PageOutput(message) => write!(f, "unusable page output: {message}"),
        }
    }
}

/// Result of building one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteOutcome {
    Built(NoteRecord),
    Skipped { folder: String, reason: SkipReason },
}

/// Result of a full build.
#[derive(Debug)]
pub struct BuildReport {
    /// Records as written to `notes-data.json`, newest first.
    pub records: Vec<NoteRecord>,
    /// Skipped notes, in registry order.
    pub skipped: Vec<(String, SkipReason)>,
    /// Output directory.
    pub output_dir: PathBuf,
    /// Total elapsed time.
    pub elapsed: Duration,
}

impl BuildReport {
    pub fn built(&self) -> usize {
        self.records.len()
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting build status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before a note is processed.
    fn note_started(&self, folder: &str, current: usize, total: usize);
    /// Called after a note is processed.
    fn note_finished(&self, outcome: &NoteOutcome);
    /// Called when the build completes.
    fn done(&self, report: &BuildReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn note_started(&self, _folder: &str, _current: usize, _total: usize) {}
    fn note_finished(&self, _outcome: &NoteOutcome) {}
    fn done(&self, _report: &BuildReport) {}
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

/// Run the full build.
///
/// 1. Recreate the output directory
/// 2. Load the registry
/// 3. Build each note in registry order, skipping failures
/// 4. Sort records newest first and write `notes-data.json`
/// 5. Copy the site assets
#[instrument(skip_all, fields(root = %config.root.display(), strategy = %config.strategy))]
pub fn build_site(
    config: &BuildConfig,
    compiler: &dyn Compiler,
    timestamps: &dyn TimestampSource,
    progress: &dyn ProgressReporter,
) -> Result<BuildReport> {
    let start = Instant::now();
    config.validate()?;

    info!(output = %config.output_dir.display(), "starting build");

    // --- Phase 1: Output directory ---
    progress.phase("Preparing output directory");
    assembler::prepare_output_dir(&config.output_dir)?;

    // --- Phase 2: Registry ---
    progress.phase("Reading note registry");
    let notes = registry::load_registry(&config.registry_path)?;

    // --- Phase 3: Notes ---
    progress.phase("Building notes");
    let mut records = Vec::with_capacity(notes.len());
    let mut skipped = Vec::new();
    let total = notes.len();

    for (i, note) in notes.iter().enumerate() {
        progress.note_started(&note.folder, i + 1, total);

        let outcome = build_note(config, note, compiler, timestamps)?;
        progress.note_finished(&outcome);

        match outcome {
            NoteOutcome::Built(record) => records.push(record),
            NoteOutcome::Skipped { folder, reason } => skipped.push((folder, reason)),
        }
    }

    // --- Phase 4: Manifest ---
    progress.phase("Writing note manifest");
    sort_records(&mut records);
    assembler::write_notes_data(&config.output_dir, &records)?;

    // --- Phase 5: Site assets ---
    progress.phase("Copying site assets");
    assembler::copy_site_assets(&config.site_dir, &config.output_dir)?;

    let report = BuildReport {
        records,
        skipped,
        output_dir: config.output_dir.clone(),
        elapsed: start.elapsed(),
    };

    progress.done(&report);

    info!(
        built = report.built(),
        skipped = report.skipped.len(),
        elapsed_ms = report.elapsed.as_millis(),
        "build complete"
    );

    Ok(report)
}

/// Order records newest first. Equal timestamps keep their relative order.
pub fn sort_records(records: &mut [NoteRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Build one note into `<output_dir>/notes/<folder>/`.
///
/// A missing folder, a failing compile, or unusable SVG pages is a
/// [`NoteOutcome::Skipped`]; `Err` is reserved for I/O failures and a compiler
/// that cannot be started.
#[instrument(skip_all, fields(folder = %note.folder))]
pub fn build_note(
    config: &BuildConfig,
    note: &NoteDescriptor,
    compiler: &dyn Compiler,
    timestamps: &dyn TimestampSource,
) -> Result<NoteOutcome> {
    let src_dir = config.note_source_dir(&note.folder);
    if !src_dir.is_dir() {
        warn!(path = %src_dir.display(), "note folder not found, skipping");
        return Ok(NoteOutcome::Skipped {
            folder: note.folder.clone(),
            reason: SkipReason::MissingSource(src_dir),
        });
    }

    // Copy the whole folder so images and other assets ship with the page.
    let dst_dir = config.note_output_dir(&note.folder);
    let copied = assembler::copy_dir_recursive(&src_dir, &dst_dir)?;
    debug!(files = copied, "copied note sources");

    let entry = dst_dir.join(&config.entry_file);
    let page_path = dst_dir.join(NOTE_PAGE);

    let status = match config.strategy {
        RenderStrategy::Html => compiler.compile(&CompileRequest {
            format: OutputFormat::Html,
            input: &entry,
            output: &page_path,
        })?,
        RenderStrategy::Svg => {
            let wrapper = write_wrapper(config, &dst_dir)?;
            let pages_dir = prepare_pages_dir(&dst_dir)?;
            compiler.compile(&CompileRequest {
                format: OutputFormat::Svg,
                input: &wrapper,
                output: &pages_dir.join(SVG_PAGE_PATTERN),
            })?
        }
    };

    if let CompileStatus::Failed { code, stderr } = status {
        error!(input = %entry.display(), status = ?code, "compilation failed:\n{stderr}");
        remove_scratch(&dst_dir);
        return Ok(NoteOutcome::Skipped {
            folder: note.folder.clone(),
            reason: SkipReason::CompileFailed {
                status: code,
                stderr,
            },
        });
    }

    let (artifact, preview) = match config.strategy {
        RenderStrategy::Html => {
            let html = read_file(&page_path)?;
            // Preview comes from the compiler output, before injection.
            let preview = extract_preview(PreviewSource::Html(&html), config.preview_max_len);
            (RenderedArtifact::Html(html), preview)
        }
        RenderStrategy::Svg => {
            let pages_dir = dst_dir.join(PAGES_DIR);
            let page_files = match collect_svg_pages(&pages_dir) {
                Ok(files) => files,
                Err(NotesiteError::Render { message }) => {
                    error!(%message, "unusable page output");
                    remove_scratch(&dst_dir);
                    return Ok(NoteOutcome::Skipped {
                        folder: note.folder.clone(),
                        reason: SkipReason::PageOutput(message),
                    });
                }
                Err(e) => return Err(e),
            };
            let pages = page_files
                .iter()
                .map(|path| read_file(path))
                .collect::<Result<Vec<_>>>()?;
            std::fs::remove_dir_all(&pages_dir).map_err(|e| NotesiteError::io(&pages_dir, e))?;
            let source = read_file(&entry)?;
            let preview = extract_preview(PreviewSource::Markup(&source), config.preview_max_len);
            (RenderedArtifact::SvgPages(pages), preview)
        }
    };

    let page = artifact.into_page(&note.title);
    std::fs::write(&page_path, page).map_err(|e| NotesiteError::io(&page_path, e))?;

    let removed = assembler::remove_sources(&dst_dir)?;
    debug!(removed, "removed sources from output");

    let timestamp = timestamps.resolve(&src_dir);

    info!(timestamp, preview_len = preview.chars().count(), "note built");

    Ok(NoteOutcome::Built(NoteRecord::from_descriptor(
        note, timestamp, preview,
    )))
}

// ---------------------------------------------------------------------------
// SVG strategy helpers
// ---------------------------------------------------------------------------

/// Write the wrapper source that sets page geometry and includes the note.
fn write_wrapper(config: &BuildConfig, dst_dir: &Path) -> Result<PathBuf> {
    let page = &config.page;
    let content = format!(
        "#set page(width: {}, height: {}, margin: {})\n#include \"{}\"\n",
        page.width, page.height, page.margin, config.entry_file
    );

    let path = dst_dir.join(WRAPPER_FILE);
    std::fs::write(&path, content).map_err(|e| NotesiteError::io(&path, e))?;
    Ok(path)
}

/// Create an empty scratch directory for the compiler's page files.
///
/// Pages go here rather than next to the note's own assets, which may include
/// SVG files with page-like names.
fn prepare_pages_dir(dst_dir: &Path) -> Result<PathBuf> {
    let dir = dst_dir.join(PAGES_DIR);
    if dir.exists() {
        std::fs::remove_dir_all(&dir).map_err(|e| NotesiteError::io(&dir, e))?;
    }
    std::fs::create_dir_all(&dir).map_err(|e| NotesiteError::io(&dir, e))?;
    Ok(dir)
}

/// Best-effort removal of the wrapper source and page scratch directory after a failure.
fn remove_scratch(dst_dir: &Path) {
    let wrapper = dst_dir.join(WRAPPER_FILE);
    if wrapper.exists() {
        if let Err(e) = std::fs::remove_file(&wrapper) {
            warn!(path = %wrapper.display(), error = %e, "could not remove wrapper source");
        }
    }

    let pages = dst_dir.join(PAGES_DIR);
    if pages.exists() {
        if let Err(e) = std::fs::remove_dir_all(&pages) {
            warn!(path = %pages.display(), error = %e, "could not remove page scratch directory");
        }
    }
}

/// Per-page SVG files in page order. Pages must be numbered 1..=n without gaps.
///
/// A missing directory, no pages, or a gap is a `Render` error.
fn collect_svg_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(NotesiteError::render(format!(
            "compiler produced no page directory at {}",
            dir.display()
        )));
    }

    let mut pages: Vec<(u32, PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(dir).map_err(|e| NotesiteError::io(dir, e))? {
        let entry = entry.map_err(|e| NotesiteError::io(dir, e))?;
        let name = entry.file_name();
        let Some(caps) = name.to_str().and_then(|n| SVG_PAGE_RE.captures(n)) else {
            continue;
        };
        let number: u32 = caps[1]
            .parse()
            .map_err(|e| NotesiteError::render(format!("bad page number in {name:?}: {e}")))?;
        pages.push((number, entry.path()));
    }

    if pages.is_empty() {
        return Err(NotesiteError::render(format!(
            "compiler produced no pages in {}",
            dir.display()
        )));
    }

    pages.sort_by_key(|(number, _)| *number);
    for (expected, (number, path)) in (1..).zip(&pages) {
        if *number != expected {
            return Err(NotesiteError::render(format!(
                "page {expected} missing before {}",
                path.display()
            )));
        }
    }

    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| NotesiteError::io(path, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

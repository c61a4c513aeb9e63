//! Output directory assembler.
//!
//! Prepares the output tree, copies note sources into it, and writes the
//! site-level files. Layout:
//! ```text
//! <output_dir>/
//! ├── notes-data.json
//! ├── index.html
//! ├── style.css
//! ├── script.js
//! └── notes/
//!     └── <folder>/
//!         ├── index.html
//!         └── ...        (images and other assets, no .typ sources)
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use notesite_shared::{NoteRecord, NotesiteError, Result};

/// Name of the note manifest written to the output root.
pub const NOTES_DATA_FILE: &str = "notes-data.json";

/// Static site files copied from the site directory to the output root.
pub const SITE_ASSETS: [&str; 3] = ["index.html", "style.css", "script.js"];

/// Extension of Typst source files, removed from the output after compiling.
pub const SOURCE_EXTENSION: &str = "typ";

/// Delete the output directory if present and create it empty.
#[instrument(skip_all, fields(path = %dir.display()))]
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(|e| NotesiteError::io(dir, e))?;
        debug!("removed previous output");
    }
    std::fs::create_dir_all(dir).map_err(|e| NotesiteError::io(dir, e))?;
    Ok(())
}

/// Recursively copy a directory. Symlinks are skipped. Returns the number of files copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<usize> {
    std::fs::create_dir_all(dst).map_err(|e| NotesiteError::io(dst, e))?;

    let mut copied = 0;
    for entry in std::fs::read_dir(src).map_err(|e| NotesiteError::io(src, e))? {
        let entry = entry.map_err(|e| NotesiteError::io(src, e))?;
        let src_path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| NotesiteError::io(&src_path, e))?;

        if file_type.is_symlink() {
            warn!(path = %src_path.display(), "skipping symlink");
            continue;
        }

        let dst_path = dst.join(entry.file_name());
        if file_type.is_dir() {
            copied += copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path).map_err(|e| NotesiteError::io(&src_path, e))?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Delete every Typst source under `dir`, recursively. Returns the number removed.
pub fn remove_sources(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir).map_err(|e| NotesiteError::io(dir, e))? {
        let entry = entry.map_err(|e| NotesiteError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| NotesiteError::io(&path, e))?;

        if file_type.is_dir() {
            removed += remove_sources(&path)?;
        } else if path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            std::fs::remove_file(&path).map_err(|e| NotesiteError::io(&path, e))?;
            debug!(path = %path.display(), "removed source");
            removed += 1;
        }
    }
    Ok(removed)
}

/// Write `notes-data.json`: pretty-printed, with a trailing newline.
///
/// The file is written to a temporary name first and renamed into place.
#[instrument(skip_all, fields(count = records.len()))]
pub fn write_notes_data(output_dir: &Path, records: &[NoteRecord]) -> Result<PathBuf> {
    let mut json = serde_json::to_string_pretty(records)
        .map_err(|e| NotesiteError::Serialize(format!("{NOTES_DATA_FILE}: {e}")))?;
    json.push('\n');

    let target = output_dir.join(NOTES_DATA_FILE);
    let temp = output_dir.join(format!(".{NOTES_DATA_FILE}.tmp"));

    std::fs::write(&temp, json).map_err(|e| NotesiteError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| NotesiteError::io(&target, e))?;

    info!(path = %target.display(), "wrote note manifest");
    Ok(target)
}

/// Copy the fixed site assets into the output root. A missing asset is an error.
#[instrument(skip_all, fields(site_dir = %site_dir.display()))]
pub fn copy_site_assets(site_dir: &Path, output_dir: &Path) -> Result<()> {
    for name in SITE_ASSETS {
        let src = site_dir.join(name);
        let dst = output_dir.join(name);
        std::fs::copy(&src, &dst).map_err(|e| NotesiteError::io(&src, e))?;
        debug!(file = name, "copied site asset");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

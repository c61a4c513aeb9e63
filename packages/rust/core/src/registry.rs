//! Note registry loading (`notes/notes.json`).

use std::collections::HashSet;
use std::path::{Component, Path};

use tracing::{debug, info, instrument};

use notesite_shared::{NoteDescriptor, NotesiteError, Result};

/// Read the note registry. Any failure here aborts the build.
///
/// Besides well-formed JSON with `title` and `folder` on every entry, folders
/// must be unique and name a single directory (no separators, no `..`), since
/// each one keys a directory of the output tree.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_registry(path: &Path) -> Result<Vec<NoteDescriptor>> {
    let content = std::fs::read_to_string(path).map_err(|e| NotesiteError::io(path, e))?;

    let notes: Vec<NoteDescriptor> = serde_json::from_str(&content).map_err(|e| {
        NotesiteError::registry(format!("invalid {}: {e}", path.display()))
    })?;

    let mut seen = HashSet::new();
    for note in &notes {
        if !is_plain_folder_name(&note.folder) {
            return Err(NotesiteError::registry(format!(
                "folder '{}' of note '{}' is not a plain directory name",
                note.folder, note.title
            )));
        }
        if !seen.insert(note.folder.as_str()) {
            return Err(NotesiteError::registry(format!(
                "duplicate folder '{}'",
                note.folder
            )));
        }
        debug!(folder = %note.folder, labels = note.labels.len(), "registry entry");
    }

    info!(count = notes.len(), "registry loaded");
    Ok(notes)
}

fn is_plain_folder_name(folder: &str) -> bool {
    let mut components = Path::new(folder).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !folder.contains(['/', '\\'])
}

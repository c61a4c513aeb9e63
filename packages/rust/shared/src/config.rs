//! Build configuration for notesite.
//!
//! Project config lives at `<root>/notesite.toml` and is optional.
//! CLI flags override config file values, which override defaults.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NotesiteError, Result};
use crate::types::RenderStrategy;

/// Default configuration file name, looked up in the project root.
const CONFIG_FILE_NAME: &str = "notesite.toml";

/// Registry file name inside the notes directory.
const REGISTRY_FILE_NAME: &str = "notes.json";

// ---------------------------------------------------------------------------
// Config structs (matching notesite.toml schema)
// ---------------------------------------------------------------------------

/// Top-level project config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input and output locations, relative to the project root.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Rendering and preview settings.
    #[serde(default)]
    pub build: BuildSection,

    /// External compiler settings.
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Page geometry for the SVG strategy's wrapper source.
    #[serde(default)]
    pub page: PageGeometry,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding `notes.json` and one folder per note.
    #[serde(default = "default_notes_dir")]
    pub notes_dir: String,

    /// Directory holding the static site assets.
    #[serde(default = "default_site_dir")]
    pub site_dir: String,

    /// Build output directory. Destroyed and recreated on every build.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            notes_dir: default_notes_dir(),
            site_dir: default_site_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_notes_dir() -> String {
    "notes".into()
}
fn default_site_dir() -> String {
    "site".into()
}
fn default_output_dir() -> String {
    "dist".into()
}

/// `[build]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    /// Render strategy: "html" or "svg".
    #[serde(default)]
    pub strategy: RenderStrategy,

    /// Maximum preview length in characters, ellipsis included.
    #[serde(default = "default_preview_max_len")]
    pub preview_max_len: usize,

    /// Primary source file inside each note folder.
    #[serde(default = "default_entry_file")]
    pub entry_file: String,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            strategy: RenderStrategy::default(),
            preview_max_len: default_preview_max_len(),
            entry_file: default_entry_file(),
        }
    }
}

fn default_preview_max_len() -> usize {
    200
}
fn default_entry_file() -> String {
    "main.typ".into()
}

/// `[compiler]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Compiler executable, resolved through `PATH`.
    #[serde(default = "default_compiler_command")]
    pub command: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            command: default_compiler_command(),
        }
    }
}

fn default_compiler_command() -> String {
    "typst".into()
}

/// `[page]` section. Values are Typst lengths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageGeometry {
    #[serde(default = "default_page_width")]
    pub width: String,
    #[serde(default = "default_page_height")]
    pub height: String,
    #[serde(default = "default_page_margin")]
    pub margin: String,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: default_page_width(),
            height: default_page_height(),
            margin: default_page_margin(),
        }
    }
}

fn default_page_width() -> String {
    "210mm".into()
}
fn default_page_height() -> String {
    "297mm".into()
}
fn default_page_margin() -> String {
    "20mm".into()
}

// ---------------------------------------------------------------------------
// Build config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime build configuration with every path resolved against the project root.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root; working directory for the compiler and version control.
    pub root: PathBuf,
    /// Directory holding the registry and note folders.
    pub notes_dir: PathBuf,
    /// Static site asset directory.
    pub site_dir: PathBuf,
    /// Output directory.
    pub output_dir: PathBuf,
    /// Registry path (`<notes_dir>/notes.json`).
    pub registry_path: PathBuf,
    pub strategy: RenderStrategy,
    pub preview_max_len: usize,
    pub entry_file: String,
    pub compiler_command: String,
    pub page: PageGeometry,
}

impl BuildConfig {
    /// Resolve a project config against a root directory.
    pub fn resolve(config: &AppConfig, root: &Path) -> Self {
        let notes_dir = root.join(&config.paths.notes_dir);
        Self {
            root: root.to_path_buf(),
            registry_path: notes_dir.join(REGISTRY_FILE_NAME),
            notes_dir,
            site_dir: root.join(&config.paths.site_dir),
            output_dir: root.join(&config.paths.output_dir),
            strategy: config.build.strategy,
            preview_max_len: config.build.preview_max_len,
            entry_file: config.build.entry_file.clone(),
            compiler_command: config.compiler.command.clone(),
            page: config.page.clone(),
        }
    }

    /// Reject settings no build could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.preview_max_len == 0 {
            return Err(NotesiteError::config("preview_max_len must be at least 1"));
        }
        if self.compiler_command.trim().is_empty() {
            return Err(NotesiteError::config("compiler command must not be empty"));
        }
        if self.entry_file.trim().is_empty() {
            return Err(NotesiteError::config("entry_file must not be empty"));
        }

        // The output directory is wiped on every build, so it must not contain
        // any input directory.
        let output = normalize_path(&self.output_dir)?;
        for (name, input) in [
            ("project root", &self.root),
            ("notes_dir", &self.notes_dir),
            ("site_dir", &self.site_dir),
        ] {
            if normalize_path(input)?.starts_with(&output) {
                return Err(NotesiteError::config(format!(
                    "output_dir {} would overwrite the {name} {}",
                    self.output_dir.display(),
                    input.display()
                )));
            }
        }
        Ok(())
    }

    /// Source folder of a note.
    pub fn note_source_dir(&self, folder: &str) -> PathBuf {
        self.notes_dir.join(folder)
    }

    /// Output folder of a note (`<output_dir>/notes/<folder>`).
    pub fn note_output_dir(&self, folder: &str) -> PathBuf {
        self.output_dir.join("notes").join(folder)
    }
}

/// Absolute form of `path` with `.` and `..` resolved lexically.
///
/// Symlinks are not followed and the path need not exist.
pub fn normalize_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|e| NotesiteError::io(path, e))?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Path to the project config file (`<root>/notesite.toml`).
pub fn config_file_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Load the project config. Returns defaults if the file does not exist.
pub fn load_config(root: &Path) -> Result<AppConfig> {
    let path = config_file_path(root);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the project config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NotesiteError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| NotesiteError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default config file into the project root.
/// Returns the path to the created file. An existing file is left untouched.
pub fn init_config(root: &Path) -> Result<PathBuf> {
    let path = config_file_path(root);
    if path.exists() {
        return Err(NotesiteError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NotesiteError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NotesiteError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

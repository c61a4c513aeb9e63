//! Core domain types for notesite builds.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// NoteDescriptor
// ---------------------------------------------------------------------------

/// One entry of the note registry (`notes.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDescriptor {
    /// Display title.
    pub title: String,
    /// Folder name under the notes directory; unique per registry.
    pub folder: String,
    /// Free-form labels, in registry order.
    #[serde(default)]
    pub labels: Vec<String>,
}

// ---------------------------------------------------------------------------
// NoteRecord
// ---------------------------------------------------------------------------

/// A built note, as written to `notes-data.json`.
///
/// Field order is part of the output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub title: String,
    pub folder: String,
    pub labels: Vec<String>,
    /// Unix seconds of the last change to the note's sources.
    pub timestamp: i64,
    /// Short plain-text summary for the index listing.
    pub preview: String,
}

impl NoteRecord {
    /// Build a record from its descriptor plus the values derived during the build.
    pub fn from_descriptor(descriptor: &NoteDescriptor, timestamp: i64, preview: String) -> Self {
        Self {
            title: descriptor.title.clone(),
            folder: descriptor.folder.clone(),
            labels: descriptor.labels.clone(),
            timestamp,
            preview,
        }
    }
}

// ---------------------------------------------------------------------------
// RenderStrategy
// ---------------------------------------------------------------------------

/// How notes are rendered. Chosen once per build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStrategy {
    /// Compiler emits one HTML document; navigation and stylesheet are injected.
    #[default]
    Html,
    /// Compiler emits one SVG per page; pages are inlined into a generated HTML page.
    Svg,
}

impl RenderStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Svg => "svg",
        }
    }
}

impl std::fmt::Display for RenderStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RenderStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "svg" => Ok(Self::Svg),
            other => Err(format!("unknown render strategy '{other}': expected 'html' or 'svg'")),
        }
    }
}

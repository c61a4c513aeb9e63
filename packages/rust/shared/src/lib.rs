//! Shared types, error model, and configuration for notesite.
//!
//! This crate is the foundation depended on by all other notesite crates.
//! It provides:
//! - [`NotesiteError`] for the unified error type
//! - Domain types ([`NoteDescriptor`], [`NoteRecord`], [`RenderStrategy`])
//! - Configuration ([`AppConfig`], [`BuildConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildConfig, BuildSection, CompilerConfig, PageGeometry, PathsConfig,
    config_file_path, init_config, load_config, load_config_from, normalize_path,
};
pub use error::{NotesiteError, Result};
pub use types::{NoteDescriptor, NoteRecord, RenderStrategy};

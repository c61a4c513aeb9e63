//! Build pipeline for notesite.
//!
//! Reads the note registry, compiles each note through an external compiler,
//! post-processes the output into site pages, and writes the note manifest
//! alongside the static site assets.

pub mod assembler;
pub mod compiler;
pub mod pipeline;
pub mod registry;
pub mod timestamp;

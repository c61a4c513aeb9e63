//! External document compiler invocation.
//!
//! The compiler runs as a blocking subprocess, one invocation per note.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, instrument};

use notesite_shared::{BuildConfig, NotesiteError, Result};

/// Output format requested from the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One HTML document.
    Html,
    /// One SVG per page; the output path carries a `{n}` page-number placeholder.
    Svg,
}

/// One compiler invocation.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub format: OutputFormat,
    pub input: &'a Path,
    pub output: &'a Path,
}

/// Result of a compiler run that actually started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileStatus {
    Success,
    /// Non-zero exit. `code` is `None` when the process was killed by a signal.
    Failed { code: Option<i32>, stderr: String },
}

/// Something that turns a note source into rendered output.
pub trait Compiler {
    /// Run one compilation. `Err` only when the compiler could not be run at all.
    fn compile(&self, request: &CompileRequest<'_>) -> Result<CompileStatus>;
}

/// The Typst command-line compiler.
#[derive(Debug, Clone)]
pub struct TypstCompiler {
    command: String,
    working_dir: PathBuf,
}

impl TypstCompiler {
    pub fn new(command: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            working_dir: working_dir.into(),
        }
    }

    /// Compiler configured for a build: its command, run from the project root.
    pub fn from_config(config: &BuildConfig) -> Self {
        Self::new(&config.compiler_command, &config.root)
    }

    fn args(request: &CompileRequest<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["compile".into(), "--format".into()];
        match request.format {
            OutputFormat::Html => {
                args.extend(["html".into(), "--features".into(), "html".into()]);
            }
            OutputFormat::Svg => args.push("svg".into()),
        }
        args.push(request.input.into());
        args.push(request.output.into());
        args
    }
}

impl Compiler for TypstCompiler {
    #[instrument(skip_all, fields(input = %request.input.display(), format = ?request.format))]
    fn compile(&self, request: &CompileRequest<'_>) -> Result<CompileStatus> {
        let output = Command::new(&self.command)
            .args(Self::args(request))
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| {
                NotesiteError::Compiler(format!(
                    "failed to run `{}`: {e}. Is it installed?",
                    self.command
                ))
            })?;

        if output.status.success() {
            debug!("compiled");
            return Ok(CompileStatus::Success);
        }

        Ok(CompileStatus::Failed {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use notesite_core::compiler::TypstCompiler;
use notesite_core::pipeline::{BuildReport, NoteOutcome, ProgressReporter, build_site};
use notesite_core::timestamp::GitTimestamps;
use notesite_preview::{DEFAULT_MAX_LEN, PreviewSource, extract_preview};
use notesite_shared::{
    AppConfig, BuildConfig, RenderStrategy, init_config, load_config, load_config_from,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// notesite: a static site for Typst notes.
#[derive(Parser)]
#[command(
    name = "notesite",
    version,
    about = "Build a static notes website from Typst sources.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build the site into the output directory.
    Build {
        /// Project root containing notes/ and site/.
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Config file (defaults to <root>/notesite.toml).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory (overrides the config).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Render strategy: html or svg (overrides the config).
        #[arg(short, long)]
        strategy: Option<RenderStrategy>,

        /// Maximum preview length in characters (overrides the config).
        #[arg(long)]
        max_preview: Option<usize>,
    },

    /// Print the preview text extracted from one HTML or Typst file.
    Preview {
        /// File to read. `.html`/`.htm` files are read as HTML, anything else as Typst.
        file: PathBuf,

        /// Maximum preview length in characters.
        #[arg(long, default_value_t = DEFAULT_MAX_LEN)]
        max_len: usize,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write notesite.toml with defaults.
    Init {
        /// Project root.
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Show the resolved configuration.
    Show {
        /// Project root.
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "notesite=info",
        1 => "notesite=debug",
        _ => "notesite=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build {
            root,
            config,
            out,
            strategy,
            max_preview,
        } => cmd_build(&root, config.as_deref(), out, strategy, max_preview),
        Command::Preview { file, max_len } => cmd_preview(&file, max_len),
        Command::Config { action } => match action {
            ConfigAction::Init { root } => cmd_config_init(&root),
            ConfigAction::Show { root } => cmd_config_show(&root),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_build(
    root: &Path,
    config_path: Option<&Path>,
    out: Option<PathBuf>,
    strategy: Option<RenderStrategy>,
    max_preview: Option<usize>,
) -> Result<()> {
    let mut app = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config(root)?,
    };

    if let Some(strategy) = strategy {
        app.build.strategy = strategy;
    }
    if let Some(max) = max_preview {
        app.build.preview_max_len = max;
    }

    let config = resolve_build_config(&app, root, out);

    info!(
        root = %config.root.display(),
        strategy = %config.strategy,
        "build requested"
    );

    let compiler = TypstCompiler::from_config(&config);
    let timestamps = GitTimestamps::new(&config.root);
    let reporter = CliProgress::new();

    let report = build_site(&config, &compiler, &timestamps, &reporter)
        .wrap_err("site build failed")?;

    print_summary(&report);
    Ok(())
}

/// Resolve the build config; a relative `--out` is taken from the project root.
fn resolve_build_config(app: &AppConfig, root: &Path, out: Option<PathBuf>) -> BuildConfig {
    let mut config = BuildConfig::resolve(app, root);
    if let Some(out) = out {
        config.output_dir = root.join(out);
    }
    config
}

fn print_summary(report: &BuildReport) {
    println!();
    println!(
        "  Built {} note(s) into {}/",
        report.built(),
        report.output_dir.display()
    );
    if !report.skipped.is_empty() {
        println!("  Skipped {}:", report.skipped.len());
        for (folder, reason) in &report.skipped {
            println!("    {folder}: {reason}");
        }
    }
    println!("  Time: {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

fn cmd_preview(file: &Path, max_len: usize) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("cannot read '{}'", file.display()))?;

    let is_html = file
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));

    let source = if is_html {
        PreviewSource::Html(&content)
    } else {
        PreviewSource::Markup(&content)
    };

    println!("{}", extract_preview(source, max_len));
    Ok(())
}

fn cmd_config_init(root: &Path) -> Result<()> {
    let path = init_config(root)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(root: &Path) -> Result<()> {
    let config: AppConfig = load_config(root)?;
    let toml_str = toml::to_string_pretty(&config)
        .map_err(|e| eyre!("cannot render config as TOML: {e}"))?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn note_started(&self, folder: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Building [{current}/{total}] {folder}"));
    }

    fn note_finished(&self, outcome: &NoteOutcome) {
        if let NoteOutcome::Skipped { folder, .. } = outcome {
            self.spinner.set_message(format!("Skipped {folder}"));
        }
    }

    fn done(&self, _report: &BuildReport) {
        self.spinner.finish_and_clear();
    }
}

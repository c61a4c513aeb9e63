//! notesite CLI: builds a static notes site from Typst sources.
//!
//! Compiles every registered note, wraps the output into site pages, and
//! writes the note manifest consumed by the site's index page.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}

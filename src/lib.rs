//! rowdupe - Duplicate Row Finder
//!
//! Finds rows in CSV, TSV and Parquet data whose key columns hold identical
//! values. Keys are canonicalized and hashed with BLAKE3; digesting runs in
//! parallel with rayon.
//!
//! Pipeline: [`source`] → [`fields`] → [`duplicates`] → [`output`].

pub mod app;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod fields;
pub mod logging;
pub mod output;
pub mod progress;
pub mod source;

use anyhow::{Context, Result};

use crate::app::RunOptions;
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::ExitCode;

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns any fatal error; the caller maps it to an exit code.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet, cli.no_color);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    log::debug!("Effective configuration: {:?}", config);

    let options = RunOptions::for_terminal(cli.quiet, cli.no_color);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Check(ref args) => app::run_check(args, &config, options, &mut out),
        Commands::Show(ref args) => app::run_show(args, &config, options, &mut out),
    }
}

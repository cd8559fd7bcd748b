//! Command execution.
//!
//! Each command opens its input, runs the pipeline and writes the report to
//! the given writer. Warnings go through `log` (stderr) before the step they
//! affect continues.

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{CheckArgs, InputArgs, ShowArgs};
use crate::config::{parse_delimiter, Config};
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::fields::{FieldResolver, PrimaryKeyHints, SelectionRequest};
use crate::output::{JsonReport, OutputFormat, Report, RowListing, TextReport};
use crate::progress::Progress;
use crate::source::{open_input, Dataset, SourceOptions};

/// Terminal-facing options shared by all commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Hide progress bars
    pub quiet: bool,
    /// Style the text report
    pub color: bool,
}

impl RunOptions {
    /// Options for writing to the real stdout.
    #[must_use]
    pub fn for_terminal(quiet: bool, no_color: bool) -> Self {
        Self {
            quiet: quiet || !std::io::stderr().is_terminal(),
            color: !no_color && std::io::stdout().is_terminal(),
        }
    }
}

/// Open the input named by `args`, with CLI flags over `config`.
fn load_dataset(args: &InputArgs, config: &Config) -> Result<Dataset> {
    let delimiter = match args.delimiter {
        Some(ref d) => parse_delimiter(d)?,
        None => config.delimiter_byte()?,
    };
    let options = SourceOptions {
        delimiter,
        allow_schema_mismatch: args.allow_schema_mismatch || config.allow_schema_mismatch,
    };
    let dataset = open_input(&args.path, &options)
        .with_context(|| format!("Failed to open {}", args.path.display()))?;
    if dataset.is_partial() {
        log::warn!(
            "{} input file(s) could not be read; continuing with {} readable file(s)",
            dataset.failures().len(),
            dataset.files().len()
        );
    }
    Ok(dataset)
}

/// Name used for primary-key hint lookup: the first file actually read.
fn hint_input_name(dataset: &Dataset, path: &Path) -> String {
    dataset
        .files()
        .first()
        .map(PathBuf::as_path)
        .unwrap_or(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Run `check`: resolve the key, group rows and render the report.
///
/// # Errors
///
/// Fails if no input is readable, the schemas disagree, no key field is
/// valid, or the report cannot be written.
pub fn run_check(
    args: &CheckArgs,
    config: &Config,
    options: RunOptions,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let dataset = load_dataset(&args.input, config)?;
    let schema = dataset.schema();

    let mut request = SelectionRequest::new()
        .with_fields(args.fields.iter().cloned())
        .with_indices(args.indices.iter().copied());
    if let Some(hints_path) = args.hints.as_ref().or(config.hints_file.as_ref()) {
        let hints = PrimaryKeyHints::load_or_empty(hints_path);
        request = request.with_hints(hints, hint_input_name(&dataset, &args.input.path));
    }

    let resolution = FieldResolver::new(schema).resolve(&request)?;
    let keys = resolution.keys;

    let hide_progress = options.quiet || args.output != OutputFormat::Text;
    let finder_config = FinderConfig::default()
        .with_threads(args.threads.unwrap_or(config.threads))
        .with_order(args.order.unwrap_or(config.group_order))
        .with_progress_callback(Arc::new(Progress::new(hide_progress)));
    let finder = DuplicateFinder::new(finder_config);
    let (groups, stats) = finder.find_duplicates(dataset.rows(), &keys);

    let report = Report::new(schema, &keys, groups, stats, args.limit)
        .with_width(config.display_width)
        .with_detailed(args.detailed);

    match args.output {
        OutputFormat::Text => TextReport::new(&report)
            .with_color(options.color)
            .write_to(out)
            .context("Failed to write report")?,
        OutputFormat::Json => JsonReport::new(&report)
            .write_to(out, true)
            .context("Failed to write report")?,
    }

    let code = ExitCode::for_check(report.has_duplicates(), dataset.is_partial());
    Ok(code)
}

/// Run `show`: list rows without grouping.
///
/// # Errors
///
/// Fails if no input is readable, the schemas disagree, or the listing
/// cannot be written.
pub fn run_show(
    args: &ShowArgs,
    config: &Config,
    options: RunOptions,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let dataset = load_dataset(&args.input, config)?;
    RowListing::new(&dataset)
        .with_limit(args.rows)
        .with_width(config.display_width)
        .with_color(options.color)
        .write_to(out)
        .context("Failed to write listing")?;

    Ok(if dataset.is_partial() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    })
}

//! Command-line interface definitions for rowdupe.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, color, config) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Check a CSV file, comparing every column
//! rowdupe check orders.csv
//!
//! # Compare on two named columns and list every member row
//! rowdupe check orders.csv --fields id,email --detailed
//!
//! # Compare on the first column of a directory of parquet files, as JSON
//! rowdupe check ./export --indices 0 --output json
//!
//! # Show the first 20 rows without checking
//! rowdupe show orders.csv --rows 20
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::duplicates::GroupOrder;
use crate::output::OutputFormat;

/// Duplicate row finder for CSV and Parquet data.
///
/// rowdupe groups rows whose key columns hold identical values, using a
/// BLAKE3 digest of the canonicalized key.
#[derive(Debug, Parser)]
#[command(name = "rowdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find rows that share the same key values
    Check(CheckArgs),
    /// Print rows without checking for duplicates
    Show(ShowArgs),
}

/// Options shared by every command that opens an input.
#[derive(Debug, Args, Default)]
pub struct InputArgs {
    /// A .csv, .tsv or .parquet file, or a directory of them
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Field delimiter for .csv inputs (single character, or "tab")
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<String>,

    /// Align differing schemas across files by column name
    #[arg(long)]
    pub allow_schema_mismatch: bool,
}

/// Arguments for the check subcommand.
#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Key columns by name (comma separated, case-insensitive)
    #[arg(short, long, value_name = "NAMES", value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Key columns by zero-based position (comma separated)
    #[arg(short, long, value_name = "INDICES", value_delimiter = ',')]
    pub indices: Vec<usize>,

    /// Primary-key hint file (JSON, or TOML by extension)
    #[arg(long, value_name = "FILE")]
    pub hints: Option<PathBuf>,

    /// List every member row of every group
    #[arg(short, long)]
    pub detailed: bool,

    /// Show at most N groups (0 or less shows all)
    #[arg(short, long, value_name = "N", default_value_t = 0)]
    #[arg(allow_negative_numbers = true)]
    pub limit: i64,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Order of reported groups
    #[arg(long, value_enum)]
    pub order: Option<GroupOrder>,

    /// Worker threads for grouping (0 = one per core, 1 = sequential)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,
}

/// Arguments for the show subcommand.
#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Show at most N rows (0 or less shows all)
    #[arg(short = 'n', long, value_name = "N", default_value_t = 0)]
    #[arg(allow_negative_numbers = true)]
    pub rows: i64,
}

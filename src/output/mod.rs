//! Report rendering for duplicate check results.
//!
//! This module provides:
//! - Aggregate counts ([`summarize`]) and group limiting ([`limit`])
//! - Fixed-width value truncation ([`truncate`])
//! - A human-readable text report ([`text`])
//! - A machine-readable JSON report ([`json`])
//!
//! # Example
//!
//! ```
//! use rowdupe::duplicates::DuplicateFinder;
//! use rowdupe::fields::KeyFieldList;
//! use rowdupe::output::{Report, text::TextReport};
//! use rowdupe::source::{Dataset, Schema, Value};
//!
//! let schema = Schema::from_names(["id"]).unwrap();
//! let dataset = Dataset::from_values(
//!     schema.clone(),
//!     vec![vec![Value::scalar("1")], vec![Value::scalar("1")]],
//! );
//! let keys = KeyFieldList::from_names(&schema, &["id"]).unwrap();
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, stats) = finder.find_duplicates(dataset.rows(), &keys);
//!
//! let report = Report::new(&schema, &keys, groups, stats, 0);
//! let mut out = Vec::new();
//! TextReport::new(&report).write_to(&mut out).unwrap();
//! assert!(String::from_utf8(out).unwrap().contains("Found 1 duplicate group(s)"));
//! ```

pub mod json;
pub mod text;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, GroupingStats};
use crate::fields::KeyFieldList;
use crate::source::Schema;

pub use json::JsonReport;
pub use text::{RowListing, TextReport};

/// Maximum characters shown for any displayed value.
pub const DEFAULT_DISPLAY_WIDTH: usize = 36;

/// Report output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned plain text
    #[default]
    Text,
    /// JSON document
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Errors that can occur while writing a report.
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error while writing report: {0}")]
    Io(#[from] std::io::Error),
}

/// Aggregate counts over a set of duplicate groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub group_count: usize,
    /// Rows beyond the first in every group
    pub total_duplicate_records: usize,
}

/// Count groups and redundant rows.
#[must_use]
pub fn summarize(groups: &[DuplicateGroup<'_>]) -> Summary {
    Summary {
        group_count: groups.len(),
        total_duplicate_records: groups.iter().map(DuplicateGroup::duplicate_count).sum(),
    }
}

/// Keep the first `n` groups when `n > 0`, returning how many were elided.
///
/// ```
/// use rowdupe::output::limit;
///
/// let mut groups = vec![1, 2, 3, 4];
/// assert_eq!(limit(&mut groups, 3), 1);
/// assert_eq!(groups, vec![1, 2, 3]);
/// assert_eq!(limit(&mut groups, 0), 0);
/// ```
pub fn limit<T>(groups: &mut Vec<T>, n: i64) -> usize {
    match usize::try_from(n) {
        Ok(n) if n > 0 && groups.len() > n => {
            let elided = groups.len() - n;
            groups.truncate(n);
            elided
        }
        _ => 0,
    }
}

/// Hard cut of `value` to its first `width` characters. No marker is added.
///
/// ```
/// use rowdupe::output::truncate;
///
/// assert_eq!(truncate("abcdef", 3), "abc");
/// assert_eq!(truncate("héllo", 2), "hé");
/// assert_eq!(truncate("ab", 3), "ab");
/// ```
#[must_use]
pub fn truncate(value: &str, width: usize) -> &str {
    match value.char_indices().nth(width) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

/// Everything a renderer needs about one duplicate check.
///
/// The summary is taken over all groups before limiting.
#[derive(Debug)]
pub struct Report<'a> {
    pub schema: &'a Schema,
    pub keys: &'a KeyFieldList,
    pub groups: Vec<DuplicateGroup<'a>>,
    pub summary: Summary,
    pub stats: GroupingStats,
    /// Groups cut by the limit
    pub elided: usize,
    pub width: usize,
    /// Render every member row instead of one line per group
    pub detailed: bool,
}

impl<'a> Report<'a> {
    /// Build a report, applying `limit` (≤ 0 means unlimited).
    #[must_use]
    pub fn new(
        schema: &'a Schema,
        keys: &'a KeyFieldList,
        mut groups: Vec<DuplicateGroup<'a>>,
        stats: GroupingStats,
        limit_to: i64,
    ) -> Self {
        let summary = summarize(&groups);
        let elided = limit(&mut groups, limit_to);
        if elided > 0 {
            log::debug!("Limit {} elided {} group(s)", limit_to, elided);
        }
        Self {
            schema,
            keys,
            groups,
            summary,
            stats,
            elided,
            width: DEFAULT_DISPLAY_WIDTH,
            detailed: false,
        }
    }

    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    #[must_use]
    pub fn with_detailed(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }

    /// Whether any duplicate was found, including elided groups.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.summary.group_count > 0
    }
}

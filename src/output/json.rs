//! JSON rendering of a duplicate check.
//!
//! Values are written untruncated; nulls are JSON `null`.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "columns": ["id", "name"],
//!   "key_fields": ["id"],
//!   "summary": {
//!     "group_count": 1,
//!     "duplicate_records": 1,
//!     "total_rows": 3,
//!     "distinct_keys": 2,
//!     "elided_groups": 0
//!   },
//!   "groups": [
//!     {
//!       "digest": "9f86d08...",
//!       "count": 2,
//!       "members": [
//!         { "row": 0, "values": ["1", "a"] },
//!         { "row": 1, "values": ["1", null] }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use super::{OutputError, Report};
use crate::duplicates::DuplicateGroup;

/// One member row.
#[derive(Debug, Clone, Serialize)]
pub struct JsonMember {
    /// Original row index
    pub row: usize,
    /// Every schema column, in schema order
    pub values: Vec<Option<String>>,
}

/// One duplicate group.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// BLAKE3 digest as hexadecimal (64 characters)
    pub digest: String,
    pub count: usize,
    pub members: Vec<JsonMember>,
}

impl JsonGroup {
    #[must_use]
    pub fn from_group(group: &DuplicateGroup<'_>) -> Self {
        Self {
            digest: group.digest_hex(),
            count: group.count(),
            members: group
                .members()
                .iter()
                .map(|row| JsonMember {
                    row: row.index(),
                    values: row
                        .values()
                        .iter()
                        .map(|v| v.as_display().map(str::to_string))
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Aggregate counts.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Duplicate groups found, including elided ones
    pub group_count: usize,
    /// Rows beyond the first in every group
    pub duplicate_records: usize,
    pub total_rows: usize,
    /// Distinct key digests, singletons included
    pub distinct_keys: usize,
    /// Groups cut by the limit
    pub elided_groups: usize,
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    pub columns: Vec<String>,
    pub key_fields: Vec<String>,
    pub summary: JsonSummary,
    pub groups: Vec<JsonGroup>,
}

impl JsonReport {
    #[must_use]
    pub fn new(report: &Report<'_>) -> Self {
        Self {
            columns: report.schema.names().map(str::to_string).collect(),
            key_fields: report.keys.names().to_vec(),
            summary: JsonSummary {
                group_count: report.summary.group_count,
                duplicate_records: report.summary.total_duplicate_records,
                total_rows: report.stats.total_rows,
                distinct_keys: report.stats.distinct_keys,
                elided_groups: report.elided,
            },
            groups: report.groups.iter().map(JsonGroup::from_group).collect(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write + ?Sized>(
        &self,
        writer: &mut W,
        pretty: bool,
    ) -> Result<(), OutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

//! Primary-key hint files.
//!
//! A hint file maps input file names (or wildcard patterns) to column
//! declarations. Only columns flagged as primary key participate in the key.
//!
//! ```json
//! {
//!   "orders.csv": [
//!     { "name": "order_id", "primary_key": true },
//!     { "name": "created_at", "primary_key": false }
//!   ],
//!   "*.parquet": [{ "name": "id", "primary_key": true }],
//!   "*": [{ "name": "id", "primary_key": true }]
//! }
//! ```
//!
//! Lookup order: exact name, case-insensitive name, `*.<ext>`, then `*`.
//! Files ending in `.toml` are parsed as TOML, anything else as JSON.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Catch-all pattern matching any input.
pub const WILDCARD: &str = "*";

/// Errors loading a hint file.
#[derive(thiserror::Error, Debug)]
pub enum HintError {
    #[error("Cannot read hint file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed hint file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed hint file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// One declared column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnHint {
    #[serde(alias = "column_name", alias = "columnName")]
    pub name: String,
    #[serde(default, alias = "is_primary_key", alias = "isPrimaryKey")]
    pub primary_key: bool,
}

impl ColumnHint {
    #[must_use]
    pub fn new(name: impl Into<String>, primary_key: bool) -> Self {
        Self {
            name: name.into(),
            primary_key,
        }
    }
}

/// The matched entry for an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintMatch<'a> {
    /// Pattern that matched
    pub pattern: &'a str,
    /// Columns flagged as primary key, in declaration order
    pub key_columns: Vec<&'a str>,
}

/// Loaded hint map. Empty when no file was given or it failed to load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrimaryKeyHints {
    entries: BTreeMap<String, Vec<ColumnHint>>,
}

impl PrimaryKeyHints {
    #[must_use]
    pub fn new(entries: BTreeMap<String, Vec<ColumnHint>>) -> Self {
        Self { entries }
    }

    /// Load a hint file.
    ///
    /// # Errors
    ///
    /// Returns [`HintError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, HintError> {
        let content = std::fs::read_to_string(path).map_err(|source| HintError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        let hints: Self = if is_toml {
            toml::from_str(&content).map_err(|source| HintError::Toml {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            serde_json::from_str(&content).map_err(|source| HintError::Json {
                path: path.to_path_buf(),
                source,
            })?
        };
        log::debug!(
            "Loaded {} hint entr(y/ies) from {}",
            hints.entries.len(),
            path.display()
        );
        Ok(hints)
    }

    /// Load a hint file, degrading to empty hints with a warning on failure.
    #[must_use]
    pub fn load_or_empty(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("{}; primary-key hints ignored", e);
            Self::default()
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Find the entry for an input file name.
    #[must_use]
    pub fn lookup(&self, input_name: &str) -> Option<HintMatch<'_>> {
        let (pattern, columns) = self
            .entries
            .get_key_value(input_name)
            .or_else(|| {
                let lower = input_name.to_lowercase();
                self.entries.iter().find(|(k, _)| k.to_lowercase() == lower)
            })
            .or_else(|| {
                let ext = Path::new(input_name).extension()?.to_str()?.to_lowercase();
                let pattern = format!("*.{ext}");
                self.entries
                    .iter()
                    .find(|(k, _)| k.to_lowercase() == pattern)
            })
            .or_else(|| self.entries.get_key_value(WILDCARD))?;

        Some(HintMatch {
            pattern: pattern.as_str(),
            key_columns: columns
                .iter()
                .filter(|c| c.primary_key)
                .map(|c| c.name.as_str())
                .collect(),
        })
    }
}

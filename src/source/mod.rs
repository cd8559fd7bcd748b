//! Tabular input sources.
//!
//! This module turns a path into a uniform, fully materialized [`Dataset`]:
//! an ordered [`Schema`] plus a sequence of [`Row`]s whose values are aligned
//! to that schema. Two formats are supported:
//!
//! - [`delimited`]: CSV/TSV files via the `csv` crate
//! - [`columnar`]: Parquet files via the `parquet` crate
//!
//! A path may name a single file or a directory of files of one format.
//! Multiple files are merged into one row sequence; see [`open_input`].
//!
//! # Example
//!
//! ```no_run
//! use rowdupe::source::{open_input, SourceOptions};
//! use std::path::Path;
//!
//! let dataset = open_input(Path::new("orders.csv"), &SourceOptions::default()).unwrap();
//! println!("{} rows, {} columns", dataset.rows().len(), dataset.schema().len());
//! ```

pub mod columnar;
pub mod delimited;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

pub use columnar::ColumnarReader;
pub use delimited::DelimitedReader;

/// Literal used wherever a null or absent value is displayed or digested.
pub const NULL_LITERAL: &str = "NULL";

static NULL_VALUE: Value = Value::Null;

/// Type tag attached to every schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Boolean,
    Integer,
    Float,
    Decimal,
    Utf8,
    Binary,
    Temporal,
    List,
    Map,
    Struct,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Utf8 => "utf8",
            Self::Binary => "binary",
            Self::Temporal => "temporal",
            Self::List => "list",
            Self::Map => "map",
            Self::Struct => "struct",
        };
        f.write_str(name)
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
}

impl Field {
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Ordered list of fields for a tabular input.
///
/// Names are unique. Order is the source's natural column order and is
/// significant for display and for positional selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Build a schema, rejecting duplicate names.
    ///
    /// # Errors
    ///
    /// Returns the first repeated name.
    pub fn new(fields: Vec<Field>) -> Result<Self, String> {
        for (idx, field) in fields.iter().enumerate() {
            if fields[..idx].iter().any(|f| f.name == field.name) {
                return Err(field.name.clone());
            }
        }
        Ok(Self { fields })
    }

    /// Convenience constructor for all-`utf8` schemas.
    ///
    /// # Errors
    ///
    /// Returns the first repeated name.
    pub fn from_names<I, S>(names: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .map(|n| Field::new(n, FieldType::Utf8))
                .collect(),
        )
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in schema order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Exact-name lookup.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Case-insensitive lookup. An exact match wins over a case-folded one.
    #[must_use]
    pub fn position_ignore_case(&self, name: &str) -> Option<usize> {
        self.position(name).or_else(|| {
            self.fields
                .iter()
                .position(|f| f.name.to_lowercase() == name.to_lowercase())
        })
    }
}

/// Kind of a composite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeKind {
    List,
    Map,
    Struct,
    Bytes,
}

/// A single cell.
///
/// Every non-null value carries its canonical display projection, which is
/// what gets digested and rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Scalar(String),
    Composite {
        kind: CompositeKind,
        display: String,
    },
}

impl Value {
    #[must_use]
    pub fn scalar(s: impl Into<String>) -> Self {
        Self::Scalar(s.into())
    }

    #[must_use]
    pub fn composite(kind: CompositeKind, display: impl Into<String>) -> Self {
        Self::Composite {
            kind,
            display: display.into(),
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Display projection, `None` for null.
    #[must_use]
    pub fn as_display(&self) -> Option<&str> {
        match self {
            Self::Null => None,
            Self::Scalar(s) => Some(s),
            Self::Composite { display, .. } => Some(display),
        }
    }

    /// Display projection with nulls rendered as [`NULL_LITERAL`].
    #[must_use]
    pub fn display_or_null(&self) -> &str {
        self.as_display().unwrap_or(NULL_LITERAL)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_or_null())
    }
}

/// One immutable record.
///
/// `values` is aligned to the owning dataset's schema; `index` is the
/// record's position in the originating sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    index: usize,
    values: Vec<Value>,
}

impl Row {
    #[must_use]
    pub fn new(index: usize, values: Vec<Value>) -> Self {
        Self { index, values }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value at a schema position. Positions past the end read as null.
    #[must_use]
    pub fn value(&self, position: usize) -> &Value {
        self.values.get(position).unwrap_or(&NULL_VALUE)
    }

    /// Name lookup against the owning schema.
    #[must_use]
    pub fn get<'a>(&'a self, schema: &Schema, name: &str) -> Option<&'a Value> {
        schema.position(name).map(|pos| self.value(pos))
    }
}

/// Schema and rows decoded from one file.
#[derive(Debug, Clone)]
pub struct Table {
    pub schema: Schema,
    pub rows: Vec<Vec<Value>>,
    /// Records skipped by the reader (malformed rows)
    pub skipped_rows: usize,
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Delimited,
    Columnar,
}

impl InputFormat {
    /// Detect a format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "parquet" | "parq" | "pq" => Some(Self::Columnar),
            "csv" | "tsv" | "tab" => Some(Self::Delimited),
            _ => None,
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delimited => write!(f, "delimited"),
            Self::Columnar => write!(f, "columnar"),
        }
    }
}

/// Format-specific decoder for one file.
pub trait TableReader: Send + Sync {
    /// The format this reader handles.
    fn format(&self) -> InputFormat;

    /// Decode one file into a [`Table`].
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file cannot be opened or decoded.
    fn read_table(&self, path: &Path) -> Result<Table, SourceError>;
}

/// Errors raised while opening inputs.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// The path does not exist.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The path is not a supported file or a directory holding one.
    #[error("Unsupported input: {0} (expected .csv, .tsv or .parquet, or a directory of them)")]
    UnsupportedInput(PathBuf),

    /// Every candidate input failed.
    #[error("No readable input under {path}{}", format_failures(.failures))]
    NoReadableInputs {
        /// Input path given by the caller
        path: PathBuf,
        /// Per-file failures
        failures: Vec<InputFailure>,
    },

    /// Two inputs disagree on their schema.
    #[error("Schema of {path} does not match {reference}")]
    SchemaMismatch {
        /// File whose schema fixed the dataset
        reference: PathBuf,
        /// File that disagreed
        path: PathBuf,
    },

    /// The input has a header row with a repeated or unusable name.
    #[error("Invalid schema in {path}: {reason}")]
    InvalidSchema {
        /// File being read
        path: PathBuf,
        /// What was wrong
        reason: String,
    },

    /// An I/O error occurred while reading a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The delimited-text decoder failed.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// File being read
        path: PathBuf,
        /// The underlying CSV error
        #[source]
        source: csv::Error,
    },

    /// The columnar decoder failed.
    #[error("Parquet error in {path}: {source}")]
    Parquet {
        /// File being read
        path: PathBuf,
        /// The underlying Parquet error
        #[source]
        source: parquet::errors::ParquetError,
    },
}

fn format_failures(failures: &[InputFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("\n  {}: {}", f.path.display(), f.message))
        .collect()
}

/// A file that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Options for opening inputs.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Delimiter byte for `.csv` files (`.tsv` always uses tab)
    pub delimiter: u8,
    /// Merge files whose schemas differ by column name instead of failing
    pub allow_schema_mismatch: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            allow_schema_mismatch: false,
        }
    }
}

/// Fully materialized rows from one or more files.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Schema,
    rows: Vec<Row>,
    files: Vec<PathBuf>,
    failures: Vec<InputFailure>,
    skipped_rows: usize,
}

impl Dataset {
    /// Build a dataset directly from values. Rows are indexed in order.
    #[must_use]
    pub fn from_values(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(idx, values)| Row::new(idx, values))
            .collect();
        Self {
            schema,
            rows,
            files: Vec::new(),
            failures: Vec::new(),
            skipped_rows: 0,
        }
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Files that contributed rows.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Inputs that could not be read while others succeeded.
    #[must_use]
    pub fn failures(&self) -> &[InputFailure] {
        &self.failures
    }

    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Malformed records skipped across all files.
    #[must_use]
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

/// Open a file or directory and materialize every row.
///
/// # Errors
///
/// - [`SourceError::NotFound`] / [`SourceError::UnsupportedInput`] for bad paths
/// - [`SourceError::NoReadableInputs`] when every candidate file failed
/// - [`SourceError::SchemaMismatch`] when files disagree and mismatches are not allowed
pub fn open_input(path: &Path, options: &SourceOptions) -> Result<Dataset, SourceError> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }

    let (format, files) = discover_inputs(path)?;
    log::debug!(
        "Reading {} {} file(s) from {}",
        files.len(),
        format,
        path.display()
    );

    let reader: Box<dyn TableReader> = match format {
        InputFormat::Columnar => Box::new(ColumnarReader::new()),
        InputFormat::Delimited => Box::new(DelimitedReader::new(options.delimiter)),
    };

    let mut merger = Merger::new(options.allow_schema_mismatch);
    let mut failures = Vec::new();
    let mut bytes_read = 0u64;

    for file in &files {
        match reader.read_table(file) {
            Ok(table) => {
                bytes_read += std::fs::metadata(file).map(|m| m.len()).unwrap_or(0);
                merger.push(file, table)?;
            }
            Err(e) => {
                log::warn!("Failed to read {}: {}", file.display(), e);
                failures.push(InputFailure {
                    path: file.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    let Some(mut dataset) = merger.finish() else {
        return Err(SourceError::NoReadableInputs {
            path: path.to_path_buf(),
            failures,
        });
    };

    if !failures.is_empty() {
        log::warn!(
            "{} of {} input file(s) could not be read; continuing with partial data",
            failures.len(),
            files.len()
        );
    }
    if dataset.skipped_rows > 0 {
        log::warn!("Skipped {} malformed row(s)", dataset.skipped_rows);
    }
    log::info!(
        "Loaded {} row(s) x {} column(s) from {} file(s) ({})",
        dataset.rows.len(),
        dataset.schema.len(),
        dataset.files.len(),
        bytesize::ByteSize::b(bytes_read)
    );

    dataset.failures = failures;
    Ok(dataset)
}

/// Resolve a path into a format and an ordered list of files.
fn discover_inputs(path: &Path) -> Result<(InputFormat, Vec<PathBuf>), SourceError> {
    if path.is_file() {
        return InputFormat::from_path(path)
            .map(|format| (format, vec![path.to_path_buf()]))
            .ok_or_else(|| SourceError::UnsupportedInput(path.to_path_buf()));
    }

    let mut columnar = Vec::new();
    let mut delimited = Vec::new();
    let mut failures = Vec::new();

    for entry in WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let failed = e.path().unwrap_or(path).to_path_buf();
                log::warn!("Cannot list {}: {}", failed.display(), e);
                failures.push(InputFailure {
                    path: failed,
                    message: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() || is_hidden(entry.file_name()) {
            continue;
        }
        match InputFormat::from_path(entry.path()) {
            Some(InputFormat::Columnar) => columnar.push(entry.into_path()),
            Some(InputFormat::Delimited) => delimited.push(entry.into_path()),
            None => log::trace!("Ignoring {}", entry.path().display()),
        }
    }

    if !columnar.is_empty() {
        if !delimited.is_empty() {
            log::warn!(
                "Ignoring {} delimited file(s) in a directory of columnar files",
                delimited.len()
            );
        }
        Ok((InputFormat::Columnar, columnar))
    } else if !delimited.is_empty() {
        Ok((InputFormat::Delimited, delimited))
    } else if failures.is_empty() {
        Err(SourceError::UnsupportedInput(path.to_path_buf()))
    } else {
        Err(SourceError::NoReadableInputs {
            path: path.to_path_buf(),
            failures,
        })
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str()
        .is_some_and(|n| n.starts_with('.') || n.starts_with('_'))
}

/// Accumulates per-file tables into one dataset.
struct Merger {
    allow_mismatch: bool,
    reference: Option<PathBuf>,
    dataset: Option<Dataset>,
}

impl Merger {
    fn new(allow_mismatch: bool) -> Self {
        Self {
            allow_mismatch,
            reference: None,
            dataset: None,
        }
    }

    fn push(&mut self, path: &Path, table: Table) -> Result<(), SourceError> {
        let Some(dataset) = self.dataset.as_mut() else {
            let mut dataset = Dataset::from_values(table.schema, table.rows);
            dataset.files.push(path.to_path_buf());
            dataset.skipped_rows = table.skipped_rows;
            self.reference = Some(path.to_path_buf());
            self.dataset = Some(dataset);
            return Ok(());
        };

        let offset = dataset.rows.len();
        if table.schema == dataset.schema {
            dataset.rows.extend(
                table
                    .rows
                    .into_iter()
                    .enumerate()
                    .map(|(idx, values)| Row::new(offset + idx, values)),
            );
        } else if self.allow_mismatch {
            log::warn!(
                "Schema of {} differs from the first input; aligning columns by name",
                path.display()
            );
            let mapping: Vec<Option<usize>> = dataset
                .schema
                .fields()
                .iter()
                .map(|f| table.schema.position(&f.name))
                .collect();
            let dropped: Vec<&str> = table
                .schema
                .names()
                .filter(|n| dataset.schema.position(n).is_none())
                .collect();
            if !dropped.is_empty() {
                log::warn!(
                    "Dropping column(s) not in the first input: {}",
                    dropped.join(", ")
                );
            }
            dataset
                .rows
                .extend(table.rows.into_iter().enumerate().map(|(idx, mut values)| {
                    let aligned = mapping
                        .iter()
                        .map(|pos| match pos {
                            Some(p) if *p < values.len() => {
                                std::mem::replace(&mut values[*p], Value::Null)
                            }
                            _ => Value::Null,
                        })
                        .collect();
                    Row::new(offset + idx, aligned)
                }));
        } else {
            return Err(SourceError::SchemaMismatch {
                reference: self.reference.clone().unwrap_or_default(),
                path: path.to_path_buf(),
            });
        }

        dataset.files.push(path.to_path_buf());
        dataset.skipped_rows += table.skipped_rows;
        Ok(())
    }

    fn finish(self) -> Option<Dataset> {
        self.dataset
    }
}

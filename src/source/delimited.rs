//! Delimited-text (CSV/TSV) reader.
//!
//! The first record is the header. Records with the wrong number of fields
//! or invalid UTF-8 are skipped with a warning; I/O failures fail the file.

use std::path::Path;

use super::{FieldType, InputFormat, Schema, SourceError, Table, TableReader, Value};

/// Reader for `.csv` / `.tsv` files.
#[derive(Debug, Clone)]
pub struct DelimitedReader {
    delimiter: u8,
}

impl Default for DelimitedReader {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl DelimitedReader {
    /// Create a reader using `delimiter` for `.csv` files.
    #[must_use]
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Delimiter for a given file; tab-separated extensions always use tab.
    fn delimiter_for(&self, path: &Path) -> u8 {
        let is_tab = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("tsv") || e.eq_ignore_ascii_case("tab"));
        if is_tab {
            b'\t'
        } else {
            self.delimiter
        }
    }

    /// Decode delimited text from any reader. `path` is used for messages only.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the header cannot be read or an I/O error occurs.
    pub fn read_from<R: std::io::Read>(
        &self,
        reader: R,
        delimiter: u8,
        path: &Path,
    ) -> Result<Table, SourceError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|source| SourceError::Csv {
                path: path.to_path_buf(),
                source,
            })?
            .clone();
        let names = unique_header_names(headers.iter(), path);
        let schema = Schema::new(
            names
                .into_iter()
                .map(|n| super::Field::new(n, FieldType::Utf8))
                .collect(),
        )
        .map_err(|name| SourceError::InvalidSchema {
            path: path.to_path_buf(),
            reason: format!("repeated column name '{name}'"),
        })?;

        let mut rows = Vec::new();
        let mut skipped_rows = 0usize;

        for result in csv_reader.records() {
            match result {
                Ok(record) => {
                    rows.push(record.iter().map(Value::scalar).collect());
                }
                Err(e) if e.is_io_error() => {
                    return Err(SourceError::Csv {
                        path: path.to_path_buf(),
                        source: e,
                    });
                }
                Err(e) => {
                    let line = e
                        .position()
                        .map_or_else(|| "?".to_string(), |p| p.line().to_string());
                    log::warn!(
                        "Skipping malformed row at {}:{}: {}",
                        path.display(),
                        line,
                        e
                    );
                    skipped_rows += 1;
                }
            }
        }

        log::debug!(
            "Read {} row(s) from {} ({} skipped)",
            rows.len(),
            path.display(),
            skipped_rows
        );

        Ok(Table {
            schema,
            rows,
            skipped_rows,
        })
    }
}

impl TableReader for DelimitedReader {
    fn format(&self) -> InputFormat {
        InputFormat::Delimited
    }

    fn read_table(&self, path: &Path) -> Result<Table, SourceError> {
        let file = std::fs::File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let delimiter = self.delimiter_for(path);
        self.read_from(std::io::BufReader::new(file), delimiter, path)
    }
}

/// Make header names unique by suffixing repeats with `_2`, `_3`, ...
fn unique_header_names<'a>(headers: impl Iterator<Item = &'a str>, path: &Path) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for header in headers {
        let mut name = header.to_string();
        let mut n = 2;
        while names.contains(&name) {
            name = format!("{header}_{n}");
            n += 1;
        }
        if name != header {
            log::warn!(
                "Duplicate column '{}' in {} renamed to '{}'",
                header,
                path.display(),
                name
            );
        }
        names.push(name);
    }
    names
}

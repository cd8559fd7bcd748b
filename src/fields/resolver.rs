//! Key field resolution.
//!
//! Three independent ways of naming the key compete, most specific first:
//!
//! 1. explicit field names (validated case-insensitively against the schema)
//! 2. explicit column indices (bounds-checked, kept in the order given)
//! 3. primary-key hints looked up by input file name
//! 4. nothing supplied: every schema field, in schema order
//!
//! Less specific mechanisms that were also supplied are reported as ignored.
//! Invalid names and out-of-range indices are dropped with a notice; an empty
//! result is an error.

use std::fmt;

use super::hints::PrimaryKeyHints;
use crate::source::Schema;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// A way of selecting key fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMechanism {
    ExplicitFields,
    ExplicitIndices,
    ConfigHints,
}

impl fmt::Display for SelectionMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExplicitFields => write!(f, "explicit fields"),
            Self::ExplicitIndices => write!(f, "column indices"),
            Self::ConfigHints => write!(f, "primary-key hints"),
        }
    }
}

/// User intent for the duplicate key.
#[derive(Debug, Clone, Default)]
pub struct SelectionRequest {
    /// Field names, in the order given. Blank names are not a selection.
    pub fields: Vec<String>,
    /// Zero-based column positions, in the order given
    pub indices: Vec<usize>,
    /// Loaded hint map (empty when none)
    pub hints: PrimaryKeyHints,
    /// File or directory name used for hint lookup
    pub input_name: Option<String>,
}

impl SelectionRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| !name.trim().is_empty())
            .collect();
        self
    }

    #[must_use]
    pub fn with_indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.indices = indices.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_hints(mut self, hints: PrimaryKeyHints, input_name: impl Into<String>) -> Self {
        self.hints = hints;
        self.input_name = Some(input_name.into());
        self
    }

    fn has_fields(&self) -> bool {
        self.fields.iter().any(|name| !name.trim().is_empty())
    }

    /// Mechanisms with non-empty input, in precedence order.
    fn supplied(&self) -> Vec<SelectionMechanism> {
        let mut supplied = Vec::new();
        if self.has_fields() {
            supplied.push(SelectionMechanism::ExplicitFields);
        }
        if !self.indices.is_empty() {
            supplied.push(SelectionMechanism::ExplicitIndices);
        }
        if !self.hints.is_empty() {
            supplied.push(SelectionMechanism::ConfigHints);
        }
        supplied
    }
}

/// Validated, ordered, de-duplicated key fields. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFieldList {
    names: Vec<String>,
    positions: Vec<usize>,
}

impl KeyFieldList {
    /// Build from positions already validated against `schema`.
    fn from_positions(schema: &Schema, positions: Vec<usize>) -> Option<Self> {
        if positions.is_empty() {
            return None;
        }
        let names = positions
            .iter()
            .map(|&p| schema.fields()[p].name.clone())
            .collect();
        Some(Self { names, positions })
    }

    /// Strict construction: every name must exist in `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NoValidFields`] if `names` is empty or any
    /// name is missing from the schema.
    pub fn from_names<S: AsRef<str>>(schema: &Schema, names: &[S]) -> Result<Self, ResolveError> {
        let requested = || -> Vec<String> {
            names.iter().map(|n| n.as_ref().to_string()).collect()
        };
        let mut positions = Vec::with_capacity(names.len());
        for name in names {
            match schema.position_ignore_case(name.as_ref()) {
                Some(pos) if !positions.contains(&pos) => positions.push(pos),
                Some(_) => {}
                None => {
                    return Err(ResolveError::NoValidFields {
                        requested: requested(),
                    })
                }
            }
        }
        Self::from_positions(schema, positions).ok_or_else(|| ResolveError::NoValidFields {
            requested: requested(),
        })
    }

    /// Canonical (schema) spellings, in key order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Schema positions, in key order.
    #[must_use]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Display for KeyFieldList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names.join(", "))
    }
}

/// Something the resolver wants the user to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionNotice {
    /// Less specific mechanisms were supplied alongside the one used.
    IgnoredMechanisms {
        used: SelectionMechanism,
        ignored: Vec<SelectionMechanism>,
    },
    /// Requested names not in the schema, with close matches.
    InvalidFields {
        names: Vec<String>,
        suggestions: Vec<(String, String)>,
    },
    /// Indices past the last column.
    OutOfRangeIndices {
        indices: Vec<usize>,
        column_count: usize,
    },
    /// Fields selected more than once; later repeats dropped.
    RepeatedSelection { names: Vec<String> },
    /// Hints were loaded but nothing matches the input.
    NoHintEntry { input: String },
    /// The matching hint entry flags no primary-key column.
    HintWithoutKeyColumns { pattern: String },
    /// Hinted key columns that are not in the schema.
    HintColumnsMissing { pattern: String, names: Vec<String> },
    /// Nothing was selected, so every field is used.
    UsingAllFields { count: usize },
}

impl ResolutionNotice {
    /// Whether this notice is a warning rather than information.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        !matches!(self, Self::UsingAllFields { .. })
    }
}

impl fmt::Display for ResolutionNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IgnoredMechanisms { used, ignored } => {
                let ignored: Vec<String> = ignored.iter().map(ToString::to_string).collect();
                write!(f, "Using {used}; ignoring {}", ignored.join(" and "))
            }
            Self::InvalidFields { names, suggestions } => {
                write!(f, "Ignoring unknown field(s): {}", names.join(", "))?;
                for (name, suggestion) in suggestions {
                    write!(f, " ('{name}': did you mean '{suggestion}'?)")?;
                }
                Ok(())
            }
            Self::OutOfRangeIndices {
                indices,
                column_count,
            } => {
                let indices: Vec<String> = indices.iter().map(ToString::to_string).collect();
                write!(
                    f,
                    "Ignoring out-of-range column index(es) {} (schema has {column_count} column(s))",
                    indices.join(", ")
                )
            }
            Self::RepeatedSelection { names } => {
                write!(f, "Field(s) selected more than once: {}", names.join(", "))
            }
            Self::NoHintEntry { input } => write!(f, "No config entry found for '{input}'"),
            Self::HintWithoutKeyColumns { pattern } => {
                write!(f, "Config entry '{pattern}' declares no primary-key column")
            }
            Self::HintColumnsMissing { pattern, names } => write!(
                f,
                "Config entry '{pattern}' names column(s) not in the input: {}",
                names.join(", ")
            ),
            Self::UsingAllFields { count } => {
                write!(f, "No key fields selected; using all {count} field(s)")
            }
        }
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub keys: KeyFieldList,
    /// Mechanism that produced the keys; `None` when all fields were used
    pub mechanism: Option<SelectionMechanism>,
    pub notices: Vec<ResolutionNotice>,
}

/// Errors from field resolution.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Nothing usable survived validation.
    #[error("No valid fields to compare (requested: {})", describe_requested(.requested))]
    NoValidFields {
        /// What was asked for, as given
        requested: Vec<String>,
    },
}

fn describe_requested(requested: &[String]) -> String {
    if requested.is_empty() {
        "<all>".to_string()
    } else {
        requested.join(", ")
    }
}

#[derive(Debug, Default)]
struct NameMatch {
    positions: Vec<usize>,
    missing: Vec<String>,
    repeated: Vec<String>,
}

/// Resolves a [`SelectionRequest`] against one schema.
pub struct FieldResolver<'a> {
    schema: &'a Schema,
}

impl<'a> FieldResolver<'a> {
    #[must_use]
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Resolve the key field list, applying precedence exactly once.
    ///
    /// Every notice is logged before this returns, including on error.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NoValidFields`] if the resolved list is empty.
    pub fn resolve(&self, request: &SelectionRequest) -> Result<Resolution, ResolveError> {
        let mut notices = Vec::new();
        let supplied = request.supplied();

        let mut selected = None;
        if request.has_fields() {
            selected = Some(self.by_fields(request, &mut notices));
        } else if !request.indices.is_empty() {
            selected = Some(self.by_indices(request, &mut notices));
        } else if !request.hints.is_empty() {
            selected = self.by_hints(request, &mut notices);
        }

        if let Some((used, _, _)) = &selected {
            let ignored: Vec<SelectionMechanism> = supplied
                .iter()
                .copied()
                .filter(|m| m != used)
                .collect();
            if !ignored.is_empty() {
                notices.insert(
                    0,
                    ResolutionNotice::IgnoredMechanisms {
                        used: *used,
                        ignored,
                    },
                );
            }
        }

        let (mechanism, positions, requested) = match selected {
            Some((used, positions, requested)) => (Some(used), positions, requested),
            None => {
                notices.push(ResolutionNotice::UsingAllFields {
                    count: self.schema.len(),
                });
                (None, (0..self.schema.len()).collect(), Vec::new())
            }
        };

        for notice in &notices {
            if notice.is_warning() {
                log::warn!("{}", notice);
            } else {
                log::info!("{}", notice);
            }
        }

        let keys = KeyFieldList::from_positions(self.schema, positions)
            .ok_or(ResolveError::NoValidFields { requested })?;
        log::debug!("Key fields: {}", keys);

        Ok(Resolution {
            keys,
            mechanism,
            notices,
        })
    }

    fn by_fields(
        &self,
        request: &SelectionRequest,
        notices: &mut Vec<ResolutionNotice>,
    ) -> (SelectionMechanism, Vec<usize>, Vec<String>) {
        let matched = self.match_names(request.fields.iter().map(String::as_str));
        if !matched.missing.is_empty() {
            notices.push(ResolutionNotice::InvalidFields {
                suggestions: self.suggest(&matched.missing),
                names: matched.missing,
            });
        }
        if !matched.repeated.is_empty() {
            notices.push(ResolutionNotice::RepeatedSelection {
                names: matched.repeated,
            });
        }
        let requested = request
            .fields
            .iter()
            .filter(|name| !name.trim().is_empty())
            .cloned()
            .collect();
        (SelectionMechanism::ExplicitFields, matched.positions, requested)
    }

    fn by_indices(
        &self,
        request: &SelectionRequest,
        notices: &mut Vec<ResolutionNotice>,
    ) -> (SelectionMechanism, Vec<usize>, Vec<String>) {
        let mut positions = Vec::new();
        let mut out_of_range = Vec::new();
        let mut repeated = Vec::new();
        for &idx in &request.indices {
            if idx >= self.schema.len() {
                out_of_range.push(idx);
            } else if positions.contains(&idx) {
                repeated.push(self.schema.fields()[idx].name.clone());
            } else {
                positions.push(idx);
            }
        }
        if !out_of_range.is_empty() {
            notices.push(ResolutionNotice::OutOfRangeIndices {
                indices: out_of_range,
                column_count: self.schema.len(),
            });
        }
        if !repeated.is_empty() {
            notices.push(ResolutionNotice::RepeatedSelection { names: repeated });
        }
        let requested = request.indices.iter().map(ToString::to_string).collect();
        (SelectionMechanism::ExplicitIndices, positions, requested)
    }

    /// `None` means the hints did not apply and resolution falls through.
    fn by_hints(
        &self,
        request: &SelectionRequest,
        notices: &mut Vec<ResolutionNotice>,
    ) -> Option<(SelectionMechanism, Vec<usize>, Vec<String>)> {
        let input = request.input_name.as_deref().unwrap_or_default();
        let Some(hint) = request.hints.lookup(input) else {
            notices.push(ResolutionNotice::NoHintEntry {
                input: input.to_string(),
            });
            return None;
        };
        if hint.key_columns.is_empty() {
            notices.push(ResolutionNotice::HintWithoutKeyColumns {
                pattern: hint.pattern.to_string(),
            });
            return None;
        }

        log::debug!(
            "Using primary-key hints from entry '{}' for '{}'",
            hint.pattern,
            input
        );
        let matched = self.match_names(hint.key_columns.iter().copied());
        if !matched.missing.is_empty() {
            notices.push(ResolutionNotice::HintColumnsMissing {
                pattern: hint.pattern.to_string(),
                names: matched.missing,
            });
        }
        if !matched.repeated.is_empty() {
            notices.push(ResolutionNotice::RepeatedSelection {
                names: matched.repeated,
            });
        }
        let requested = hint.key_columns.iter().map(ToString::to_string).collect();
        let mechanism = SelectionMechanism::ConfigHints;
        Some((mechanism, matched.positions, requested))
    }

    fn match_names<'n>(&self, requested: impl IntoIterator<Item = &'n str>) -> NameMatch {
        let mut matched = NameMatch::default();
        for name in requested {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            match self.schema.position_ignore_case(name) {
                Some(pos) if matched.positions.contains(&pos) => {
                    matched.repeated.push(name.to_string());
                }
                Some(pos) => matched.positions.push(pos),
                None => matched.missing.push(name.to_string()),
            }
        }
        matched
    }

    fn suggest(&self, missing: &[String]) -> Vec<(String, String)> {
        missing
            .iter()
            .filter_map(|name| {
                let lower = name.to_lowercase();
                self.schema
                    .names()
                    .map(|candidate| {
                        let score = strsim::jaro_winkler(&lower, &candidate.to_lowercase());
                        (candidate, score)
                    })
                    .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(candidate, _)| (name.clone(), candidate.to_string()))
            })
            .collect()
    }
}

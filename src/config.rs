//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file: `--config <FILE>`, else `config.toml` in the platform
//!    config directory (e.g. `~/.config/rowdupe/config.toml`) when present
//! 3. Environment variables prefixed `ROWDUPE_` (e.g. `ROWDUPE_THREADS=4`)
//!
//! Command-line flags are applied on top by the caller.

use std::fmt;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::duplicates::GroupOrder;
use crate::output::DEFAULT_DISPLAY_WIDTH;

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "ROWDUPE_";

/// Errors loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid display_width {0}: must be at least 1")]
    InvalidWidth(usize),

    #[error("Invalid delimiter {0:?}: must be a single ASCII character (or \"tab\")")]
    InvalidDelimiter(String),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker threads for grouping; 0 lets rayon decide
    pub threads: usize,
    /// Maximum characters shown per value
    pub display_width: usize,
    pub group_order: GroupOrder,
    /// Primary-key hint file used when no fields or indices are given
    pub hints_file: Option<PathBuf>,
    /// Field delimiter for `.csv` inputs
    #[serde(deserialize_with = "deserialize_delimiter")]
    pub delimiter: String,
    /// Align differing schemas by column name instead of failing
    pub allow_schema_mismatch: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: 0,
            display_width: DEFAULT_DISPLAY_WIDTH,
            group_order: GroupOrder::FirstSeen,
            hints_file: None,
            delimiter: ",".to_string(),
            allow_schema_mismatch: false,
        }
    }
}

impl Config {
    /// Load and validate configuration.
    ///
    /// An explicit `path` must exist; the default path is optional.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a layer is malformed or a value is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) if !p.is_file() => return Err(ConfigError::NotFound(p.to_path_buf())),
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };
        if let Some(ref f) = file {
            log::debug!("Loading config from {}", f.display());
        }
        Self::from_figment(Self::figment(file.as_deref()))
    }

    /// Defaults, then `file` (if any), then the environment.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(f) = file {
            figment = figment.merge(Toml::file(f));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Extract and validate a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction or validation fails.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero width or an unusable delimiter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display_width == 0 {
            return Err(ConfigError::InvalidWidth(self.display_width));
        }
        self.delimiter_byte()?;
        Ok(())
    }

    /// The delimiter as a single byte.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDelimiter`] unless the delimiter is one
    /// ASCII character, `\t` or `tab`.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        parse_delimiter(&self.delimiter)
    }

    /// The platform-specific config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "rowdupe", "rowdupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Read `delimiter` as text, or as a bare number: the environment layer
/// parses `ROWDUPE_DELIMITER=1` as an integer.
fn deserialize_delimiter<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct DelimiterVisitor;

    impl<'de> de::Visitor<'de> for DelimiterVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a single delimiter character")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_char<E>(self, value: char) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(DelimiterVisitor)
}

/// Parse a delimiter given as text.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDelimiter`] for anything but one ASCII
/// character, `\t` or `tab`.
pub fn parse_delimiter(s: &str) -> Result<u8, ConfigError> {
    match s {
        "\\t" | "tab" => Ok(b'\t'),
        _ => match s.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(ConfigError::InvalidDelimiter(s.to_string())),
        },
    }
}

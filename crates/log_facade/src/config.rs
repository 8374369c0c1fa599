//! Logger configuration, deserializable from application configuration files.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer};

use super::{resolve_level, Logger, LoggerError, OutputFormat, Severity};

/// Configuration for constructing a [`Logger`].
///
/// ```
/// use log_facade::{Destination, LoggerConfig, OutputFormat, Severity};
///
/// let config: LoggerConfig =
///     serde_json::from_str(r#"{ "level": "WARN", "format": "json", "destination": "stderr" }"#)?;
///
/// assert_eq!(config.level, Severity::Warn);
/// assert_eq!(config.format, OutputFormat::Json);
/// assert_eq!(config.destination, Destination::Stderr);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Minimum severity of emitted records.
    ///
    /// Names are resolved with [`resolve_level`], so unrecognized names select
    /// [`Severity::Debug`] rather than failing.
    #[serde(deserialize_with = "deserialize_level")]
    pub level: Severity,

    /// Output format of records. Unrecognized names fail deserialization.
    pub format: OutputFormat,

    /// Where records are written.
    pub destination: Destination,
}

/// Destination of log records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Standard output.
    #[default]
    Stdout,

    /// Standard error.
    Stderr,

    /// A file opened for appending, created if it does not exist.
    File(PathBuf),
}

fn deserialize_level<'de, D>(deserializer: D) -> Result<Severity, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    Ok(resolve_level(&name))
}

impl Logger {
    /// Creates a logger from a [`LoggerConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Io`] if the configured file cannot be opened.
    pub fn from_config(config: &LoggerConfig) -> Result<Self, LoggerError> {
        match &config.destination {
            Destination::Stdout => Self::new(std::io::stdout, config.level, config.format),
            Destination::Stderr => Self::new(std::io::stderr, config.level, config.format),
            Destination::File(path) => Self::from_file(path, config.level, config.format),
        }
    }
}

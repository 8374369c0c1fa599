use std::{fmt, str::FromStr};

use serde::Deserialize;

use super::LoggerError;

/// Serialization format of log records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `key=value` pairs on a single line.
    #[default]
    Text,

    /// Compact, single-line JSON object.
    Json,
}

impl OutputFormat {
    /// The name of the format, as accepted by [`OutputFormat::from_str`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = LoggerError;

    /// Parses `"text"` or `"json"`. Names are matched exactly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(LoggerError::InvalidFormat(s.to_owned())),
        }
    }
}

impl TryFrom<&str> for OutputFormat {
    type Error = LoggerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

//! Log severities and level-name resolution.

use std::fmt;

use super::LoggerError;

/// The severity of a log record, ordered from least to most severe.
///
/// Besides filtering, the two highest severities select a terminal action:
/// [`Severity::Fatal`] exits the process after logging and [`Severity::Panic`] panics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    /// Verbose diagnostic information.
    #[default]
    Debug,

    /// General operational messages.
    Info,

    /// Something unexpected that does not prevent progress.
    Warn,

    /// A failure of the current operation.
    Error,

    /// An unrecoverable failure; the process exits after the record is written.
    Fatal,

    /// An unrecoverable failure; the current thread panics after the record is written.
    Panic,
}

impl Severity {
    /// All severities, from least to most severe.
    pub const ALL: [Self; 6] = [
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
        Self::Panic,
    ];

    /// The lowercase name of the severity, as written in log records.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
            Self::Panic => "panic",
        }
    }

    /// The numeric value of the severity, `0` (debug) through `5` (panic).
    pub const fn to_i32(self) -> i32 {
        match self {
            Self::Debug => 0,
            Self::Info => 1,
            Self::Warn => 2,
            Self::Error => 3,
            Self::Fatal => 4,
            Self::Panic => 5,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for Severity {
    type Error = LoggerError;

    fn try_from(level: i32) -> Result<Self, LoggerError> {
        match level {
            0 => Ok(Self::Debug),
            1 => Ok(Self::Info),
            2 => Ok(Self::Warn),
            3 => Ok(Self::Error),
            4 => Ok(Self::Fatal),
            5 => Ok(Self::Panic),
            _ => Err(LoggerError::InvalidLevel(level)),
        }
    }
}

impl From<&tracing::Level> for Severity {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO => Self::Info,
            tracing::Level::WARN => Self::Warn,
            _ => Self::Error,
        }
    }
}

/// Resolves a level name to a [`Severity`], ignoring ASCII case.
///
/// `"panic"`, `"fatal"`, `"error"`, `"warn"` and `"info"` map to their severities. Every other
/// string, including the empty string and misspellings such as `"infro"`, resolves to
/// [`Severity::Debug`].
///
/// This never fails. Note that the fallback makes a typo in configuration silently select the
/// most verbose level; callers that need strictness should validate names themselves.
///
/// ```
/// use log_facade::{resolve_level, Severity};
///
/// assert_eq!(resolve_level("ERROR"), Severity::Error);
/// assert_eq!(resolve_level("infro"), Severity::Debug);
/// ```
pub fn resolve_level(name: &str) -> Severity {
    match name.to_ascii_lowercase().as_str() {
        "panic" => Severity::Panic,
        "fatal" => Severity::Fatal,
        "error" => Severity::Error,
        "warn" => Severity::Warn,
        "info" => Severity::Info,
        _ => Severity::Debug,
    }
}

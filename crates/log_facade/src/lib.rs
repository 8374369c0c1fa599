//! `log_facade` provides a small, leveled logging facade with structured fields.
//!
//! It offers:
//! - A [`Logger`] that owns a [`LogEngine`] and exposes one emission method per [`Severity`],
//!   with and without structured [`Fields`], and with `format_args!`-style templates.
//! - Two record formats, selected through [`OutputFormat`]: logfmt-style text and compact JSON.
//! - A [`LoggerConfig`] that can be deserialized from application configuration.
//! - A process-wide logger ([`init_global`] / [`global`]) and a [`LoggerLayer`] that forwards
//!   [`tracing`] events through a [`Logger`].
//!
//! # Example
//!
//! ```
//! use log_facade::{fields, Logger, OutputFormat, Severity};
//!
//! let logger = Logger::new(std::io::stdout, Severity::Info, "json")?;
//!
//! logger.debug("suppressed, below the threshold");
//! logger.info_with_fields(&fields! { "key1" => "value1", "key2" => 2 }, "hi");
//! log_facade::log_warn!(logger, "disk usage at {}%", 91);
//!
//! logger.set_format(OutputFormat::Text)?;
//! logger.set_threshold(log_facade::resolve_level("ERROR"))?;
//! logger.warn("suppressed as well");
//! # Ok::<(), log_facade::LoggerError>(())
//! ```

mod config;
mod engine;
mod format;
mod formatter;
mod global;
mod layer;
mod logger;
mod macros;
mod record;
mod severity;
mod storage;

use std::{collections::HashMap, convert::Infallible};

use serde_json::Value;

pub use self::{
    config::{Destination, LoggerConfig},
    engine::{LogEngine, WriterEngine},
    format::OutputFormat,
    formatter::{JsonFormatter, RecordFormatter, TextFormatter},
    global::{global, init_global},
    layer::LoggerLayer,
    logger::{Concat, ExitHandler, Logger},
    record::Record,
    severity::{resolve_level, Severity},
};

/// Name of the timestamp field in JSON records.
pub const TIMESTAMP_FIELD_NAME: &str = keys::TIMESTAMP;

/// Name of the message field in JSON records.
pub const MESSAGE_FIELD_NAME: &str = keys::MESSAGE;

mod keys {
    pub(crate) const TIMESTAMP: &str = "timestamp";
    pub(crate) const MESSAGE: &str = "message";
    pub(crate) const LEVEL: &str = "level";

    pub(crate) const TEXT_TIME: &str = "time";
    pub(crate) const TEXT_MESSAGE: &str = "msg";

    /// Prefix given to caller fields whose key clashes with an implicit key.
    pub(crate) const CLASH_PREFIX: &str = "fields.";
}

/// Structured key-value data attached to a single log record.
pub type Fields = HashMap<String, Value>;

/// Errors that can occur within the logger.
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// The output format is neither `text` nor `json`.
    #[error("Unknown format `{0}`")]
    InvalidFormat(String),

    /// The severity is outside of the six known levels.
    #[error("Unknown log level `{0}`")]
    InvalidLevel(i32),

    /// Represents an I/O error, such as failing to open a log file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Represents an error during JSON serialization.
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// The process-wide logger was already installed.
    #[error("The global logger has already been initialized")]
    GlobalAlreadyInitialized,
}

impl From<Infallible> for LoggerError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}

#[cfg(test)]
pub(crate) mod test_utils {
    use std::{
        io,
        sync::{Arc, Mutex, PoisonError},
    };

    use tracing_subscriber::fmt::MakeWriter;

    /// In-memory sink shared between a logger and the test inspecting its output.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub(crate) fn contents(&self) -> String {
            let buffer = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            String::from_utf8_lossy(&buffer).into_owned()
        }

        pub(crate) fn lines(&self) -> Vec<String> {
            self.contents().lines().map(str::to_owned).collect()
        }
    }

    impl io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for SharedBuffer {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}

//! The logging engine a [`Logger`][crate::Logger] delegates to.

use std::{fmt, io::Write};

use parking_lot::RwLock;
use tracing_subscriber::fmt::{writer::BoxMakeWriter, MakeWriter};

use super::{LoggerError, OutputFormat, Record, RecordFormatter, Severity};

/// The capabilities a [`Logger`][crate::Logger] requires from its engine.
///
/// Implementations must be safe to share between threads; the logger performs no
/// synchronization of its own.
pub trait LogEngine: Send + Sync {
    /// The minimum severity that will be emitted.
    fn threshold(&self) -> Severity;

    /// Replaces the minimum severity that will be emitted.
    fn set_threshold(&self, threshold: Severity);

    /// The format subsequent records will be serialized in.
    fn output_format(&self) -> OutputFormat;

    /// Replaces the format subsequent records will be serialized in.
    fn set_output_format(&self, format: OutputFormat);

    /// Serializes a record, including the trailing newline.
    fn format(&self, record: &Record<'_>) -> Result<Vec<u8>, LoggerError>;

    /// Writes a serialized record to the sink.
    fn write(&self, bytes: &[u8]) -> std::io::Result<()>;
}

#[derive(Debug, Clone, Copy)]
struct EngineState {
    threshold: Severity,
    formatter: RecordFormatter,
}

/// A [`LogEngine`] writing records to a [`MakeWriter`], such as [`std::io::stdout`],
/// [`std::io::stderr`] or a [`std::sync::Mutex`] wrapping a file.
pub struct WriterEngine {
    sink: BoxMakeWriter,
    state: RwLock<EngineState>,
}

impl WriterEngine {
    /// Creates an engine writing to `sink`.
    pub fn new<W>(sink: W, threshold: Severity, format: OutputFormat) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self {
            sink: BoxMakeWriter::new(sink),
            state: RwLock::new(EngineState {
                threshold,
                formatter: RecordFormatter::from(format),
            }),
        }
    }
}

impl fmt::Debug for WriterEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterEngine")
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

impl LogEngine for WriterEngine {
    fn threshold(&self) -> Severity {
        self.state.read().threshold
    }

    fn set_threshold(&self, threshold: Severity) {
        self.state.write().threshold = threshold;
    }

    fn output_format(&self) -> OutputFormat {
        self.state.read().formatter.output_format()
    }

    fn set_output_format(&self, format: OutputFormat) {
        self.state.write().formatter = RecordFormatter::from(format);
    }

    fn format(&self, record: &Record<'_>) -> Result<Vec<u8>, LoggerError> {
        // Copied out so that no lock is held while formatting.
        let formatter = self.state.read().formatter;
        formatter.format(record)
    }

    /// Should be done by a single `write_all` call to avoid fragmentation of records written by
    /// multiple threads.
    fn write(&self, bytes: &[u8]) -> std::io::Result<()> {
        self.sink.make_writer().write_all(bytes)
    }
}

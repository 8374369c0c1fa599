use std::{fmt, fs::OpenOptions, path::Path, sync::Mutex};

use tracing_subscriber::fmt::MakeWriter;

use super::{Fields, LogEngine, LoggerError, OutputFormat, Record, Severity, WriterEngine};

/// Function invoked after a fatal record is written. It receives the exit code and must not
/// return.
pub type ExitHandler = fn(i32) -> !;

/// Exit code passed to the [`ExitHandler`] by fatal emissions.
const FATAL_EXIT_CODE: i32 = 1;

/// A leveled logger owning a [`LogEngine`].
///
/// Records below the configured threshold are dropped. Fatal emissions write their record and
/// then call the [`ExitHandler`] (by default [`std::process::exit`]); panic emissions write
/// their record and then panic with the message. Neither returns control to the caller.
///
/// The logger can be shared between threads; all synchronization is left to the engine.
pub struct Logger {
    engine: Box<dyn LogEngine>,
    exit_handler: ExitHandler,
}

impl Logger {
    /// Creates a logger writing text records of every severity to standard output.
    ///
    /// # Errors
    ///
    /// Never fails with the built-in engine; the signature matches the other constructors.
    pub fn new_default() -> Result<Self, LoggerError> {
        Ok(Self::stdout_default())
    }

    pub(crate) fn stdout_default() -> Self {
        Self::with_engine(WriterEngine::new(
            std::io::stdout,
            Severity::Debug,
            OutputFormat::Text,
        ))
    }

    /// Creates a logger writing to `sink`.
    ///
    /// `threshold` is a [`Severity`] or its numeric value (`0` through `5`), and `format` is an
    /// [`OutputFormat`] or its name (`"text"` or `"json"`).
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidFormat`] if the format is not recognized, and
    /// [`LoggerError::InvalidLevel`] if the threshold is out of range.
    pub fn new<W, L, F>(sink: W, threshold: L, format: F) -> Result<Self, LoggerError>
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
        L: TryInto<Severity>,
        LoggerError: From<<L as TryInto<Severity>>::Error>,
        F: TryInto<OutputFormat>,
        LoggerError: From<<F as TryInto<OutputFormat>>::Error>,
    {
        let format = format.try_into()?;
        let threshold = threshold.try_into()?;

        Ok(Self::with_engine(WriterEngine::new(sink, threshold, format)))
    }

    /// Creates a logger appending to the file at `path`, creating it if it does not exist.
    ///
    /// The file is never truncated. On Unix, a newly created file gets mode `0666` (before the
    /// process umask is applied).
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Io`] if the file cannot be opened for writing, along with the
    /// errors of [`Logger::new`].
    pub fn from_file<P, L, F>(path: P, threshold: L, format: F) -> Result<Self, LoggerError>
    where
        P: AsRef<Path>,
        L: TryInto<Severity>,
        LoggerError: From<<L as TryInto<Severity>>::Error>,
        F: TryInto<OutputFormat>,
        LoggerError: From<<F as TryInto<OutputFormat>>::Error>,
    {
        let mut options = OpenOptions::new();
        options.create(true).append(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o666);
        }

        let file = options.open(path)?;
        Self::new(Mutex::new(file), threshold, format)
    }

    /// Creates a logger delegating to a custom engine.
    pub fn with_engine(engine: impl LogEngine + 'static) -> Self {
        Self {
            engine: Box::new(engine),
            exit_handler: std::process::exit,
        }
    }

    /// Replaces the function called after a fatal record is written.
    #[must_use]
    pub fn with_exit_handler(mut self, exit_handler: ExitHandler) -> Self {
        self.exit_handler = exit_handler;
        self
    }

    /// The engine this logger delegates to.
    pub fn engine(&self) -> &dyn LogEngine {
        self.engine.as_ref()
    }

    /// The minimum severity that is currently emitted.
    pub fn threshold(&self) -> Severity {
        self.engine.threshold()
    }

    /// The format records are currently serialized in.
    pub fn output_format(&self) -> OutputFormat {
        self.engine.output_format()
    }

    /// Whether records of `severity` are currently emitted.
    pub fn is_enabled(&self, severity: Severity) -> bool {
        severity >= self.engine.threshold()
    }

    /// Changes the format of subsequent records. Records already written are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidFormat`] if the format is not recognized, in which case the
    /// current format is kept.
    pub fn set_format<F>(&self, format: F) -> Result<(), LoggerError>
    where
        F: TryInto<OutputFormat>,
        LoggerError: From<<F as TryInto<OutputFormat>>::Error>,
    {
        let format = format.try_into()?;
        self.engine.set_output_format(format);
        tracing::debug!(%format, "Log output format changed");

        Ok(())
    }

    /// Changes the minimum severity of subsequent records. Suppressed records are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidLevel`] if the threshold is out of range, in which case the
    /// current threshold is kept.
    pub fn set_threshold<L>(&self, threshold: L) -> Result<(), LoggerError>
    where
        L: TryInto<Severity>,
        LoggerError: From<<L as TryInto<Severity>>::Error>,
    {
        let threshold = threshold.try_into()?;
        self.engine.set_threshold(threshold);
        tracing::debug!(%threshold, "Log threshold changed");

        Ok(())
    }

    /// Emits `message` at `severity`.
    ///
    /// Fatal and panic severities perform their terminal action, as [`Logger::fatal`] and
    /// [`Logger::panic`] do.
    pub fn log(&self, severity: Severity, message: impl fmt::Display) {
        self.dispatch(severity, None, &message);
    }

    /// Emits `message` at `severity` with structured fields.
    ///
    /// Fatal and panic severities perform their terminal action.
    pub fn log_with_fields(&self, severity: Severity, fields: &Fields, message: impl fmt::Display) {
        self.dispatch(severity, Some(fields), &message);
    }

    /// Emits a debug record.
    pub fn debug(&self, message: impl fmt::Display) {
        self.emit(Severity::Debug, None, &message);
    }

    /// Emits an info record.
    pub fn info(&self, message: impl fmt::Display) {
        self.emit(Severity::Info, None, &message);
    }

    /// Emits a warn record.
    pub fn warn(&self, message: impl fmt::Display) {
        self.emit(Severity::Warn, None, &message);
    }

    /// Emits an error record.
    pub fn error(&self, message: impl fmt::Display) {
        self.emit(Severity::Error, None, &message);
    }

    /// Emits a fatal record and exits.
    pub fn fatal(&self, message: impl fmt::Display) -> ! {
        self.terminate(Severity::Fatal, None, &message)
    }

    /// Emits a panic record and panics with `message`.
    ///
    /// # Panics
    ///
    /// Always panics, after the record is written.
    pub fn panic(&self, message: impl fmt::Display) -> ! {
        self.terminate(Severity::Panic, None, &message)
    }

    /// Emits a debug record with structured fields.
    pub fn debug_with_fields(&self, fields: &Fields, message: impl fmt::Display) {
        self.emit(Severity::Debug, Some(fields), &message);
    }

    /// Emits an info record with structured fields.
    pub fn info_with_fields(&self, fields: &Fields, message: impl fmt::Display) {
        self.emit(Severity::Info, Some(fields), &message);
    }

    /// Emits a warn record with structured fields.
    pub fn warn_with_fields(&self, fields: &Fields, message: impl fmt::Display) {
        self.emit(Severity::Warn, Some(fields), &message);
    }

    /// Emits an error record with structured fields.
    pub fn error_with_fields(&self, fields: &Fields, message: impl fmt::Display) {
        self.emit(Severity::Error, Some(fields), &message);
    }

    /// Emits a fatal record with structured fields and exits.
    pub fn fatal_with_fields(&self, fields: &Fields, message: impl fmt::Display) -> ! {
        self.terminate(Severity::Fatal, Some(fields), &message)
    }

    /// Emits a panic record with structured fields and panics with `message`.
    ///
    /// # Panics
    ///
    /// Always panics, after the record is written.
    pub fn panic_with_fields(&self, fields: &Fields, message: impl fmt::Display) -> ! {
        self.terminate(Severity::Panic, Some(fields), &message)
    }

    /// Emits a debug record from a template, see [`log_debug!`][crate::log_debug!].
    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Debug, None, &args);
    }

    /// Emits an info record from a template, see [`log_info!`][crate::log_info!].
    pub fn infof(&self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Info, None, &args);
    }

    /// Emits a warn record from a template, see [`log_warn!`][crate::log_warn!].
    pub fn warnf(&self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Warn, None, &args);
    }

    /// Emits an error record from a template, see [`log_error!`][crate::log_error!].
    pub fn errorf(&self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Error, None, &args);
    }

    /// Emits a fatal record from a template and exits, see [`log_fatal!`][crate::log_fatal!].
    pub fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        self.terminate(Severity::Fatal, None, &args)
    }

    /// Emits a panic record from a template and panics, see [`log_panic!`][crate::log_panic!].
    ///
    /// # Panics
    ///
    /// Always panics, after the record is written.
    pub fn panicf(&self, args: fmt::Arguments<'_>) -> ! {
        self.terminate(Severity::Panic, None, &args)
    }

    fn dispatch(&self, severity: Severity, fields: Option<&Fields>, message: &dyn fmt::Display) {
        match severity {
            Severity::Fatal | Severity::Panic => self.terminate(severity, fields, message),
            _ => self.emit(severity, fields, message),
        }
    }

    /// Writes the record, unless `severity` is below the threshold.
    fn emit(&self, severity: Severity, fields: Option<&Fields>, message: &dyn fmt::Display) {
        if self.is_enabled(severity) {
            self.write_record(&Record::new(severity, &message.to_string(), fields));
        }
    }

    /// Writes the record, if enabled, and then exits or panics.
    #[allow(clippy::panic)]
    fn terminate(
        &self,
        severity: Severity,
        fields: Option<&Fields>,
        message: &dyn fmt::Display,
    ) -> ! {
        let message = message.to_string();
        if self.is_enabled(severity) {
            self.write_record(&Record::new(severity, &message, fields));
        }

        match severity {
            Severity::Panic => panic!("{message}"),
            _ => (self.exit_handler)(FATAL_EXIT_CODE),
        }
    }

    /// Write failures are reported on standard error and otherwise ignored. They are not logged
    /// through `tracing`, which may be routed back into this logger.
    #[allow(clippy::print_stderr)]
    fn write_record(&self, record: &Record<'_>) {
        match self.engine.format(record) {
            Ok(bytes) => {
                if let Err(error) = self.engine.write(&bytes) {
                    eprintln!("Failed to write to log, {error}");
                }
            }
            Err(error) => eprintln!("Failed to format log record, {error}"),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("threshold", &self.threshold())
            .field("output_format", &self.output_format())
            .finish_non_exhaustive()
    }
}

/// Displays each part back to back, for messages assembled from several values.
///
/// No separator is inserted between parts, including between adjacent non-string parts:
/// `Concat(&[&1, &2])` displays as `12`. Spaces must be part of the values themselves.
///
/// ```
/// use log_facade::{Concat, Logger};
///
/// let logger = Logger::new_default()?;
/// logger.error(Concat(&[&"Testing ", &"logger ", &"Error()"]));
/// logger.info(Concat(&[&"retry ", &3, &" of ", &5]));
/// # Ok::<(), log_facade::LoggerError>(())
/// ```
#[derive(Clone, Copy)]
pub struct Concat<'a>(pub &'a [&'a dyn fmt::Display]);

impl fmt::Display for Concat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in self.0 {
            part.fmt(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Concat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Concat").field(&self.to_string()).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use std::{
        io::Read,
        panic::{catch_unwind, AssertUnwindSafe},
        sync::Arc,
        thread,
    };

    use serde_json::Value;

    use super::*;
    use crate::{fields, test_utils::SharedBuffer};

    fn exit_by_panicking(code: i32) -> ! {
        panic!("exit({code})")
    }

    fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
        payload
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| payload.downcast_ref::<&str>().map(|s| (*s).to_owned()))
            .unwrap_or_default()
    }

    #[test]
    fn default_logger_emits_everything_as_text() {
        let logger = Logger::new_default().unwrap();
        assert_eq!(logger.threshold(), Severity::Debug);
        assert_eq!(logger.output_format(), OutputFormat::Text);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let error = Logger::new(SharedBuffer::default(), Severity::Info, "yaml").unwrap_err();
        assert!(matches!(error, LoggerError::InvalidFormat(format) if format == "yaml"));

        assert!(Logger::new(SharedBuffer::default(), Severity::Info, "text").is_ok());
        assert!(Logger::new(SharedBuffer::default(), Severity::Info, "json").is_ok());
    }

    #[test]
    fn out_of_range_level_is_rejected() {
        let error = Logger::new(SharedBuffer::default(), 6_i32, "text").unwrap_err();
        assert!(matches!(error, LoggerError::InvalidLevel(6)));

        let logger = Logger::new(SharedBuffer::default(), 2_i32, OutputFormat::Json).unwrap();
        assert_eq!(logger.threshold(), Severity::Warn);
    }

    #[test]
    fn records_below_threshold_are_suppressed() {
        let sink = SharedBuffer::default();
        let logger = Logger::new(sink.clone(), Severity::Warn, OutputFormat::Text).unwrap();

        logger.debug("hidden");
        logger.info("hidden");
        logger.info_with_fields(&fields! { "key" => "value" }, "hidden");
        logger.infof(format_args!("hidden {}", 1));
        assert!(sink.contents().is_empty());

        logger.warn("shown");
        logger.error("shown");
        assert_eq!(sink.lines().len(), 2);
    }

    #[test]
    fn records_at_threshold_are_written() {
        let sink = SharedBuffer::default();
        let logger = Logger::new(sink.clone(), Severity::Debug, OutputFormat::Text).unwrap();

        logger.info("hello");

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("hello"));
        assert!(lines[0].contains("level=info"));
    }

    #[test]
    fn fields_are_serialized_as_json_siblings() {
        let sink = SharedBuffer::default();
        let logger = Logger::new(sink.clone(), Severity::Info, "json").unwrap();

        logger.info_with_fields(&fields! { "key1" => "value1", "key2" => 2 }, "hi");

        let record: Value = serde_json::from_str(&sink.contents()).unwrap();
        assert_eq!(record["message"], "hi");
        assert_eq!(record["key1"], "value1");
        assert_eq!(record["key2"], 2);
        assert!(record["timestamp"].is_string());
    }

    #[test]
    fn templates_and_concatenations_render_messages() {
        let sink = SharedBuffer::default();
        let logger = Logger::new(sink.clone(), Severity::Debug, OutputFormat::Json).unwrap();

        logger.warnf(format_args!("Testing logger Warnf() {}", "ok"));
        logger.error(Concat(&[&"Testing ", &"logger ", &"Error()"]));
        logger.log(Severity::Info, Concat(&[&"attempt ", &2]));

        let messages: Vec<Value> = sink
            .lines()
            .iter()
            .map(|line| serde_json::from_str::<Value>(line).unwrap()["message"].clone())
            .collect();
        assert_eq!(
            messages,
            ["Testing logger Warnf() ok", "Testing logger Error()", "attempt 2"]
        );
    }

    #[test]
    fn concat_inserts_no_separators() {
        assert_eq!(Concat(&[&1, &2]).to_string(), "12");
        assert_eq!(Concat(&[&"a", &1.5, &true]).to_string(), "a1.5true");
        assert_eq!(Concat(&[]).to_string(), "");
        assert_eq!(format!("{:?}", Concat(&[&"x", &7])), r#"Concat("x7")"#);
    }

    #[test]
    fn format_changes_apply_to_subsequent_records() {
        let sink = SharedBuffer::default();
        let logger = Logger::new(sink.clone(), Severity::Debug, OutputFormat::Text).unwrap();

        logger.info("as text");
        logger.set_format("json").unwrap();
        logger.info("as json");

        let error = logger.set_format("xml").unwrap_err();
        assert!(matches!(error, LoggerError::InvalidFormat(_)));
        assert_eq!(logger.output_format(), OutputFormat::Json);

        let lines = sink.lines();
        assert!(lines[0].starts_with("time="));
        assert!(serde_json::from_str::<Value>(&lines[1]).is_ok());
    }

    #[test]
    fn threshold_changes_apply_to_subsequent_records() {
        let sink = SharedBuffer::default();
        let logger = Logger::new(sink.clone(), Severity::Debug, OutputFormat::Text).unwrap();

        logger.set_threshold(Severity::Error).unwrap();
        logger.warn("hidden");
        assert!(!logger.is_enabled(Severity::Warn));

        assert!(matches!(
            logger.set_threshold(9_i32),
            Err(LoggerError::InvalidLevel(9))
        ));
        assert_eq!(logger.threshold(), Severity::Error);

        logger.set_threshold(0_i32).unwrap();
        logger.debug("shown");
        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn panic_writes_record_before_unwinding() {
        let sink = SharedBuffer::default();
        let logger = Logger::new(sink.clone(), Severity::Debug, OutputFormat::Json).unwrap();

        let payload = catch_unwind(AssertUnwindSafe(|| {
            logger.panic_with_fields(&fields! { "component" => "db" }, "connection pool exhausted");
        }))
        .unwrap_err();

        assert_eq!(panic_message(payload), "connection pool exhausted");
        let record: Value = serde_json::from_str(&sink.contents()).unwrap();
        assert_eq!(record["level"], "panic");
        assert_eq!(record["component"], "db");
    }

    #[test]
    #[should_panic(expected = "boom 42")]
    fn panicf_panics_with_the_rendered_message() {
        let logger = Logger::new(SharedBuffer::default(), Severity::Debug, "text").unwrap();
        logger.panicf(format_args!("boom {}", 42));
    }

    #[test]
    fn fatal_writes_record_then_exits_with_code_one() {
        let sink = SharedBuffer::default();
        let logger = Logger::new(sink.clone(), Severity::Debug, OutputFormat::Text)
            .unwrap()
            .with_exit_handler(exit_by_panicking);

        let payload = catch_unwind(AssertUnwindSafe(|| {
            logger.fatal("cannot continue");
        }))
        .unwrap_err();

        assert_eq!(panic_message(payload), "exit(1)");
        assert!(sink.contents().contains("level=fatal"));
    }

    #[test]
    fn fatal_with_fields_writes_record_then_exits_with_code_one() {
        let sink = SharedBuffer::default();
        let logger = Logger::new(sink.clone(), Severity::Debug, OutputFormat::Json)
            .unwrap()
            .with_exit_handler(exit_by_panicking);

        let payload = catch_unwind(AssertUnwindSafe(|| {
            logger.fatal_with_fields(&fields! { "config" => "/etc/app.toml" }, "config unreadable");
        }))
        .unwrap_err();

        assert_eq!(panic_message(payload), "exit(1)");
        let record: Value = serde_json::from_str(&sink.contents()).unwrap();
        assert_eq!(record["level"], "fatal");
        assert_eq!(record["message"], "config unreadable");
        assert_eq!(record["config"], "/etc/app.toml");
    }

    #[test]
    fn fatalf_writes_rendered_record_then_exits_with_code_one() {
        let sink = SharedBuffer::default();
        let logger = Logger::new(sink.clone(), Severity::Error, OutputFormat::Text)
            .unwrap()
            .with_exit_handler(exit_by_panicking);

        let payload = catch_unwind(AssertUnwindSafe(|| {
            logger.fatalf(format_args!("lost {} of {} replicas", 2, 3));
        }))
        .unwrap_err();

        assert_eq!(panic_message(payload), "exit(1)");
        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(r#"level=fatal msg="lost 2 of 3 replicas""#));
    }

    #[test]
    fn suppressed_fatal_still_exits() {
        let sink = SharedBuffer::default();
        let logger = Logger::new(sink.clone(), Severity::Panic, OutputFormat::Text)
            .unwrap()
            .with_exit_handler(exit_by_panicking);

        let payload = catch_unwind(AssertUnwindSafe(|| {
            logger.log(Severity::Fatal, "cannot continue");
        }))
        .unwrap_err();

        assert_eq!(panic_message(payload), "exit(1)");
        assert!(sink.contents().is_empty());
    }

    #[test]
    fn file_logger_appends_without_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");

        let logger = Logger::from_file(&path, Severity::Debug, "text").unwrap();
        logger.info("first");
        drop(logger);

        let logger = Logger::from_file(&path, Severity::Debug, "json").unwrap();
        logger.info("second");
        drop(logger);

        let mut contents = String::new();
        std::fs::File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("msg=first"));
        assert!(lines[1].contains(r#""message":"second""#));
    }

    #[cfg(unix)]
    #[test]
    fn file_logger_creates_files_with_default_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        // `File::create` also requests 0o666, so it shows what the current umask leaves.
        let reference = dir.path().join("reference");
        std::fs::File::create(&reference).unwrap();

        let logger = Logger::from_file(&path, Severity::Debug, "text").unwrap();
        logger.info("created");

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        let expected = std::fs::metadata(&reference).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, expected);
        assert_eq!(mode & 0o111, 0);
        assert_eq!(mode & 0o600, 0o600);
    }

    #[test]
    fn file_logger_propagates_open_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("app.log");

        let error = Logger::from_file(&path, Severity::Debug, "text").unwrap_err();
        assert!(matches!(error, LoggerError::Io(_)));
    }

    #[test]
    fn concurrent_records_do_not_interleave() {
        let sink = SharedBuffer::default();
        let logger =
            Arc::new(Logger::new(sink.clone(), Severity::Debug, OutputFormat::Json).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let logger = Arc::clone(&logger);
                thread::spawn(move || {
                    for sequence in 0..50 {
                        logger.info_with_fields(
                            &fields! { "worker" => worker, "sequence" => sequence },
                            "tick",
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = sink.lines();
        assert_eq!(lines.len(), 400);
        for line in lines {
            let record: Value = serde_json::from_str(&line).unwrap();
            assert_eq!(record["message"], "tick");
        }
    }
}

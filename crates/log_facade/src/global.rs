//! The process-wide logger.

use std::sync::OnceLock;

use super::{Logger, LoggerError};

static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();

/// Installs `logger` as the process-wide logger returned by [`global`].
///
/// # Errors
///
/// Returns [`LoggerError::GlobalAlreadyInitialized`] if a logger was already installed, or if
/// [`global`] was called before and installed the default logger.
pub fn init_global(logger: Logger) -> Result<(), LoggerError> {
    GLOBAL_LOGGER
        .set(logger)
        .map_err(|_| LoggerError::GlobalAlreadyInitialized)
}

/// Returns the process-wide logger.
///
/// If [`init_global`] has not been called, a logger writing text records of every severity to
/// standard output is installed on first use.
pub fn global() -> &'static Logger {
    GLOBAL_LOGGER.get_or_init(Logger::stdout_default)
}

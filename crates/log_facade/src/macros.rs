//! Macros for building [`Fields`][crate::Fields] and emitting records from templates.

/// Builds [`Fields`][crate::Fields] from `key => value` pairs.
///
/// Values are converted with [`serde_json::Value::from`], so strings, numbers, booleans and
/// `serde_json::json!` values are all accepted.
///
/// ```
/// use log_facade::fields;
///
/// let fields = fields! { "key1" => "value1", "key2" => 2 };
/// assert_eq!(fields["key2"], 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        <$crate::Fields as ::core::iter::FromIterator<_>>::from_iter([
            $((
                ::std::string::String::from($key),
                $crate::__private::serde_json::Value::from($value),
            ),)+
        ])
    };
}

/// Emits a debug record from a `format_args!` template.
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debugf(::core::format_args!($($arg)+))
    };
}

/// Emits an info record from a `format_args!` template.
///
/// ```
/// let logger = log_facade::Logger::new_default()?;
/// log_facade::log_info!(logger, "listening on {}:{}", "0.0.0.0", 8080);
/// # Ok::<(), log_facade::LoggerError>(())
/// ```
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.infof(::core::format_args!($($arg)+))
    };
}

/// Emits a warn record from a `format_args!` template.
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        $logger.warnf(::core::format_args!($($arg)+))
    };
}

/// Emits an error record from a `format_args!` template.
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $logger.errorf(::core::format_args!($($arg)+))
    };
}

/// Emits a fatal record from a `format_args!` template and exits.
#[macro_export]
macro_rules! log_fatal {
    ($logger:expr, $($arg:tt)+) => {
        $logger.fatalf(::core::format_args!($($arg)+))
    };
}

/// Emits a panic record from a `format_args!` template and panics.
#[macro_export]
macro_rules! log_panic {
    ($logger:expr, $($arg:tt)+) => {
        $logger.panicf(::core::format_args!($($arg)+))
    };
}

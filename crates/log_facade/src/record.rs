use time::OffsetDateTime;

use super::{Fields, Severity};

/// A single log record, as handed to a [`LogEngine`][crate::LogEngine] for formatting.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    /// Severity the record was emitted at.
    pub severity: Severity,

    /// The rendered message.
    pub message: &'a str,

    /// Caller-supplied fields, if any.
    pub fields: Option<&'a Fields>,

    /// Time at which the record was emitted, in UTC.
    pub timestamp: OffsetDateTime,
}

impl<'a> Record<'a> {
    /// Creates a record timestamped with the current time.
    pub fn new(severity: Severity, message: &'a str, fields: Option<&'a Fields>) -> Self {
        Self {
            severity,
            message,
            fields,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

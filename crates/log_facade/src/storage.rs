//! Capturing of `tracing` event fields into [`Fields`].

use std::fmt;

use serde_json::Value;
use tracing::field::{Field, Visit};

use super::{keys, Fields};

/// Holds the message and key-value data recorded for an event.
#[derive(Clone, Debug, Default)]
pub(crate) struct EventStorage {
    /// The collected key-value pairs of the event.
    fields: Fields,

    /// The primary message of the event, if captured.
    message: Option<String>,
}

impl EventStorage {
    pub(crate) fn into_parts(self) -> (Option<String>, Fields) {
        (self.message, self.fields)
    }

    fn record_value(&mut self, field: &Field, value: Value) {
        if field.name() == keys::MESSAGE {
            if self.message.is_none() {
                self.message = Some(match value {
                    Value::String(message) => message,
                    value => value.to_string(),
                });
            }
        } else {
            let name = field.name();
            let name = name.strip_prefix("r#").unwrap_or(name);
            self.fields.insert(name.to_owned(), value);
        }
    }
}

impl Visit for EventStorage {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == keys::MESSAGE {
            self.message = Some(value.to_owned()); // `record_str()` is preferred for `message`
        } else {
            self.record_value(field, Value::from(value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            // Recorded by the `log` compatibility layer, already part of the metadata
            name if name.starts_with("log.") => (),
            _ => self.record_value(field, Value::from(format!("{value:?}"))),
        }
    }
}

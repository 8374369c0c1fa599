//! Formatters rendering a [`Record`] into a single line of text or JSON.

use std::borrow::Cow;

use serde::ser::{SerializeMap, Serializer};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;

use super::{keys, Fields, LoggerError, OutputFormat, Record};

/// Selects the formatter for an [`OutputFormat`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordFormatter {
    /// See [`TextFormatter`].
    Text(TextFormatter),

    /// See [`JsonFormatter`].
    Json(JsonFormatter),
}

impl RecordFormatter {
    /// Serializes the record, including the trailing newline.
    pub fn format(&self, record: &Record<'_>) -> Result<Vec<u8>, LoggerError> {
        match self {
            Self::Text(formatter) => formatter.format(record),
            Self::Json(formatter) => formatter.format(record),
        }
    }

    /// The output format this formatter produces.
    pub fn output_format(&self) -> OutputFormat {
        match self {
            Self::Text(_) => OutputFormat::Text,
            Self::Json(_) => OutputFormat::Json,
        }
    }
}

impl From<OutputFormat> for RecordFormatter {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Self::Text(TextFormatter),
            OutputFormat::Json => Self::Json(JsonFormatter),
        }
    }
}

/// Formats records as `key=value` pairs:
///
/// ```text
/// time="2024-05-01T10:00:00Z" level=info msg="listening on port" port=8080
/// ```
///
/// Caller fields follow the implicit keys, sorted by key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextFormatter;

impl TextFormatter {
    const IMPLICIT_KEYS: [&'static str; 3] = [keys::TEXT_TIME, keys::LEVEL, keys::TEXT_MESSAGE];

    /// Serializes the record, including the trailing newline.
    pub fn format(&self, record: &Record<'_>) -> Result<Vec<u8>, LoggerError> {
        let mut line = String::new();

        if let Ok(time) = record.timestamp.format(&Rfc3339) {
            append_key_value(&mut line, keys::TEXT_TIME, &time)?;
        }
        append_key_value(&mut line, keys::LEVEL, record.severity.as_str())?;
        append_key_value(&mut line, keys::TEXT_MESSAGE, record.message)?;

        for (key, value) in sorted_fields(record.fields, &Self::IMPLICIT_KEYS) {
            match value {
                Value::String(value) => append_key_value(&mut line, &key, value)?,
                value => append_key_value(&mut line, &key, &value.to_string())?,
            }
        }

        line.push('\n');
        Ok(line.into_bytes())
    }
}

/// Appends ` key=value` to the line, quoting the value if required.
fn append_key_value(line: &mut String, key: &str, value: &str) -> Result<(), LoggerError> {
    if !line.is_empty() {
        line.push(' ');
    }
    line.push_str(key);
    line.push('=');

    if needs_quoting(value) {
        line.push_str(&serde_json::to_string(value)?);
    } else {
        line.push_str(value);
    }

    Ok(())
}

fn needs_quoting(value: &str) -> bool {
    !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '/' | '@' | '^' | '+'))
}

/// Formats records as compact JSON objects:
///
/// ```text
/// {"timestamp":"2024-05-01T10:00:00Z","level":"info","message":"listening on port","port":8080}
/// ```
///
/// Caller fields are sibling keys of the implicit keys, sorted by key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JsonFormatter;

impl JsonFormatter {
    const IMPLICIT_KEYS: [&'static str; 3] = [keys::TIMESTAMP, keys::LEVEL, keys::MESSAGE];

    /// Serializes the record, including the trailing newline.
    pub fn format(&self, record: &Record<'_>) -> Result<Vec<u8>, LoggerError> {
        let mut buffer = Vec::new();
        let mut serializer = serde_json::Serializer::new(&mut buffer);
        let mut map_serializer = serializer.serialize_map(None)?;

        if let Ok(time) = record.timestamp.format(&Rfc3339) {
            map_serializer.serialize_entry(keys::TIMESTAMP, &time)?;
        }
        map_serializer.serialize_entry(keys::LEVEL, record.severity.as_str())?;
        map_serializer.serialize_entry(keys::MESSAGE, record.message)?;

        for (key, value) in sorted_fields(record.fields, &Self::IMPLICIT_KEYS) {
            map_serializer.serialize_entry(key.as_ref(), value)?;
        }

        map_serializer.end()?;
        buffer.push(b'\n');
        Ok(buffer)
    }
}

/// Returns the caller fields sorted by key, renaming keys which clash with implicit keys to
/// `fields.<key>`.
fn sorted_fields<'a>(
    fields: Option<&'a Fields>,
    implicit_keys: &[&str],
) -> Vec<(Cow<'a, str>, &'a Value)> {
    let Some(fields) = fields else {
        return Vec::new();
    };

    let mut entries: Vec<_> = fields
        .iter()
        .map(|(key, value)| {
            if implicit_keys.contains(&key.as_str()) {
                tracing::debug!(
                    "Field key `{key}` clashes with a reserved key, logging it as `{}{key}`",
                    keys::CLASH_PREFIX
                );
                (Cow::Owned(format!("{}{key}", keys::CLASH_PREFIX)), value)
            } else {
                (Cow::Borrowed(key.as_str()), value)
            }
        })
        .collect();
    entries.sort_unstable_by(|(left, _), (right, _)| left.cmp(right));

    entries
}

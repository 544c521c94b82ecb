//! Line-delimited JSON record codec
//!
//! Each line holds one JSON object. Blank lines are skipped. Reading is
//! lazy and single-pass: records are produced one at a time as the caller
//! pulls them, so memory stays bounded by what the caller buffers.

use crate::error::TaskError;
use serde_json::Value;
use std::io::{BufRead, Lines, Write};

/// One structured record: field name to scalar or nested value, in insertion order.
pub type Record = serde_json::Map<String, Value>;

/// Lazy iterator over the records of a line-delimited stream.
///
/// Yields at most one error, then stops.
pub struct RecordReader<R> {
    lines: Lines<R>,
    uri: String,
    line: usize,
    done: bool,
}

/// Read records lazily from `reader`; `uri` is only used in error reports.
pub fn read_records<R: BufRead>(reader: R, uri: impl Into<String>) -> RecordReader<R> {
    RecordReader {
        lines: reader.lines(),
        uri: uri.into(),
        line: 0,
        done: false,
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record, TaskError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = match self.lines.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(TaskError::source_unavailable(&self.uri, e)));
                }
                Some(Ok(line)) => line,
            };
            self.line += 1;

            if line.trim().is_empty() {
                continue;
            }

            let parsed = match serde_json::from_str::<Value>(&line) {
                Ok(Value::Object(record)) => Ok(record),
                Ok(other) => Err(format!("expected a JSON object, found {}", kind(&other))),
                Err(e) => Err(e.to_string()),
            };

            return Some(parsed.map_err(|reason| {
                self.done = true;
                TaskError::MalformedRecord {
                    line: self.line,
                    reason,
                }
            }));
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Write records as line-delimited JSON, returning how many were written.
pub fn write_records<'a, W, I>(writer: &mut W, uri: &str, records: I) -> Result<u64, TaskError>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = &'a Record>,
{
    let mut count = 0u64;
    for record in records {
        serde_json::to_writer(&mut *writer, record)
            .map_err(|e| TaskError::source_unavailable(uri, e))?;
        writer
            .write_all(b"\n")
            .map_err(|e| TaskError::source_unavailable(uri, e))?;
        count += 1;
    }
    writer
        .flush()
        .map_err(|e| TaskError::source_unavailable(uri, e))?;
    Ok(count)
}

//! JSON arrays of objects and JSON Lines.
//!
//! Content whose first non-whitespace character is `[` is read as one array.
//! Content that is exactly one object, pretty-printed or not, is one row;
//! anything else is read line by line. Only objects become rows. Nested
//! objects are flattened into dotted keys, arrays are kept as their compact
//! JSON text and `null` leaves become missing values.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use super::{FileParser, ProgressSink, Reporter, INFERENCE_SAMPLE_SIZE};
use crate::analyzers::inference::{infer_type, most_common_type};
use crate::error::ParseError;
use crate::model::{ColumnInfo, ColumnType, DataRow, DataSchema, FileType, ParsedData};

/// Joins parent and child keys when flattening.
pub const NESTED_SEPARATOR: &str = ".";

const NO_OBJECTS: &str = "No JSON objects found";

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl JsonParser {
    pub fn new() -> Self {
        Self
    }
}

impl FileParser for JsonParser {
    fn file_type(&self) -> FileType {
        FileType::Json
    }

    #[instrument(skip(self, content, sink), fields(bytes = content.len()))]
    fn parse_with(
        &self,
        content: &str,
        max_rows: usize,
        sink: &mut dyn ProgressSink,
    ) -> Result<ParsedData, ParseError> {
        if content.trim().is_empty() {
            return Err(ParseError::new("File is empty"));
        }

        let mut reporter = Reporter::new(sink);
        reporter.phase(0, None, "Detecting JSON format...")?;

        let objects = match read_objects(content) {
            Ok(objects) if !objects.is_empty() => objects,
            Ok(_) => return Err(ParseError::new(NO_OBJECTS)),
            Err(err) => return Err(ParseError::with_cause(NO_OBJECTS, err)),
        };

        let total_rows = objects.len();
        let rows_to_parse = max_rows.min(total_rows);

        reporter.phase(0, Some(total_rows), "Building schema...")?;
        let schema = infer_schema(&objects[..total_rows.min(INFERENCE_SAMPLE_SIZE)]);

        reporter.phase(0, Some(total_rows), "Parsing rows...")?;
        let mut rows = Vec::with_capacity(rows_to_parse);
        for (index, object) in objects.iter().take(rows_to_parse).enumerate() {
            rows.push(DataRow::new(flatten(object)));
            reporter.rows(index + 1, total_rows)?;
        }

        debug!(
            columns = schema.column_count(),
            total_rows,
            loaded = rows.len(),
            "Parsed JSON"
        );

        Ok(ParsedData::new(schema, rows, total_rows))
    }

    /// Number of top-level objects; 0 when nothing can be read.
    fn count_rows(&self, content: &str) -> usize {
        read_objects(content).map_or(0, |objects| objects.len())
    }
}

/// Reads every top-level object.
///
/// A malformed array is an error. Malformed JSON Lines entries are skipped.
fn read_objects(content: &str) -> Result<Vec<Map<String, Value>>, serde_json::Error> {
    let trimmed = content.trim();

    if trimmed.starts_with('[') {
        let value: Value = serde_json::from_str(trimmed)?;
        let objects = match value {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        return Ok(objects);
    }

    if trimmed.starts_with('{') {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
            return Ok(vec![map]);
        }
    }

    let mut skipped = 0usize;
    let objects: Vec<Map<String, Value>> = trimmed
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(map)) => Some(map),
            _ => {
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        warn!(skipped, "Skipped JSON Lines entries that are not objects");
    }
    Ok(objects)
}

/// Flattens an object into dotted keys, preserving key order.
pub fn flatten(object: &Map<String, Value>) -> IndexMap<String, Option<String>> {
    let mut out = IndexMap::new();
    flatten_into(object, "", &mut out);
    out
}

fn flatten_into(
    object: &Map<String, Value>,
    prefix: &str,
    out: &mut IndexMap<String, Option<String>>,
) {
    for (key, value) in object {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}{NESTED_SEPARATOR}{key}")
        };

        match value {
            Value::Object(nested) => flatten_into(nested, &full_key, out),
            Value::Null => {
                out.insert(full_key, None);
            }
            Value::String(s) => {
                out.insert(full_key, Some(s.clone()));
            }
            // Arrays, numbers and booleans keep their JSON text
            other => {
                out.insert(full_key, Some(other.to_string()));
            }
        }
    }
}

/// Type of one flattened value, reading it back as JSON first.
fn infer_value_type(value: Option<&str>) -> ColumnType {
    let Some(raw) = value else {
        return ColumnType::Unknown;
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Bool(_)) => ColumnType::Boolean,
        Ok(Value::Number(n)) if n.is_i64() => ColumnType::Integer,
        Ok(Value::Number(_)) => ColumnType::Decimal,
        Ok(Value::Array(_)) | Ok(Value::Object(_)) => ColumnType::String,
        Ok(Value::String(_)) | Ok(Value::Null) | Err(_) => infer_type(Some(raw)),
    }
}

/// Sorted union of keys over the sample, typed by majority vote.
fn infer_schema(sample: &[Map<String, Value>]) -> DataSchema {
    let mut observed: IndexMap<String, (Vec<ColumnType>, bool)> = IndexMap::new();

    for object in sample {
        for (key, value) in flatten(object) {
            let entry = observed.entry(key).or_default();
            entry.0.push(infer_value_type(value.as_deref()));
            if value.is_none() {
                entry.1 = true;
            }
        }
    }

    observed.sort_keys();
    let columns = observed
        .into_iter()
        .map(|(key, (types, nullable))| ColumnInfo::new(key, most_common_type(types), nullable))
        .collect();
    DataSchema::new(columns)
}

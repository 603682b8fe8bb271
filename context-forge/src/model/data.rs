//! Rows and the parsed table they belong to.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::column::DataSchema;

/// One record: column name to optional value.
///
/// An absent key and a `None` value are both "no value", but they are kept
/// distinct from an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRow {
    values: IndexMap<String, Option<String>>,
}

impl DataRow {
    pub fn new(values: IndexMap<String, Option<String>>) -> Self {
        Self { values }
    }

    /// Value for `column`, or `None` when absent or null.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).and_then(|v| v.as_deref())
    }

    /// Whether the row carries the key at all, null or not.
    pub fn contains_key(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in the order of `columns`.
    pub fn to_value_list(&self, columns: &[&str]) -> Vec<Option<&str>> {
        columns.iter().map(|c| self.get(c)).collect()
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for DataRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.map(Into::into)))
                .collect(),
        }
    }
}

/// Output of a parser: schema plus a bounded preview of rows.
///
/// `rows.len() <= total_row_count`, and `is_sampled` holds exactly when rows
/// were left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedData {
    pub schema: DataSchema,
    pub rows: Vec<DataRow>,
    pub total_row_count: usize,
    pub is_sampled: bool,
}

impl ParsedData {
    /// Builds parsed data, deriving `is_sampled` from the counts.
    pub fn new(schema: DataSchema, rows: Vec<DataRow>, total_row_count: usize) -> Self {
        let total_row_count = total_row_count.max(rows.len());
        let is_sampled = rows.len() < total_row_count;
        Self {
            schema,
            rows,
            total_row_count,
            is_sampled,
        }
    }

    /// Number of rows actually held in memory.
    pub fn loaded_row_count(&self) -> usize {
        self.rows.len()
    }
}

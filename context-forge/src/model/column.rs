//! Column descriptors and the schema they form.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analyzers::inference;

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    String,
    Integer,
    Decimal,
    Boolean,
    Timestamp,
    Unknown,
}

impl ColumnType {
    /// Infers the type of a single raw value.
    ///
    /// Shorthand for [`inference::infer_type`].
    pub fn infer(value: Option<&str>) -> Self {
        inference::infer_type(value)
    }

    /// Name used when rendering schemas and statistics.
    pub fn display_name(&self) -> &'static str {
        match self {
            ColumnType::String => "String",
            ColumnType::Integer => "Integer",
            ColumnType::Decimal => "Decimal",
            ColumnType::Boolean => "Boolean",
            ColumnType::Timestamp => "Timestamp",
            ColumnType::Unknown => "Unknown",
        }
    }

    /// Whether statistics treat this column as numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Decimal)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A single column of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable,
        }
    }
}

/// Ordered list of columns. Order drives table rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSchema {
    columns: Vec<ColumnInfo>,
}

impl DataSchema {
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Compact one-line rendering: `a: Integer, b: String`.
    pub fn to_schema_string(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("{}: {}", c.name, c.column_type))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

//! Per-column statistics over a parsed table.
//!
//! Each schema column is summarised independently. Which summary a column
//! gets depends on its inferred type and, for textual columns, on how many
//! distinct values it holds:
//!
//! | Column type                      | Summary                                        |
//! |----------------------------------|------------------------------------------------|
//! | `Integer`, `Decimal`             | numeric, or text when nothing parses           |
//! | `Boolean`                        | categorical                                    |
//! | `String`, `Timestamp`, `Unknown` | categorical when few distinct values, else text |

use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::model::{
    CategoricalStats, ColumnStatistics, ColumnType, DataStatistics, NumericStats, ParsedData,
    StatisticsDetails, TextStats,
};

/// Distinct-value count at or below which a textual column is categorical.
pub const CATEGORICAL_THRESHOLD: usize = 20;
/// Number of `(value, count)` pairs kept for categorical columns.
pub const TOP_VALUES_LIMIT: usize = 10;

/// Computes [`DataStatistics`] from [`ParsedData`].
///
/// Stateless; one instance can be shared between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticsCalculator;

impl StatisticsCalculator {
    pub fn new() -> Self {
        Self
    }

    /// One statistics record per schema column, in schema order.
    ///
    /// `total_rows` is the true row count of the source while the per-column
    /// figures cover only the loaded rows.
    #[instrument(skip(self, data), fields(columns = data.schema.column_count(), rows = data.rows.len()))]
    pub fn calculate(&self, data: &ParsedData) -> DataStatistics {
        let column_stats = data
            .schema
            .columns()
            .iter()
            .map(|column| {
                let values: Vec<Option<&str>> =
                    data.rows.iter().map(|row| row.get(&column.name)).collect();
                self.column_statistics(&column.name, column.column_type, &values)
            })
            .collect();

        DataStatistics {
            total_rows: data.total_row_count,
            column_stats,
        }
    }

    /// Statistics for one column given its raw values, one per row.
    pub fn column_statistics(
        &self,
        name: &str,
        column_type: ColumnType,
        values: &[Option<&str>],
    ) -> ColumnStatistics {
        let non_null: Vec<&str> = values
            .iter()
            .flatten()
            .copied()
            .filter(|v| !v.trim().is_empty())
            .collect();
        let null_count = values.len() - non_null.len();

        let details = match column_type {
            ColumnType::Integer | ColumnType::Decimal => numeric_or_text(&non_null),
            ColumnType::Boolean => StatisticsDetails::Categorical(categorical(&non_null)),
            ColumnType::String | ColumnType::Timestamp | ColumnType::Unknown => {
                let counts = value_counts(&non_null);
                let unique = counts.len();
                if unique <= CATEGORICAL_THRESHOLD || unique <= non_null.len() / 2 {
                    StatisticsDetails::Categorical(top_values(counts))
                } else {
                    StatisticsDetails::Text(text(&non_null))
                }
            }
        };

        debug!(
            column = name,
            column_type = %column_type,
            non_null = non_null.len(),
            nulls = null_count,
            "Computed column statistics"
        );

        ColumnStatistics {
            name: name.to_string(),
            column_type,
            non_null_count: non_null.len(),
            null_count,
            details,
        }
    }
}

/// Numeric summary over the values that parse; text summary when none do.
fn numeric_or_text(values: &[&str]) -> StatisticsDetails {
    let numbers: Vec<f64> = values
        .iter()
        .filter_map(|v| v.trim().parse::<f64>().ok())
        .collect();

    if numbers.is_empty() {
        return StatisticsDetails::Text(text(values));
    }

    let sum: f64 = numbers.iter().sum();
    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    StatisticsDetails::Numeric(NumericStats {
        min,
        max,
        avg: sum / numbers.len() as f64,
        sum,
    })
}

/// Frequencies in first-occurrence order.
fn value_counts<'a>(values: &[&'a str]) -> IndexMap<&'a str, usize> {
    let mut counts = IndexMap::new();
    for value in values {
        *counts.entry(*value).or_insert(0) += 1;
    }
    counts
}

fn categorical(values: &[&str]) -> CategoricalStats {
    top_values(value_counts(values))
}

fn top_values(counts: IndexMap<&str, usize>) -> CategoricalStats {
    let unique_count = counts.len();
    let mut entries: Vec<(&str, usize)> = counts.into_iter().collect();
    // Stable: equal counts keep first-occurrence order
    entries.sort_by(|a, b| b.1.cmp(&a.1));

    CategoricalStats {
        unique_count,
        top_values: entries
            .into_iter()
            .take(TOP_VALUES_LIMIT)
            .map(|(value, count)| (value.to_string(), count))
            .collect(),
    }
}

fn text(values: &[&str]) -> TextStats {
    let lengths: Vec<usize> = values.iter().map(|v| v.chars().count()).collect();
    if lengths.is_empty() {
        return TextStats {
            avg_length: 0.0,
            min_length: 0,
            max_length: 0,
        };
    }

    TextStats {
        avg_length: lengths.iter().sum::<usize>() as f64 / lengths.len() as f64,
        min_length: lengths.iter().copied().min().unwrap_or(0),
        max_length: lengths.iter().copied().max().unwrap_or(0),
    }
}

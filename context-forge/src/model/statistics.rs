//! Per-column statistics and their prompt rendering.

use serde::{Deserialize, Serialize};

use super::column::ColumnType;

/// Number of top values shown per categorical column in summaries.
const SUMMARY_TOP_VALUES: usize = 5;

/// Statistics for a single column.
///
/// The header fields are shared by every kind of column; `details` carries
/// the branch chosen by the calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub name: String,
    pub column_type: ColumnType,
    pub non_null_count: usize,
    pub null_count: usize,
    pub details: StatisticsDetails,
}

/// Type-specific payload of [`ColumnStatistics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatisticsDetails {
    Numeric(NumericStats),
    Categorical(CategoricalStats),
    Text(TextStats),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub sum: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalStats {
    pub unique_count: usize,
    /// `(value, count)` sorted by count descending, at most ten entries.
    pub top_values: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStats {
    pub avg_length: f64,
    pub min_length: usize,
    pub max_length: usize,
}

impl ColumnStatistics {
    pub fn numeric(&self) -> Option<&NumericStats> {
        match &self.details {
            StatisticsDetails::Numeric(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn categorical(&self) -> Option<&CategoricalStats> {
        match &self.details {
            StatisticsDetails::Categorical(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&TextStats> {
        match &self.details {
            StatisticsDetails::Text(stats) => Some(stats),
            _ => None,
        }
    }
}

/// Statistics for a whole table, one entry per schema column in schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataStatistics {
    pub total_rows: usize,
    pub column_stats: Vec<ColumnStatistics>,
}

impl DataStatistics {
    /// Renders the summary block embedded in the statistics section of a context.
    pub fn to_summary_string(&self) -> String {
        let mut lines = vec![
            format!("Total rows: {}", self.total_rows),
            format!("Columns ({}):", self.column_stats.len()),
        ];

        for col in &self.column_stats {
            lines.push(format!("  {} ({}):", col.name, col.column_type));
            lines.push(format!("    - Non-null: {}/{}", col.non_null_count, self.total_rows));

            match &col.details {
                StatisticsDetails::Numeric(n) => {
                    lines.push(format!("    - Min: {}", format_number(n.min)));
                    lines.push(format!("    - Max: {}", format_number(n.max)));
                    lines.push(format!("    - Avg: {:.2}", n.avg));
                }
                StatisticsDetails::Categorical(c) => {
                    lines.push(format!("    - Unique values: {}", c.unique_count));
                    if !c.top_values.is_empty() {
                        let top = c
                            .top_values
                            .iter()
                            .take(SUMMARY_TOP_VALUES)
                            .map(|(value, count)| format!("{value}({count})"))
                            .collect::<Vec<_>>()
                            .join(", ");
                        lines.push(format!("    - Top values: {top}"));
                    }
                }
                StatisticsDetails::Text(t) => {
                    lines.push(format!("    - Avg length: {:.1}", t.avg_length));
                }
            }
        }

        lines.push(String::new());
        lines.join("\n")
    }
}

/// Whole numbers keep one decimal place so min/max read as measurements.
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

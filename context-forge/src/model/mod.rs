//! In-memory data model shared by the parsers, analyzers and context builder.
//!
//! Nothing here is mutated after construction: every stage produces a new
//! value from the previous one.

mod column;
mod context;
mod data;
mod file;
mod statistics;

pub use column::{ColumnInfo, ColumnType, DataSchema};
pub use context::{
    budget, AnalyticsContext, SamplingStrategy, ANALYTICS_SYSTEM_PROMPT, FULL_DATA_THRESHOLD,
    STATISTICAL_THRESHOLD,
};
pub use data::{DataRow, ParsedData};
pub use file::{DataFile, FileType};
pub use statistics::{
    CategoricalStats, ColumnStatistics, DataStatistics, NumericStats, StatisticsDetails,
    TextStats,
};

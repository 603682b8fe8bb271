//! Prelude for commonly used types and traits in context-forge.

pub use crate::analyzers::{DataSampler, StatisticsCalculator};
pub use crate::config::PipelineConfig;
pub use crate::context::{ContextBuilder, TokenBudgetManager};
pub use crate::error::{ForgeError, ParseError, Result};
pub use crate::logging::LogConfig;
pub use crate::model::{
    AnalyticsContext, ColumnInfo, ColumnType, DataFile, DataRow, DataSchema, DataStatistics,
    FileType, ParsedData, SamplingStrategy,
};
pub use crate::parsers::{FileParser, ParseEvent, ParseProgress, Parser, ProgressSink};
pub use crate::pipeline::{AnalysisModel, DataPipeline, ImportEvent, ImportStage};

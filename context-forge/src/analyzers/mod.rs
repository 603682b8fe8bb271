//! Analysis over parsed tables.
//!
//! - [`inference`]: value and column type detection
//! - [`statistics`]: per-column statistics over the loaded rows
//! - [`sampler`]: representative row selection for prompt context
//!
//! Everything here is synchronous and pure. The pipeline decides which
//! worker runs it.

pub mod inference;
pub mod sampler;
pub mod statistics;

pub use inference::{infer_type, most_common_type};
pub use sampler::DataSampler;
pub use statistics::StatisticsCalculator;

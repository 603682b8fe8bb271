//! Prompt-ready context and the policy used to sample data into it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Token budget allocation shared by the budget manager and the context
/// builder. The parts plus the buffer add up to the total.
pub mod budget {
    pub const TOTAL_TOKENS: usize = 3000;
    pub const SYSTEM_PROMPT_TOKENS: usize = 200;
    pub const SCHEMA_TOKENS: usize = 100;
    pub const STATISTICS_TOKENS: usize = 300;
    pub const DATA_SAMPLE_TOKENS: usize = 2000;
    pub const QUESTION_TOKENS: usize = 100;
    pub const BUFFER_TOKENS: usize = 300;
}

/// Row count below which every loaded row may be shown.
pub const FULL_DATA_THRESHOLD: usize = 500;
/// Row count below which a stratified sample of full size is shown.
pub const STATISTICAL_THRESHOLD: usize = 5000;

/// How much of the data the model gets to see, keyed by total row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SamplingStrategy {
    FullData,
    Statistical,
    Aggregated,
}

impl SamplingStrategy {
    pub fn for_row_count(count: usize) -> Self {
        if count < FULL_DATA_THRESHOLD {
            SamplingStrategy::FullData
        } else if count < STATISTICAL_THRESHOLD {
            SamplingStrategy::Statistical
        } else {
            SamplingStrategy::Aggregated
        }
    }

    /// Name as shown in the statistics block.
    pub fn name(&self) -> &'static str {
        match self {
            SamplingStrategy::FullData => "FULL_DATA",
            SamplingStrategy::Statistical => "STATISTICAL",
            SamplingStrategy::Aggregated => "AGGREGATED",
        }
    }
}

impl fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed instruction sent through the model's system channel.
pub const ANALYTICS_SYSTEM_PROMPT: &str = "You are a data analyst assistant.
Analyze data and answer questions based ONLY on the provided context.
Be concise and use specific numbers from the data.
If you cannot answer a question from the provided data, say so clearly.
Format numbers appropriately and highlight key insights.";

/// Context assembled for one `(data, statistics)` pair.
///
/// Every block is already truncated to its own share of the token budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsContext {
    pub system_prompt: String,
    pub schema_description: String,
    pub statistics_summary: String,
    pub data_sample: String,
    pub estimated_tokens: usize,
}

impl AnalyticsContext {
    /// Schema, statistics and sample as one document. The system prompt is
    /// not part of it.
    pub fn to_prompt_context(&self) -> String {
        let mut out = String::with_capacity(
            self.schema_description.len()
                + self.statistics_summary.len()
                + self.data_sample.len()
                + 64,
        );
        out.push_str("## Data Schema\n");
        out.push_str(&self.schema_description);
        out.push_str("\n\n");
        out.push_str("## Statistics\n");
        out.push_str(&self.statistics_summary);
        out.push_str("\n\n");
        out.push_str("## Data Sample\n");
        out.push_str(&self.data_sample);
        out.push('\n');
        out
    }
}

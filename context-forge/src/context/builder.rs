//! Assembles schema, statistics and a data sample into an [`AnalyticsContext`].

use tracing::{debug, instrument};

use super::budget::TokenBudgetManager;
use crate::analyzers::sampler::{DataSampler, DEFAULT_SAMPLE_SIZE};
use crate::model::budget::{
    DATA_SAMPLE_TOKENS, QUESTION_TOKENS, SCHEMA_TOKENS, STATISTICS_TOKENS, SYSTEM_PROMPT_TOKENS,
};
use crate::model::{
    AnalyticsContext, DataRow, DataSchema, DataStatistics, ParsedData, SamplingStrategy,
    ANALYTICS_SYSTEM_PROMPT,
};

/// Cell values longer than this are cut in the sample table.
pub const MAX_CELL_CHARS: usize = 50;
/// Separator dashes per column never exceed this.
const MAX_SEPARATOR_WIDTH: usize = 15;
const COLUMN_SEPARATOR: &str = " | ";

/// Placeholder rendered instead of an empty table.
pub const NO_DATA: &str = "No data available";

/// Builds prompt context within the fixed token budget.
///
/// Output is a pure function of the inputs: the same data and statistics
/// always produce byte-identical context.
#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder {
    budget: TokenBudgetManager,
    sampler: DataSampler,
    max_sample_rows: usize,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            budget: TokenBudgetManager::new(),
            sampler: DataSampler::new(),
            max_sample_rows: DEFAULT_SAMPLE_SIZE,
        }
    }

    pub fn with_sampler(mut self, sampler: DataSampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_max_sample_rows(mut self, rows: usize) -> Self {
        self.max_sample_rows = rows;
        self
    }

    /// Builds the context for `data`, including the statistics block when
    /// `statistics` is given.
    #[instrument(skip_all, fields(total_rows = data.total_row_count))]
    pub fn build_context(
        &self,
        data: &ParsedData,
        statistics: Option<&DataStatistics>,
    ) -> AnalyticsContext {
        let strategy = SamplingStrategy::for_row_count(data.total_row_count);

        let schema = self
            .budget
            .truncate_to_tokens(&schema_description(&data.schema), SCHEMA_TOKENS);
        let stats = self.budget.truncate_to_tokens(
            &statistics_summary(statistics, data.total_row_count, strategy),
            STATISTICS_TOKENS,
        );
        let rows = self.sampler.sample(data, self.max_sample_rows);
        let sample = self.budget.truncate_to_tokens(
            &data_sample(&data.schema, &rows, strategy),
            DATA_SAMPLE_TOKENS,
        );

        let estimated_tokens = self.budget.estimate_tokens(&schema)
            + self.budget.estimate_tokens(&stats)
            + self.budget.estimate_tokens(&sample)
            + SYSTEM_PROMPT_TOKENS
            + QUESTION_TOKENS;

        debug!(
            strategy = %strategy,
            sampled_rows = rows.len(),
            estimated_tokens,
            "Built analytics context"
        );

        AnalyticsContext {
            system_prompt: ANALYTICS_SYSTEM_PROMPT.to_string(),
            schema_description: schema,
            statistics_summary: stats,
            data_sample: sample,
            estimated_tokens,
        }
    }

    /// The per-turn user message: data context followed by the question.
    ///
    /// The system prompt is not part of it; it goes to the model separately.
    pub fn build_full_prompt(&self, context: &AnalyticsContext, question: &str) -> String {
        let mut out = String::new();
        out.push_str("=== DATA CONTEXT ===\n\n");
        out.push_str(&context.to_prompt_context());
        out.push('\n');
        out.push_str("=== USER QUESTION ===\n\n");
        out.push_str(question);
        out.push('\n');
        out
    }
}

fn schema_description(schema: &DataSchema) -> String {
    let mut out = String::new();
    out.push_str(&format!("Columns ({}):\n", schema.column_count()));
    for column in schema.columns() {
        let nullable = if column.nullable { ", nullable" } else { "" };
        out.push_str(&format!("- {}: {}{}\n", column.name, column.column_type, nullable));
    }
    out
}

fn statistics_summary(
    statistics: Option<&DataStatistics>,
    total_rows: usize,
    strategy: SamplingStrategy,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total rows: {total_rows}\nSampling: {strategy}\n"));
    if let Some(statistics) = statistics {
        out.push('\n');
        out.push_str(&statistics.to_summary_string());
    }
    out
}

fn data_sample(schema: &DataSchema, rows: &[&DataRow], strategy: SamplingStrategy) -> String {
    if rows.is_empty() {
        return NO_DATA.to_string();
    }

    let mut out = String::new();
    match strategy {
        SamplingStrategy::Aggregated => {
            out.push_str(&format!(
                "(Data too large for full sample, showing {} representative rows)\n\n",
                rows.len()
            ));
        }
        SamplingStrategy::Statistical => {
            out.push_str(&format!("(Sampled {} rows from dataset)\n\n", rows.len()));
        }
        SamplingStrategy::FullData => {}
    }

    let columns = schema.column_names();
    out.push_str(&columns.join(COLUMN_SEPARATOR));
    out.push('\n');
    let separator = columns
        .iter()
        .map(|name| "-".repeat(name.chars().count().min(MAX_SEPARATOR_WIDTH)))
        .collect::<Vec<_>>()
        .join(COLUMN_SEPARATOR);
    out.push_str(&separator);
    out.push('\n');

    for row in rows {
        let cells = columns
            .iter()
            .map(|column| cell(row.get(column).unwrap_or("")))
            .collect::<Vec<_>>()
            .join(COLUMN_SEPARATOR);
        out.push_str(&cells);
        out.push('\n');
    }
    out
}

fn cell(value: &str) -> String {
    if value.chars().count() > MAX_CELL_CHARS {
        let mut cut: String = value.chars().take(MAX_CELL_CHARS - 3).collect();
        cut.push_str("...");
        cut
    } else {
        value.to_string()
    }
}

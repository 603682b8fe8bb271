//! Property-based tests for truncation, sampling, delimiter detection and
//! statistics.
//!
//! Each block states an invariant that must hold for every generated input;
//! proptest shrinks any counterexample to a minimal table or string.

use proptest::prelude::*;

use context_forge::analyzers::inference::infer_type;
use context_forge::analyzers::{DataSampler, StatisticsCalculator};
use context_forge::context::{truncate_chars, TokenBudgetManager};
use context_forge::model::{
    ColumnType, DataRow, SamplingStrategy, FULL_DATA_THRESHOLD, STATISTICAL_THRESHOLD,
};
use context_forge::parsers::csv::{detect_delimiter, split_line, DELIMITERS};

fn numbered_rows(count: usize) -> Vec<DataRow> {
    (0..count)
        .map(|i| [("id", Some(i.to_string()))].into_iter().collect())
        .collect()
}

fn row_id(row: &DataRow) -> usize {
    row.get("id")
        .and_then(|v| v.parse().ok())
        .unwrap_or(usize::MAX)
}

// ============================================================================
// Token budget
// ============================================================================

proptest! {
    #[test]
    fn test_truncation_is_bounded_and_idempotent(text in "\\PC{0,300}", limit in 0usize..200) {
        let once = truncate_chars(&text, limit);
        prop_assert!(once.chars().count() <= limit);
        prop_assert_eq!(truncate_chars(&once, limit), once.clone());

        if text.chars().count() <= limit {
            prop_assert_eq!(once, text);
        } else if limit >= 3 {
            prop_assert!(once.ends_with("..."));
            let kept: String = text.chars().take(limit - 3).collect();
            prop_assert!(once.starts_with(&kept));
        }
    }

    #[test]
    fn test_token_estimate_floors_char_count(text in "\\PC{0,500}") {
        let budget = TokenBudgetManager::new();
        prop_assert_eq!(budget.estimate_tokens(&text), text.chars().count() / 4);
    }

    #[test]
    fn test_truncate_to_tokens_fits_estimate(text in "[a-z ]{0,2000}", tokens in 1usize..300) {
        let budget = TokenBudgetManager::new();
        let out = budget.truncate_to_tokens(&text, tokens);
        prop_assert!(budget.estimate_tokens(&out) <= tokens);
    }
}

// ============================================================================
// Sampling
// ============================================================================

proptest! {
    #[test]
    fn test_strategy_boundaries(rows in 0usize..20_000) {
        let expected = if rows < FULL_DATA_THRESHOLD {
            SamplingStrategy::FullData
        } else if rows < STATISTICAL_THRESHOLD {
            SamplingStrategy::Statistical
        } else {
            SamplingStrategy::Aggregated
        };
        prop_assert_eq!(SamplingStrategy::for_row_count(rows), expected);
    }

    #[test]
    fn test_stratified_sample_size_and_order(
        count in 0usize..400,
        size in 1usize..120,
        seed in any::<u64>()
    ) {
        let rows = numbered_rows(count);
        let sample = DataSampler::with_seed(seed).stratified(&rows, size);

        prop_assert_eq!(sample.len(), count.min(size));
        let ids: Vec<usize> = sample.iter().map(|r| row_id(r)).collect();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));

        if count > size {
            let head = size / 5;
            prop_assert!(ids.iter().take(head).copied().eq(0..head));
            if head > 0 {
                prop_assert_eq!(ids.last().copied(), Some(count - 1));
            }
        }
    }

    #[test]
    fn test_same_seed_same_sample(count in 0usize..300, seed in any::<u64>()) {
        let rows = numbered_rows(count);
        let ids = |sampler: DataSampler| -> Vec<usize> {
            sampler.stratified(&rows, 50).iter().map(|r| row_id(r)).collect()
        };
        prop_assert_eq!(ids(DataSampler::with_seed(seed)), ids(DataSampler::with_seed(seed)));
    }
}

// ============================================================================
// CSV delimiter detection
// ============================================================================

proptest! {
    #[test]
    fn test_delimiter_of_clean_header_is_detected(
        fields in prop::collection::vec("[a-z_][a-z0-9_]{0,8}", 2..10),
        which in 0usize..DELIMITERS.len()
    ) {
        let delimiter = DELIMITERS[which];
        let separator = delimiter.to_string();
        let header = fields.join(separator.as_str());

        prop_assert_eq!(detect_delimiter(&header), delimiter);
        prop_assert_eq!(split_line(&header, delimiter), fields);
    }
}

// ============================================================================
// Statistics and inference
// ============================================================================

proptest! {
    #[test]
    fn test_statistics_counts_cover_every_row(
        values in prop::collection::vec(prop::option::of("[ a-z0-9.]{0,6}"), 0..80),
        column_type in prop::sample::select(vec![
            ColumnType::Integer,
            ColumnType::Decimal,
            ColumnType::String,
            ColumnType::Boolean,
            ColumnType::Timestamp,
        ])
    ) {
        let refs: Vec<Option<&str>> = values.iter().map(|v| v.as_deref()).collect();
        let stats = StatisticsCalculator::new().column_statistics("c", column_type, &refs);

        prop_assert_eq!(stats.non_null_count + stats.null_count, values.len());
    }

    #[test]
    fn test_integers_infer_as_integer(n in any::<i64>()) {
        prop_assert_eq!(infer_type(Some(&n.to_string())), ColumnType::Integer);
    }

    #[test]
    fn test_padding_does_not_change_inferred_type(value in "[a-z0-9.:-]{1,12}") {
        let padded = format!("  {value}\t");
        prop_assert_eq!(infer_type(Some(&padded)), infer_type(Some(&value)));
    }
}

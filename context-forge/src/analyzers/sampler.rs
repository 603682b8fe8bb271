//! Row sampling for the data-sample block of a context.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use tracing::debug;

use crate::model::{DataRow, ParsedData, SamplingStrategy};

/// Default number of rows handed to the context builder.
pub const DEFAULT_SAMPLE_SIZE: usize = 100;
/// Upper bound on the sample for [`SamplingStrategy::Aggregated`] data.
pub const AGGREGATED_SAMPLE_SIZE: usize = 20;
/// Seed used unless a caller injects another one.
pub const DEFAULT_SEED: u64 = 42;

/// Picks a bounded, representative subset of the loaded rows.
///
/// The random part of a stratified sample is drawn from a generator seeded
/// per call, so identical input always yields identical output.
#[derive(Debug, Clone, Copy)]
pub struct DataSampler {
    seed: u64,
}

impl Default for DataSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSampler {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Strategy for a table of `row_count` rows.
    pub fn determine_strategy(&self, row_count: usize) -> SamplingStrategy {
        SamplingStrategy::for_row_count(row_count)
    }

    /// Samples at most `max_sample_size` rows, choosing the strategy from the
    /// table's total row count.
    pub fn sample<'a>(&self, data: &'a ParsedData, max_sample_size: usize) -> Vec<&'a DataRow> {
        let strategy = self.determine_strategy(data.total_row_count);
        let sampled: Vec<&DataRow> = match strategy {
            SamplingStrategy::FullData => data.rows.iter().take(max_sample_size).collect(),
            SamplingStrategy::Statistical => self.stratified(&data.rows, max_sample_size),
            SamplingStrategy::Aggregated => {
                self.stratified(&data.rows, AGGREGATED_SAMPLE_SIZE.min(max_sample_size))
            }
        };

        debug!(
            strategy = %strategy,
            loaded = data.rows.len(),
            sampled = sampled.len(),
            "Sampled rows"
        );
        sampled
    }

    /// Head, random middle, tail.
    ///
    /// A fifth of `size` comes from each end; the remainder is drawn without
    /// replacement from the rows strictly between them and kept in table
    /// order. Tables no larger than `size` are returned whole.
    pub fn stratified<'a>(&self, rows: &'a [DataRow], size: usize) -> Vec<&'a DataRow> {
        if rows.len() <= size {
            return rows.iter().collect();
        }

        let head = size / 5;
        let tail = size / 5;
        let middle_count = size - head - tail;
        let middle_start = head;
        let middle_end = rows.len() - tail;

        let mut result: Vec<&DataRow> = Vec::with_capacity(size);
        result.extend(&rows[..head]);

        if middle_end > middle_start {
            let middle = &rows[middle_start..middle_end];
            let mut rng = StdRng::seed_from_u64(self.seed);
            let amount = middle_count.min(middle.len());
            let mut picked = index::sample(&mut rng, middle.len(), amount).into_vec();
            picked.sort_unstable();
            result.extend(picked.into_iter().map(|i| &middle[i]));
        }

        result.extend(&rows[middle_end..]);
        result
    }
}

//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::analyzers::sampler::{DEFAULT_SAMPLE_SIZE, DEFAULT_SEED};
use crate::error::Result;
use crate::parsers::DEFAULT_MAX_ROWS;

/// Largest content accepted by an import, in bytes.
pub const DEFAULT_MAX_CONTENT_BYTES: usize = 6 * 1024 * 1024;

/// Events buffered between a parse worker and its consumer.
pub const DEFAULT_PROGRESS_CHANNEL_CAPACITY: usize = 16;

/// Settings for [`DataPipeline`](crate::pipeline::DataPipeline).
///
/// Missing fields in a config document take their defaults; unknown fields
/// are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Rows kept in memory per import
    pub max_preview_rows: usize,
    /// Imports larger than this fail before parsing
    pub max_content_bytes: usize,
    /// Rows shown in the data sample of a context
    pub max_sample_rows: usize,
    /// Seed for the sampler's random middle rows
    pub sampling_seed: u64,
    /// Bound on progress events buffered ahead of the consumer
    pub progress_channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_preview_rows: DEFAULT_MAX_ROWS,
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
            max_sample_rows: DEFAULT_SAMPLE_SIZE,
            sampling_seed: DEFAULT_SEED,
            progress_channel_capacity: DEFAULT_PROGRESS_CHANNEL_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Starts a builder from the defaults.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Loads a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn max_preview_rows(mut self, rows: usize) -> Self {
        self.config.max_preview_rows = rows;
        self
    }

    pub fn max_content_bytes(mut self, bytes: usize) -> Self {
        self.config.max_content_bytes = bytes;
        self
    }

    pub fn max_sample_rows(mut self, rows: usize) -> Self {
        self.config.max_sample_rows = rows;
        self
    }

    pub fn sampling_seed(mut self, seed: u64) -> Self {
        self.config.sampling_seed = seed;
        self
    }

    /// Values below 1 are raised to 1 when the channel is created.
    pub fn progress_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.progress_channel_capacity = capacity;
        self
    }

    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForgeError;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_preview_rows, 1000);
        assert_eq!(config.max_content_bytes, 6_291_456);
        assert_eq!(config.max_sample_rows, 100);
        assert_eq!(config.sampling_seed, 42);
        assert_eq!(config.progress_channel_capacity, 16);
    }

    #[test]
    fn test_builder() {
        let config = PipelineConfig::builder()
            .max_preview_rows(50)
            .sampling_seed(7)
            .build();
        assert_eq!(config.max_preview_rows, 50);
        assert_eq!(config.sampling_seed, 7);
        assert_eq!(config.max_sample_rows, 100);
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config = PipelineConfig::from_json_str(r#"{"max_sample_rows": 25}"#).unwrap();
        assert_eq!(config.max_sample_rows, 25);
        assert_eq!(config.max_preview_rows, 1000);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = PipelineConfig::from_json_str(r#"{"max_rows": 25}"#).unwrap_err();
        assert!(matches!(err, ForgeError::Serialization(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let config = PipelineConfig::builder().max_content_bytes(1024).build();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(PipelineConfig::from_json_str(&json).unwrap(), config);
    }
}

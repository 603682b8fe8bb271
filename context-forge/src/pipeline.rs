//! The caller-facing layer: import, statistics, context and analysis.
//!
//! A host drives one [`DataPipeline`] per session. Imports run on tokio
//! workers and are observed as an [`ImportStream`]; statistics run on a
//! blocking worker once a table exists; context building is synchronous.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use futures::StreamExt;
//! use context_forge::pipeline::{DataPipeline, ImportEvent};
//! use context_forge::config::PipelineConfig;
//!
//! # async fn run() -> context_forge::error::Result<()> {
//! let pipeline = DataPipeline::new(PipelineConfig::default());
//! let mut events = pipeline.import("sales.csv", "region,total\nnorth,10\n", None);
//!
//! while let Some(event) = events.next().await {
//!     if let ImportEvent::Success { data, .. } = event {
//!         let data = Arc::new(data);
//!         let stats = pipeline.compute_statistics(Arc::clone(&data)).await?;
//!         let context = pipeline.build_context(&data, Some(&stats));
//!         println!("{}", pipeline.build_full_prompt(&context, "Which region sold most?"));
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::analyzers::{DataSampler, StatisticsCalculator};
use crate::config::PipelineConfig;
use crate::context::ContextBuilder;
use crate::error::{ForgeError, ParseError, Result};
use crate::logging::{truncate_field, LogConfig};
use crate::model::{AnalyticsContext, DataFile, DataStatistics, FileType, ParsedData};
use crate::parsers::{parse_stream, ParseEvent, Parser};

/// Share of the import progress bar reserved for parsing.
const PARSING_START: f64 = 0.3;
const PARSING_SPAN: f64 = 0.5;

/// Phase of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStage {
    Reading,
    Parsing,
    Validating,
    Complete,
}

impl ImportStage {
    /// Progress fraction at which the stage starts.
    pub fn start_fraction(&self) -> f64 {
        match self {
            ImportStage::Reading => 0.1,
            ImportStage::Parsing => PARSING_START,
            ImportStage::Validating => 0.9,
            ImportStage::Complete => 1.0,
        }
    }

    /// Message shown when the stage starts.
    pub fn default_message(&self) -> &'static str {
        match self {
            ImportStage::Reading => "Reading file...",
            ImportStage::Parsing => "Parsing data...",
            ImportStage::Validating => "Validating data...",
            ImportStage::Complete => "Done",
        }
    }
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportStage::Reading => "READING",
            ImportStage::Parsing => "PARSING",
            ImportStage::Validating => "VALIDATING",
            ImportStage::Complete => "COMPLETE",
        };
        f.write_str(name)
    }
}

/// One item of an import's event sequence.
///
/// `Success` and `Error` are terminal.
#[derive(Debug)]
pub enum ImportEvent {
    Progress {
        stage: ImportStage,
        fraction: f64,
        message: String,
    },
    Success {
        file: DataFile,
        data: ParsedData,
    },
    Error(ForgeError),
}

impl ImportEvent {
    fn stage_start(stage: ImportStage) -> Self {
        ImportEvent::Progress {
            stage,
            fraction: stage.start_fraction(),
            message: stage.default_message().to_string(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ImportEvent::Progress { .. })
    }
}

/// Events of one import. Dropping it cancels the import.
#[derive(Debug)]
pub struct ImportStream {
    rx: mpsc::Receiver<ImportEvent>,
}

impl Stream for ImportStream {
    type Item = ImportEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// The external language-model collaborator.
///
/// The system prompt and the user message travel on separate channels and
/// must not be merged by the pipeline.
#[async_trait]
pub trait AnalysisModel: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String>;
}

/// Coordinates imports, statistics and context assembly.
#[derive(Debug, Clone)]
pub struct DataPipeline {
    config: PipelineConfig,
    log_config: LogConfig,
    calculator: StatisticsCalculator,
    builder: ContextBuilder,
}

impl DataPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let builder = ContextBuilder::new()
            .with_sampler(DataSampler::with_seed(config.sampling_seed))
            .with_max_sample_rows(config.max_sample_rows);
        Self {
            config,
            log_config: LogConfig::default(),
            calculator: StatisticsCalculator::new(),
            builder,
        }
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Imports `content` as the file `file_name`.
    ///
    /// The type is classified from the file name unless given. The stream
    /// reports `Reading`, `Parsing`, `Validating` and `Complete` progress and
    /// ends with exactly one `Success` or `Error`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn import(
        &self,
        file_name: &str,
        content: impl Into<Arc<str>>,
        file_type: Option<FileType>,
    ) -> ImportStream {
        let (tx, rx) = mpsc::channel(self.config.progress_channel_capacity.max(1));
        let job = ImportJob {
            file_name: file_name.to_string(),
            content: content.into(),
            file_type,
            config: self.config.clone(),
            log_config: self.log_config.clone(),
        };

        tokio::spawn(async move {
            let file_name = job.file_name.clone();
            match job.run(&tx).await {
                Ok(()) => {}
                Err(ForgeError::Cancelled) => debug!(file = %file_name, "Import abandoned by consumer"),
                Err(err) => {
                    warn!(file = %file_name, error = %err, "Import failed");
                    let _ = tx.send(ImportEvent::Error(err)).await;
                }
            }
        });

        ImportStream { rx }
    }

    /// Computes column statistics on a blocking worker.
    ///
    /// A panic on the worker is reported as [`ForgeError::Analysis`].
    #[instrument(skip_all, fields(rows = data.rows.len()))]
    pub async fn compute_statistics(&self, data: Arc<ParsedData>) -> Result<DataStatistics> {
        let calculator = self.calculator;
        tokio::task::spawn_blocking(move || calculator.calculate(&data))
            .await
            .map_err(|e| {
                if e.is_panic() {
                    ForgeError::analysis("statistics worker panicked")
                } else {
                    ForgeError::analysis(format!("statistics worker stopped: {e}"))
                }
            })
    }

    pub fn build_context(
        &self,
        data: &ParsedData,
        statistics: Option<&DataStatistics>,
    ) -> AnalyticsContext {
        let context = self.builder.build_context(data, statistics);
        crate::log_context_details!(
            self.log_config,
            schema_chars = context.schema_description.chars().count(),
            statistics_chars = context.statistics_summary.chars().count(),
            sample_chars = context.data_sample.chars().count(),
            estimated_tokens = context.estimated_tokens,
            "Context sizes"
        );
        context
    }

    pub fn build_full_prompt(&self, context: &AnalyticsContext, question: &str) -> String {
        self.builder.build_full_prompt(context, question)
    }

    /// Asks `model` a question about the data in `context`.
    #[instrument(skip_all)]
    pub async fn analyze(
        &self,
        model: &dyn AnalysisModel,
        context: &AnalyticsContext,
        question: &str,
    ) -> Result<String> {
        info!(
            question = %truncate_field(question, self.log_config.max_field_length),
            estimated_tokens = context.estimated_tokens,
            "Sending question to model"
        );

        let user_message = self.build_full_prompt(context, question);
        model.complete(&context.system_prompt, &user_message).await
    }
}

impl Default for DataPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

struct ImportJob {
    file_name: String,
    content: Arc<str>,
    file_type: Option<FileType>,
    config: PipelineConfig,
    log_config: LogConfig,
}

impl ImportJob {
    async fn run(self, tx: &mpsc::Sender<ImportEvent>) -> Result<()> {
        send(tx, ImportEvent::stage_start(ImportStage::Reading)).await?;

        let file_type = self
            .file_type
            .or_else(|| FileType::from_file_name(&self.file_name))
            .ok_or_else(|| ForgeError::unsupported(self.file_name.as_str()))?;

        let size = self.content.len();
        if size > self.config.max_content_bytes {
            return Err(ForgeError::ContentTooLarge {
                size,
                limit: self.config.max_content_bytes,
            });
        }

        send(tx, ImportEvent::stage_start(ImportStage::Parsing)).await?;

        let mut events = parse_stream(
            Parser::for_file_type(file_type),
            Arc::clone(&self.content),
            self.config.max_preview_rows,
            self.config.progress_channel_capacity,
        );

        while let Some(event) = events.next().await {
            match event {
                ParseEvent::Progress(progress) => {
                    crate::log_parse_progress!(
                        self.log_config,
                        parsed_rows = progress.parsed_rows,
                        total_rows = ?progress.total_rows,
                        "Parse progress"
                    );
                    let fraction =
                        PARSING_START + PARSING_SPAN * progress.fraction().unwrap_or(0.0);
                    let message = progress
                        .message
                        .unwrap_or_else(|| ImportStage::Parsing.default_message().to_string());
                    send(
                        tx,
                        ImportEvent::Progress {
                            stage: ImportStage::Parsing,
                            fraction,
                            message,
                        },
                    )
                    .await?;
                }
                ParseEvent::Success(data) => {
                    send(tx, ImportEvent::stage_start(ImportStage::Validating)).await?;
                    let file = DataFile::new(self.file_name.as_str(), file_type, size);
                    info!(
                        file = %file.name,
                        file_type = ?file_type,
                        rows = data.total_row_count,
                        loaded = data.loaded_row_count(),
                        "Import complete"
                    );
                    send(tx, ImportEvent::stage_start(ImportStage::Complete)).await?;
                    return send(tx, ImportEvent::Success { file, data }).await;
                }
                ParseEvent::Error(err) => return Err(err.into()),
            }
        }

        Err(ParseError::new("Parsing stopped unexpectedly").into())
    }
}

async fn send(tx: &mpsc::Sender<ImportEvent>, event: ImportEvent) -> Result<()> {
    tx.send(event).await.map_err(|_| ForgeError::Cancelled)
}

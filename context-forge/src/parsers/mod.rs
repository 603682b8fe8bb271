//! Format parsers turning raw text into [`ParsedData`].
//!
//! Every parser makes a single pass over memory-resident content and reports
//! progress to a [`ProgressSink`] at the start of each phase and after every
//! batch of [`PROGRESS_INTERVAL`] rows. The sink may stop the parse by
//! returning [`ControlFlow::Break`]; the parse then fails with
//! [`ParseError::cancelled`].
//!
//! Parsers are stateless. Their regex tables are compiled once per process
//! and shared.
//!
//! ## Selecting a parser
//!
//! ```rust
//! use context_forge::model::FileType;
//! use context_forge::parsers::{FileParser, Parser};
//!
//! let parser = Parser::for_file_type(FileType::Csv);
//! let data = parser.parse("id,name\n1,Ada\n2,Grace\n", 1000).unwrap();
//!
//! assert_eq!(data.total_row_count, 2);
//! assert_eq!(data.schema.column_names(), vec!["id", "name"]);
//! ```
//!
//! ## Observing events
//!
//! [`collect_events`] returns the same event sequence a streaming consumer
//! sees through [`parse_stream`].
//!
//! ```rust
//! use context_forge::parsers::{collect_events, CsvParser, ParseEvent};
//!
//! let events = collect_events(&CsvParser::new(), "a\n1\n", 1000);
//! assert!(matches!(events.first(), Some(ParseEvent::Progress(_))));
//! assert!(matches!(events.last(), Some(ParseEvent::Success(_))));
//! ```

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::model::{FileType, ParsedData};

pub mod csv;
pub mod json;
pub mod log;
mod stream;

pub use self::csv::CsvParser;
pub use self::json::JsonParser;
pub use self::log::{LogFormat, LogParser};
pub use self::stream::{parse_stream, spawn_parse, ParseStream, WorkerOutcome};

/// Default cap on rows held in memory for a preview.
pub const DEFAULT_MAX_ROWS: usize = 1000;
/// Rows processed between two progress reports.
pub const PROGRESS_INTERVAL: usize = 100;
/// Rows (or objects) inspected when inferring column types.
pub const INFERENCE_SAMPLE_SIZE: usize = 10;

/// Snapshot of parse progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseProgress {
    pub parsed_rows: usize,
    /// Unknown until the format has been detected.
    pub total_rows: Option<usize>,
    /// Set at phase boundaries, absent on per-batch reports.
    pub message: Option<String>,
}

impl ParseProgress {
    pub fn new(parsed_rows: usize, total_rows: Option<usize>, message: Option<&str>) -> Self {
        Self {
            parsed_rows,
            total_rows,
            message: message.map(str::to_string),
        }
    }

    /// Fraction of rows parsed, when the total is known and non-zero.
    pub fn fraction(&self) -> Option<f64> {
        match self.total_rows {
            Some(total) if total > 0 => Some((self.parsed_rows as f64 / total as f64).min(1.0)),
            _ => None,
        }
    }
}

/// One item of a parse's event sequence.
///
/// `Success` and `Error` are terminal: nothing follows them.
#[derive(Debug)]
pub enum ParseEvent {
    Progress(ParseProgress),
    Success(ParsedData),
    Error(ParseError),
}

impl ParseEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ParseEvent::Progress(_))
    }
}

impl From<Result<ParsedData, ParseError>> for ParseEvent {
    fn from(result: Result<ParsedData, ParseError>) -> Self {
        match result {
            Ok(data) => ParseEvent::Success(data),
            Err(err) => ParseEvent::Error(err),
        }
    }
}

/// Receives progress reports while a parse runs.
///
/// Returning [`ControlFlow::Break`] cancels the parse at this report.
pub trait ProgressSink {
    fn on_progress(&mut self, progress: ParseProgress) -> ControlFlow<()>;
}

impl<F> ProgressSink for F
where
    F: FnMut(ParseProgress) -> ControlFlow<()>,
{
    fn on_progress(&mut self, progress: ParseProgress) -> ControlFlow<()> {
        self(progress)
    }
}

/// Sink that ignores every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _progress: ParseProgress) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Wraps a sink and turns a `Break` into a cancellation error.
pub(crate) struct Reporter<'a> {
    sink: &'a mut dyn ProgressSink,
}

impl<'a> Reporter<'a> {
    pub(crate) fn new(sink: &'a mut dyn ProgressSink) -> Self {
        Self { sink }
    }

    /// Phase-boundary report carrying a message.
    pub(crate) fn phase(
        &mut self,
        parsed_rows: usize,
        total_rows: Option<usize>,
        message: &str,
    ) -> Result<(), ParseError> {
        self.send(ParseProgress::new(parsed_rows, total_rows, Some(message)))
    }

    /// Per-batch report, sent only when `processed` closes a full batch.
    pub(crate) fn rows(&mut self, processed: usize, total_rows: usize) -> Result<(), ParseError> {
        if processed % PROGRESS_INTERVAL == 0 {
            self.send(ParseProgress::new(processed, Some(total_rows), None))
        } else {
            Ok(())
        }
    }

    fn send(&mut self, progress: ParseProgress) -> Result<(), ParseError> {
        match self.sink.on_progress(progress) {
            ControlFlow::Continue(()) => Ok(()),
            ControlFlow::Break(()) => Err(ParseError::cancelled()),
        }
    }
}

/// A parser for one file format.
pub trait FileParser: Send + Sync {
    /// Format handled by this parser.
    fn file_type(&self) -> FileType;

    /// Parses `content`, keeping at most `max_rows` rows in memory, and
    /// reports progress to `sink`.
    fn parse_with(
        &self,
        content: &str,
        max_rows: usize,
        sink: &mut dyn ProgressSink,
    ) -> Result<ParsedData, ParseError>;

    /// Counts the rows a full parse would report, without building them.
    fn count_rows(&self, content: &str) -> usize;

    /// Parses without observing progress.
    fn parse(&self, content: &str, max_rows: usize) -> Result<ParsedData, ParseError> {
        self.parse_with(content, max_rows, &mut NoProgress)
    }
}

/// The closed set of supported parsers.
#[derive(Debug, Clone, Copy)]
pub enum Parser {
    Csv(CsvParser),
    Json(JsonParser),
    Log(LogParser),
}

impl Parser {
    pub fn for_file_type(file_type: FileType) -> Self {
        match file_type {
            FileType::Csv => Parser::Csv(CsvParser::new()),
            FileType::Json => Parser::Json(JsonParser::new()),
            FileType::Log => Parser::Log(LogParser::new()),
        }
    }

    /// Classifies `file_name` by extension and returns its parser.
    pub fn for_file_name(file_name: &str) -> Option<Self> {
        FileType::from_file_name(file_name).map(Self::for_file_type)
    }

    fn inner(&self) -> &dyn FileParser {
        match self {
            Parser::Csv(p) => p,
            Parser::Json(p) => p,
            Parser::Log(p) => p,
        }
    }
}

impl FileParser for Parser {
    fn file_type(&self) -> FileType {
        self.inner().file_type()
    }

    fn parse_with(
        &self,
        content: &str,
        max_rows: usize,
        sink: &mut dyn ProgressSink,
    ) -> Result<ParsedData, ParseError> {
        self.inner().parse_with(content, max_rows, sink)
    }

    fn count_rows(&self, content: &str) -> usize {
        self.inner().count_rows(content)
    }
}

/// Runs a parse to completion and returns every event in order, ending with
/// exactly one terminal event.
pub fn collect_events<P>(parser: &P, content: &str, max_rows: usize) -> Vec<ParseEvent>
where
    P: FileParser + ?Sized,
{
    let mut events = Vec::new();
    let result = {
        let mut sink = |progress: ParseProgress| {
            events.push(ParseEvent::Progress(progress));
            ControlFlow::Continue(())
        };
        parser.parse_with(content, max_rows, &mut sink)
    };
    events.push(result.into());
    events
}

/// Non-blank lines, in order.
pub(crate) fn non_blank_lines(content: &str) -> Vec<&str> {
    content.lines().filter(|l| !l.trim().is_empty()).collect()
}

//! Line-oriented log files.
//!
//! The format is detected once from the first lines and then applied to
//! every line. Supported layouts:
//!
//! - standard: `2024-01-15 10:30:00 INFO [Main] message`
//! - Apache/Nginx combined: `127.0.0.1 - - [15/Jan/2024:10:30:00 +0000] "GET / HTTP/1.1" 200 1234`
//! - simple: `[INFO] message` or `INFO: message`
//! - key-value: `level=INFO msg="disk full" code=7`
//!
//! Files that match none of them are read raw, one `line` column per row.
//! A line that does not fit the detected layout falls back to a raw row on
//! its own.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{non_blank_lines, FileParser, ProgressSink, Reporter, INFERENCE_SAMPLE_SIZE};
use crate::analyzers::inference::{infer_type, most_common_type};
use crate::error::ParseError;
use crate::model::{ColumnInfo, ColumnType, DataRow, DataSchema, FileType, ParsedData};

/// Column holding the raw text of lines read without a layout.
pub const RAW_LINE_COLUMN: &str = "line";

/// Key-value lines need at least this many pairs to count as that layout.
const MIN_KEY_VALUE_PAIRS: usize = 2;

struct LogPatterns {
    standard: Regex,
    apache: Regex,
    simple: Regex,
    key_value: Regex,
}

impl LogPatterns {
    // These patterns are compile-time constants and known to be valid
    #[allow(clippy::expect_used)]
    fn new() -> Self {
        Self {
            standard: Regex::new(
                r"^([0-9]{4}-[0-9]{2}-[0-9]{2}[T ]?[0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?(?:[+-][0-9]{2}:?[0-9]{2})?)\s+([A-Za-z0-9_]+)\s+\[?([^\]]+)\]?\s+(.*)$",
            )
            .expect("valid standard log pattern"),
            apache: Regex::new(
                r#"^(\S+)\s+(\S+)\s+(\S+)\s+\[([^\]]+)\]\s+"([^"]+)"\s+([0-9]+)\s+([0-9]+)(?:\s+"([^"]*)")?(?:\s+"([^"]*)")?$"#,
            )
            .expect("valid access log pattern"),
            simple: Regex::new(r"^(?:\[([A-Za-z0-9_]+)\]|([A-Za-z0-9_]+):)\s+(.*)$")
                .expect("valid simple log pattern"),
            key_value: Regex::new(r#"([A-Za-z0-9_]+)=(?:"([^"]*)"|(\S+))"#)
                .expect("valid key-value pattern"),
        }
    }
}

static PATTERNS: Lazy<LogPatterns> = Lazy::new(LogPatterns::new);

/// Layout detected for a log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogFormat {
    Standard,
    Apache,
    Simple,
    KeyValue,
    Raw,
}

impl LogFormat {
    /// Candidate layouts in tie-break order.
    pub const DETECTABLE: [LogFormat; 4] = [
        LogFormat::Standard,
        LogFormat::Apache,
        LogFormat::Simple,
        LogFormat::KeyValue,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LogFormat::Standard => "STANDARD",
            LogFormat::Apache => "APACHE",
            LogFormat::Simple => "SIMPLE",
            LogFormat::KeyValue => "KEY_VALUE",
            LogFormat::Raw => "RAW",
        }
    }

    /// Whether `line` fits this layout in full.
    pub fn matches(&self, line: &str) -> bool {
        match self {
            LogFormat::Standard => PATTERNS.standard.is_match(line),
            LogFormat::Apache => PATTERNS.apache.is_match(line),
            LogFormat::Simple => PATTERNS.simple.is_match(line),
            LogFormat::KeyValue => {
                PATTERNS.key_value.find_iter(line).take(MIN_KEY_VALUE_PAIRS).count()
                    >= MIN_KEY_VALUE_PAIRS
            }
            LogFormat::Raw => true,
        }
    }

    /// Picks the layout matching most sample lines.
    ///
    /// The winner must match more than a third of the sample, otherwise the
    /// file is read raw.
    pub fn detect(sample: &[&str]) -> Self {
        let mut best = (LogFormat::Raw, 0usize);
        for format in Self::DETECTABLE {
            let count = sample.iter().filter(|line| format.matches(line)).count();
            if count > best.1 {
                best = (format, count);
            }
        }

        if best.1 > sample.len() / 3 {
            best.0
        } else {
            LogFormat::Raw
        }
    }

    /// Splits one line into named fields.
    ///
    /// A line that does not fit falls back to a single raw column.
    pub fn parse_line(&self, line: &str) -> IndexMap<String, Option<String>> {
        let parsed = match self {
            LogFormat::Standard => parse_standard(line),
            LogFormat::Apache => parse_apache(line),
            LogFormat::Simple => parse_simple(line),
            LogFormat::KeyValue => parse_key_value(line),
            LogFormat::Raw => None,
        };
        parsed.unwrap_or_else(|| raw_line(line))
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn raw_line(line: &str) -> IndexMap<String, Option<String>> {
    IndexMap::from([(RAW_LINE_COLUMN.to_string(), Some(line.to_string()))])
}

fn field(name: &str, value: &str) -> (String, Option<String>) {
    (name.to_string(), Some(value.to_string()))
}

fn parse_standard(line: &str) -> Option<IndexMap<String, Option<String>>> {
    let caps = PATTERNS.standard.captures(line)?;
    Some(IndexMap::from([
        field("timestamp", &caps[1]),
        field("level", &caps[2].to_uppercase()),
        field("source", &caps[3]),
        field("message", &caps[4]),
    ]))
}

fn parse_apache(line: &str) -> Option<IndexMap<String, Option<String>>> {
    let caps = PATTERNS.apache.captures(line)?;
    let present = |i: usize| {
        caps.get(i)
            .map(|m| m.as_str())
            .filter(|v| !v.trim().is_empty() && *v != "-")
            .map(str::to_string)
    };

    let fields = [
        ("ip", Some(caps[1].to_string())),
        ("identity", present(2)),
        ("user", present(3)),
        ("timestamp", Some(caps[4].to_string())),
        ("request", Some(caps[5].to_string())),
        ("status", Some(caps[6].to_string())),
        ("size", Some(caps[7].to_string())),
        ("referer", present(8)),
        ("user_agent", present(9)),
    ];

    // Absent fields are left out of the row rather than stored as null
    Some(
        fields
            .into_iter()
            .filter(|(_, value)| value.is_some())
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    )
}

fn parse_simple(line: &str) -> Option<IndexMap<String, Option<String>>> {
    let caps = PATTERNS.simple.captures(line)?;
    let level = caps.get(1).or_else(|| caps.get(2))?.as_str().to_uppercase();
    Some(IndexMap::from([
        field("level", &level),
        field("message", &caps[3]),
    ]))
}

fn parse_key_value(line: &str) -> Option<IndexMap<String, Option<String>>> {
    let mut out = IndexMap::new();
    for caps in PATTERNS.key_value.captures_iter(line) {
        let value = caps
            .get(2)
            .filter(|m| !m.as_str().is_empty())
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        out.insert(caps[1].to_string(), Some(value.to_string()));
    }
    (!out.is_empty()).then_some(out)
}

/// Column type from the key name, falling back to the sampled values.
fn infer_column_type(key: &str, sample: &[&str]) -> ColumnType {
    let lower = key.to_lowercase();
    if lower.contains("time") || lower.contains("date") {
        return ColumnType::Timestamp;
    }
    match lower.as_str() {
        "level" => ColumnType::String,
        "status" | "code" | "size" | "bytes" | "count" => ColumnType::Integer,
        _ => most_common_type(sample.iter().map(|v| infer_type(Some(*v)))),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogParser;

impl LogParser {
    pub fn new() -> Self {
        Self
    }

    /// Layout that [`FileParser::parse`] would apply to `content`.
    pub fn detect_format(&self, content: &str) -> LogFormat {
        let lines = non_blank_lines(content);
        LogFormat::detect(&lines[..lines.len().min(INFERENCE_SAMPLE_SIZE)])
    }
}

impl FileParser for LogParser {
    fn file_type(&self) -> FileType {
        FileType::Log
    }

    #[instrument(skip(self, content, sink), fields(bytes = content.len()))]
    fn parse_with(
        &self,
        content: &str,
        max_rows: usize,
        sink: &mut dyn ProgressSink,
    ) -> Result<ParsedData, ParseError> {
        if content.trim().is_empty() {
            return Err(ParseError::new("File is empty"));
        }

        let lines = non_blank_lines(content);
        if lines.is_empty() {
            return Err(ParseError::new("No log lines found"));
        }

        let total_rows = lines.len();
        let mut reporter = Reporter::new(sink);
        reporter.phase(0, Some(total_rows), "Detecting log format...")?;

        let format = LogFormat::detect(&lines[..total_rows.min(INFERENCE_SAMPLE_SIZE)]);
        reporter.phase(
            0,
            Some(total_rows),
            &format!("Parsing with {format} format..."),
        )?;

        let rows_to_parse = max_rows.min(total_rows);
        let mut rows = Vec::with_capacity(rows_to_parse);
        let mut keys: IndexSet<String> = IndexSet::new();
        for (index, line) in lines.iter().take(rows_to_parse).enumerate() {
            let parsed = format.parse_line(line);
            if !parsed.is_empty() {
                keys.extend(parsed.keys().cloned());
                rows.push(DataRow::new(parsed));
            }
            reporter.rows(index + 1, total_rows)?;
        }

        if rows.is_empty() {
            return Err(ParseError::new("Could not parse any log lines"));
        }

        keys.sort();
        let sample = &rows[..rows.len().min(INFERENCE_SAMPLE_SIZE)];
        let columns = keys
            .into_iter()
            .map(|key| {
                let values: Vec<&str> = sample.iter().filter_map(|row| row.get(&key)).collect();
                let column_type = infer_column_type(&key, &values);
                ColumnInfo::new(key, column_type, true)
            })
            .collect();

        debug!(
            format = %format,
            total_rows,
            loaded = rows.len(),
            "Parsed log file"
        );

        Ok(ParsedData::new(DataSchema::new(columns), rows, total_rows))
    }

    /// Number of non-blank lines.
    fn count_rows(&self, content: &str) -> usize {
        non_blank_lines(content).len()
    }
}

//! Delimited text with a header row.
//!
//! The delimiter is detected from the header line among `,`, `;`, tab and
//! `|`. Fields may be wrapped in double quotes; inside quotes a delimiter is
//! ordinary text and `""` is a literal quote. Every field is trimmed after
//! unquoting.
//!
//! Rows with fewer fields than the header get `None` for the missing
//! columns; extra fields are dropped.

use tracing::{debug, instrument};

use super::{non_blank_lines, FileParser, ProgressSink, Reporter, INFERENCE_SAMPLE_SIZE};
use crate::analyzers::inference::{infer_type, most_common_type};
use crate::error::ParseError;
use crate::model::{ColumnInfo, DataRow, DataSchema, FileType, ParsedData};

/// Candidate delimiters, in tie-break order.
pub const DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvParser;

impl CsvParser {
    pub fn new() -> Self {
        Self
    }
}

impl FileParser for CsvParser {
    fn file_type(&self) -> FileType {
        FileType::Csv
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
        let Some((header_line, data_lines)) = lines.split_first() else {
            return Err(ParseError::new("No data lines found"));
        };

        let mut reporter = Reporter::new(sink);
        reporter.phase(0, Some(lines.len()), "Detecting delimiter...")?;

        let delimiter = detect_delimiter(header_line);
        let headers = split_line(header_line, delimiter);
        if headers.is_empty() {
            return Err(ParseError::new("Could not parse header row"));
        }

        let total_rows = data_lines.len();
        reporter.phase(0, Some(total_rows), "Parsing rows...")?;

        let rows_to_parse = max_rows.min(total_rows);
        let mut rows = Vec::with_capacity(rows_to_parse);
        for (index, line) in data_lines.iter().take(rows_to_parse).enumerate() {
            let mut fields = split_line(line, delimiter).into_iter();
            let row: DataRow = headers
                .iter()
                .map(|header| (header.as_str(), fields.next()))
                .collect();
            rows.push(row);

            reporter.rows(index + 1, total_rows)?;
        }

        let schema = infer_schema(&headers, &rows[..rows.len().min(INFERENCE_SAMPLE_SIZE)]);

        debug!(
            delimiter = ?delimiter,
            columns = headers.len(),
            total_rows,
            loaded = rows.len(),
            "Parsed CSV"
        );

        Ok(ParsedData::new(schema, rows, total_rows))
    }

    /// Non-blank lines minus the header, never below zero.
    fn count_rows(&self, content: &str) -> usize {
        non_blank_lines(content).len().saturating_sub(1)
    }
}

/// Delimiter occurring most often in `header_line`.
///
/// Ties go to the earlier entry of [`DELIMITERS`]; `,` when none occurs.
pub fn detect_delimiter(header_line: &str) -> char {
    let mut best = (',', 0usize);
    for delimiter in DELIMITERS {
        let count = header_line.chars().filter(|c| *c == delimiter).count();
        if count > best.1 {
            best = (delimiter, count);
        }
    }
    best.0
}

/// Splits one line into trimmed, unquoted fields.
///
/// Never returns an empty list: an empty line is one empty field.
pub fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if !in_quotes => in_quotes = true,
            '"' => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            c if c == delimiter && !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            c => current.push(c),
        }
    }

    fields.push(current.trim().to_string());
    fields
}

/// Majority-vote type per header over the sample rows.
fn infer_schema(headers: &[String], sample: &[DataRow]) -> DataSchema {
    let columns = headers
        .iter()
        .map(|header| {
            let column_type = most_common_type(
                sample
                    .iter()
                    .filter_map(|row| row.get(header))
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| infer_type(Some(v))),
            );
            let nullable = sample
                .iter()
                .any(|row| row.get(header).map_or(true, |v| v.trim().is_empty()));
            ColumnInfo::new(header.clone(), column_type, nullable)
        })
        .collect();
    DataSchema::new(columns)
}

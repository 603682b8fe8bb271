//! Integration tests for the format parsers on realistic file content.

use std::ops::ControlFlow;

use context_forge::model::{ColumnType, FileType};
use context_forge::parsers::log::RAW_LINE_COLUMN;
use context_forge::parsers::{
    collect_events, CsvParser, FileParser, JsonParser, LogFormat, LogParser, ParseEvent,
    ParseProgress, Parser,
};

fn column_type(parser: &dyn FileParser, content: &str, column: &str) -> Option<ColumnType> {
    parser
        .parse(content, 1000)
        .ok()
        .and_then(|data| data.schema.column(column).map(|c| c.column_type))
}

#[test]
fn test_semicolon_export_with_quotes_and_gaps() {
    let content = "\
order_id;customer;amount;paid;created
1001;\"Doe; John\";19.99;true;2024-03-01 09:15:00
1002;Ada;5;false;2024-03-01T10:00:00
1003;;42.5;true
";
    let data = CsvParser::new().parse(content, 1000).unwrap();

    assert_eq!(data.total_row_count, 3);
    assert_eq!(data.rows[0].get("customer"), Some("Doe; John"));
    assert_eq!(data.rows[2].get("customer"), Some(""));
    assert_eq!(data.rows[2].get("created"), None);

    let schema = &data.schema;
    assert_eq!(schema.column("order_id").map(|c| c.column_type), Some(ColumnType::Integer));
    assert_eq!(schema.column("amount").map(|c| c.column_type), Some(ColumnType::Decimal));
    assert_eq!(schema.column("paid").map(|c| c.column_type), Some(ColumnType::Boolean));
    assert_eq!(schema.column("created").map(|c| c.column_type), Some(ColumnType::Timestamp));
    assert!(schema.column("customer").map_or(false, |c| c.nullable));
    assert!(schema.column("created").map_or(false, |c| c.nullable));
    assert!(!schema.column("order_id").map_or(true, |c| c.nullable));
}

#[test]
fn test_preview_cap_keeps_true_total() {
    let mut content = String::from("id\tscore\n");
    for i in 0..2500 {
        content.push_str(&format!("{i}\t{}\n", i % 7));
    }

    let data = CsvParser::new().parse(&content, 1000).unwrap();
    assert_eq!(data.rows.len(), 1000);
    assert_eq!(data.total_row_count, 2500);
    assert!(data.is_sampled);
    assert_eq!(CsvParser::new().count_rows(&content), 2500);
}

#[test]
fn test_json_lines_skip_broken_entries() {
    let content = r#"{"event":"login","user":{"id":7,"name":"ada"},"ok":true}
{"event":"logout","user":{"id":8,"name":null},"ok":false}
{not json}
[1, 2, 3]
{"event":"login","user":{"id":9,"name":"lin"},"ok":true}
"#;
    let data = JsonParser::new().parse(content, 1000).unwrap();

    assert_eq!(data.total_row_count, 3);
    assert_eq!(
        data.schema.column_names(),
        vec!["event", "ok", "user.id", "user.name"]
    );
    assert_eq!(data.rows[1].get("user.name"), None);
    assert!(data.schema.column("user.name").map_or(false, |c| c.nullable));
    assert_eq!(
        data.schema.column("user.id").map(|c| c.column_type),
        Some(ColumnType::Integer)
    );
    assert_eq!(
        data.schema.column("ok").map(|c| c.column_type),
        Some(ColumnType::Boolean)
    );
}

#[test]
fn test_json_array_without_objects_fails() {
    let err = JsonParser::new().parse("[1, 2, 3]", 1000).unwrap_err();
    assert_eq!(err.message(), "No JSON objects found");

    let err = JsonParser::new().parse("[{\"a\": 1},", 1000).unwrap_err();
    assert_eq!(err.message(), "No JSON objects found");
    assert!(err.cause().is_some());
}

#[test]
fn test_json_decimal_and_mixed_columns() {
    assert_eq!(
        column_type(&JsonParser::new(), r#"[{"p":1.5},{"p":2.25}]"#, "p"),
        Some(ColumnType::Decimal)
    );
    assert_eq!(
        column_type(&JsonParser::new(), r#"[{"d":"2024-01-15"},{"d":"2024-02-01"}]"#, "d"),
        Some(ColumnType::Timestamp)
    );
}

#[test]
fn test_mixed_log_degrades_line_by_line() {
    let content = "\
2024-05-02 08:00:01 INFO [http] listening on :8080
2024-05-02 08:00:02 WARN [db] slow query took 1200ms
2024-05-02 08:00:03 ERROR [db] connection reset
panic: something odd
2024-05-02 08:00:04 INFO [http] GET /health 200
";
    let parser = LogParser::new();
    assert_eq!(parser.detect_format(content), LogFormat::Standard);

    let data = parser.parse(content, 1000).unwrap();
    assert_eq!(data.total_row_count, 5);
    assert_eq!(data.rows[3].get(RAW_LINE_COLUMN), Some("panic: something odd"));
    assert_eq!(data.rows[2].get("level"), Some("ERROR"));
    assert_eq!(
        data.schema.column_names(),
        vec!["level", "line", "message", "source", "timestamp"]
    );
}

#[test]
fn test_parser_selection_by_file_name() {
    let cases = [
        ("metrics.CSV", FileType::Csv),
        ("events.jsonl", FileType::Json),
        ("dump.ndjson", FileType::Json),
        ("server.log", FileType::Log),
        ("notes.txt", FileType::Log),
    ];
    for (name, expected) in cases {
        let parser = Parser::for_file_name(name).unwrap();
        assert_eq!(parser.file_type(), expected, "{name}");
    }
    assert!(Parser::for_file_name("archive.tar.gz").is_none());
    assert!(Parser::for_file_name("Makefile").is_none());
}

#[test]
fn test_count_rows_matches_full_parse() {
    let inputs = [
        (FileType::Csv, "a,b\n1,2\n\n3,4\n"),
        (FileType::Json, "{\"a\":1}\n{\"a\":2}\nnope\n"),
        (FileType::Log, "one\n\ntwo\nthree\n"),
    ];
    for (file_type, content) in inputs {
        let parser = Parser::for_file_type(file_type);
        let data = parser.parse(content, 1000).unwrap();
        assert_eq!(parser.count_rows(content), data.total_row_count, "{file_type:?}");
    }
}

#[test]
fn test_event_sequence_has_one_terminal_at_the_end() {
    let mut content = String::from("x\n");
    for i in 0..350 {
        content.push_str(&format!("{i}\n"));
    }

    for file_type in FileType::ALL {
        let events = collect_events(&Parser::for_file_type(file_type), &content, 1000);
        let terminal = events.iter().filter(|e| e.is_terminal()).count();
        assert_eq!(terminal, 1, "{file_type:?}");
        assert!(events.last().map_or(false, ParseEvent::is_terminal));
    }
}

#[test]
fn test_progress_batches_and_phase_messages() {
    let mut content = String::from("n\n");
    for i in 0..250 {
        content.push_str(&format!("{i}\n"));
    }

    let events = collect_events(&CsvParser::new(), &content, 1000);
    let progress: Vec<&ParseProgress> = events
        .iter()
        .filter_map(|e| match e {
            ParseEvent::Progress(p) => Some(p),
            _ => None,
        })
        .collect();

    let messages: Vec<&str> = progress.iter().filter_map(|p| p.message.as_deref()).collect();
    assert_eq!(messages, vec!["Detecting delimiter...", "Parsing rows..."]);

    let batches: Vec<usize> = progress
        .iter()
        .filter(|p| p.message.is_none())
        .map(|p| p.parsed_rows)
        .collect();
    assert_eq!(batches, vec![100, 200]);
}

#[test]
fn test_sink_can_cancel_between_batches() {
    let mut content = String::from("n\n");
    for i in 0..1000 {
        content.push_str(&format!("{i}\n"));
    }

    let mut reports = 0;
    let mut sink = |progress: ParseProgress| {
        reports += 1;
        if progress.parsed_rows >= 300 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    };

    let err = CsvParser::new()
        .parse_with(&content, 1000, &mut sink)
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(reports, 5);
}

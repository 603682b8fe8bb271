//! File type classification and import metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Formats the crate knows how to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    Json,
    Log,
}

impl FileType {
    pub const ALL: [FileType; 3] = [FileType::Csv, FileType::Json, FileType::Log];

    /// Canonical extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            FileType::Csv => "csv",
            FileType::Json => "json",
            FileType::Log => "log",
        }
    }

    pub fn mime_types(&self) -> &'static [&'static str] {
        match self {
            FileType::Csv => &["text/csv", "text/comma-separated-values", "application/csv"],
            FileType::Json => &["application/json", "text/json", "application/x-ndjson"],
            FileType::Log => &["text/plain", "text/x-log", "application/octet-stream"],
        }
    }

    /// Case-insensitive extension lookup.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Some(FileType::Csv),
            "json" | "jsonl" | "ndjson" => Some(FileType::Json),
            "log" | "txt" => Some(FileType::Log),
            _ => None,
        }
    }

    /// Classifies by the text after the last `.`; names without a dot have no type.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        file_name
            .rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
    }

    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ft| {
            ft.mime_types()
                .iter()
                .any(|m| m.eq_ignore_ascii_case(mime_type))
        })
    }
}

/// Metadata describing one successful import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFile {
    pub name: String,
    pub file_type: FileType,
    pub size_bytes: usize,
    pub loaded_at: DateTime<Utc>,
}

impl DataFile {
    pub fn new(name: impl Into<String>, file_type: FileType, size_bytes: usize) -> Self {
        Self {
            name: name.into(),
            file_type,
            size_bytes,
            loaded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(FileType::from_extension("CSV"), Some(FileType::Csv));
        assert_eq!(FileType::from_extension("jsonl"), Some(FileType::Json));
        assert_eq!(FileType::from_extension("txt"), Some(FileType::Log));
        assert_eq!(FileType::from_extension("xlsx"), None);
    }

    #[test]
    fn test_classify_by_file_name() {
        assert_eq!(FileType::from_file_name("sales.2024.csv"), Some(FileType::Csv));
        assert_eq!(FileType::from_file_name("events.JSON"), Some(FileType::Json));
        assert_eq!(FileType::from_file_name("server.log"), Some(FileType::Log));
        assert_eq!(FileType::from_file_name("README"), None);
    }

    #[test]
    fn test_classify_by_mime_type() {
        assert_eq!(FileType::from_mime_type("Text/CSV"), Some(FileType::Csv));
        assert_eq!(FileType::from_mime_type("application/json"), Some(FileType::Json));
        assert_eq!(FileType::from_mime_type("text/plain"), Some(FileType::Log));
        assert_eq!(FileType::from_mime_type("image/png"), None);
    }

    #[test]
    fn test_data_file_records_size() {
        let file = DataFile::new("a.csv", FileType::Csv, 42);
        assert_eq!(file.size_bytes, 42);
        assert_eq!(file.file_type.extension(), "csv");
    }
}

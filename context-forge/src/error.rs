//! Error types for the ingestion and context pipeline.
//!
//! Parsers report terminal failures through [`ParseError`], which carries the
//! human-readable message a host shows verbatim. Everything above the parsers
//! (the import pipeline, statistics workers, model collaborators) reports
//! through [`ForgeError`].

use std::error::Error as StdError;

use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, ForgeError>;

/// Boxed cause attached to a [`ParseError`].
pub type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// Terminal failure of a single parse.
///
/// Per-record problems never produce one of these; they are recovered inside
/// the parser. A `ParseError` means the whole input was rejected.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ParseError {
    message: String,
    #[source]
    cause: Option<BoxedCause>,
}

impl ParseError {
    /// Message used when a progress consumer stops the parse.
    pub const CANCELLED: &'static str = "Parsing cancelled";

    /// Creates an error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Creates an error with a message and the underlying cause.
    pub fn with_cause(message: impl Into<String>, cause: impl Into<BoxedCause>) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// Error reported when the consumer cancelled the parse between batches.
    pub fn cancelled() -> Self {
        Self::new(Self::CANCELLED)
    }

    /// The message to surface to users.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The underlying cause, if one was recorded.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Whether this error came from cancellation rather than bad input.
    pub fn is_cancelled(&self) -> bool {
        self.cause.is_none() && self.message == Self::CANCELLED
    }
}

/// Errors surfaced by the caller-facing layer.
#[derive(Error, Debug)]
pub enum ForgeError {
    /// The input was rejected by its parser.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Content exceeded the configured size cap.
    #[error("Content too large: {size} bytes (limit {limit} bytes)")]
    ContentTooLarge { size: usize, limit: usize },

    /// No parser is registered for the file.
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Statistics computation failed on its worker.
    #[error("Analysis failed: {0}")]
    Analysis(String),

    /// The language-model collaborator failed.
    #[error("Model error: {0}")]
    Model(String),

    /// The operation was cancelled by its consumer.
    #[error("Operation cancelled")]
    Cancelled,

    /// I/O error while reading a model file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration document could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ForgeError {
    /// Creates an analysis error with the given message.
    pub fn analysis(msg: impl Into<String>) -> Self {
        Self::Analysis(msg.into())
    }

    /// Creates a model error with the given message.
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Creates an unsupported file type error.
    pub fn unsupported(name: impl Into<String>) -> Self {
        Self::UnsupportedFileType(name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message_is_displayed_verbatim() {
        let err = ParseError::new("No JSON objects found");
        assert_eq!(err.to_string(), "No JSON objects found");
        assert!(err.cause().is_none());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_parse_error_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad bytes");
        let err = ParseError::with_cause("Failed to parse CSV", io);
        assert_eq!(err.message(), "Failed to parse CSV");
        assert_eq!(err.cause().map(|c| c.to_string()).as_deref(), Some("bad bytes"));
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn test_cancelled_parse_error() {
        let err = ParseError::cancelled();
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "Parsing cancelled");
    }

    #[test]
    fn test_forge_error_wraps_parse_error_transparently() {
        let err: ForgeError = ParseError::new("File is empty").into();
        assert_eq!(err.to_string(), "File is empty");

        let err = ForgeError::ContentTooLarge {
            size: 10,
            limit: 5,
        };
        assert_eq!(err.to_string(), "Content too large: 10 bytes (limit 5 bytes)");
        assert_eq!(
            ForgeError::analysis("boom").to_string(),
            "Analysis failed: boom"
        );
    }
}

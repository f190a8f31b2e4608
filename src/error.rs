//! Error types for the cleaner.
//!
//! Configuration and table problems are raised while a [`Cleaner`](crate::Cleaner)
//! is being built; nothing in the per-unit correction path returns an error.
//! Unit-level failures carry the document identifier and structural index so a
//! caller can resume a partially written document.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CleanerError>;

#[derive(Debug, Error)]
pub enum CleanerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("pattern rule '{rule}' does not compile: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid {table} table: {message}")]
    InvalidTable { table: &'static str, message: String },

    #[error("unit {index} of '{document}': {message}")]
    Unit {
        document: String,
        index: usize,
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CleanerError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn table<S: Into<String>>(table: &'static str, message: S) -> Self {
        Self::InvalidTable {
            table,
            message: message.into(),
        }
    }

    pub fn unit<D: Into<String>, S: Into<String>>(document: D, index: usize, message: S) -> Self {
        Self::Unit {
            document: document.into(),
            index,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CleanerError = io_err.into();
        assert!(matches!(err, CleanerError::Io(_)));
        assert!(err.to_string().starts_with("IO error"));
    }

    #[test]
    fn test_unit_error_carries_position() {
        let err = CleanerError::unit("part-1.txt", 42, "write rejected");
        assert_eq!(err.to_string(), "unit 42 of 'part-1.txt': write rejected");
    }

    #[test]
    fn test_invalid_pattern_keeps_source() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = CleanerError::InvalidPattern {
            rule: "custom".to_string(),
            source,
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}

//! Application error types and their fatal/recoverable classification.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Application-level errors for Vulnscope.
#[derive(Error, Debug)]
pub enum AppError {
    // Neo4j errors
    #[error("Neo4j connection error: {0}")]
    Connection(#[from] neo4rs::Error),

    #[error("Neo4j query error: {message}")]
    Query { message: String, query: String },

    // Store errors
    #[error("Vector index '{0}' does not exist. Run ingestion first.")]
    IndexMissing(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    // Source errors
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    // Model service errors
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Whether this error must abort an ingestion run.
    ///
    /// Parse, read and generation failures are scoped to one file or one
    /// topic. Everything else leaves the corpus unusable.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            AppError::Parse { .. } | AppError::Io { .. } | AppError::Generation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_errors_are_recoverable() {
        let err = AppError::Parse {
            path: "a.py".to_string(),
            message: "syntax error".to_string(),
        };
        assert!(!err.is_fatal());
        assert!(!AppError::Generation("boom".to_string()).is_fatal());
    }

    #[test]
    fn test_embedding_and_store_errors_are_fatal() {
        assert!(AppError::Embedding("down".to_string()).is_fatal());
        assert!(AppError::IndexMissing("code_index".to_string()).is_fatal());
        assert!(AppError::DimensionMismatch {
            expected: 768,
            actual: 384
        }
        .is_fatal());
    }
}

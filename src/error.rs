//! Error types for the relevance evaluator.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Errors that can occur during evaluation.
#[derive(Error, Debug)]
pub enum EvalError {
    /// A query result failed structural validation.
    #[error("Invalid input for query '{query_id}': {reason}")]
    InvalidInput { query_id: String, reason: String },

    /// A query has no entry in the judgment set (strict mode only).
    #[error("No relevance judgments for query '{0}'")]
    MissingJudgment(String),

    /// Two approach reports cover different query id sets.
    #[error(
        "Mismatched query sets: {} only in approach A, {} only in approach B",
        display_ids(.only_a),
        display_ids(.only_b)
    )]
    MismatchedQuerySet {
        only_a: Vec<String>,
        only_b: Vec<String>,
    },

    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A saved report file does not exist.
    #[error("Report file not found at '{0}'")]
    ReportNotFound(PathBuf),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EvalError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid-input error for a query.
    pub fn invalid_input(query_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            query_id: query_id.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(err: serde_json::Error) -> Self {
        EvalError::Serialization(err.to_string())
    }
}

fn display_ids(ids: &[String]) -> String {
    if ids.is_empty() {
        "none".to_string()
    } else {
        format!("[{}]", ids.join(", "))
    }
}

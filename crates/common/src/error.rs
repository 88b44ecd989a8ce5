//! Error types for the dynamic fields engine

use thiserror::Error;

/// Result type alias using the engine Error
pub type Result<T> = std::result::Result<T, Error>;

/// Dynamic fields engine error types
///
/// Every variant is locally recoverable: the store is never left partially
/// mutated when one of these is returned.
#[derive(Error, Debug)]
pub enum Error {
    /// Import text is not valid JSON, or its top level is not an array.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A deferred expression failed to evaluate.
    #[error("Evaluation error in '{expression}': {reason}")]
    Evaluation { expression: String, reason: String },

    #[error("Resource not found: {kind} with id {id}")]
    NotFound { kind: String, id: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn evaluation(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Evaluation {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    pub fn entity_not_found(id: impl Into<String>) -> Self {
        Error::NotFound {
            kind: "entity".to_string(),
            id: id.into(),
        }
    }

    /// Whether the error is a user-facing parse failure of an import document
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse(_))
    }
}

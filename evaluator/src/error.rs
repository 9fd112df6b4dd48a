//! Error types for ontology loading, caching and scoring

use crate::ontology::obo::OboParseError;

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur while loading the vocabulary or scoring predictions
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvalError {
    #[error("Malformed ontology source at line {line}: {message}")]
    MalformedSource { line: usize, message: String },

    #[error("Invalid evaluation mode: {0} (expected \"full\" or \"partial\")")]
    InvalidMode(String),

    #[error("Unknown namespace: {0}")]
    UnknownNamespace(String),

    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Invalid ancestor closure: {0}")]
    InvalidClosure(String),

    #[error("Ancestor cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input at line {line}: {message}")]
    Input { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for EvalError {
    fn from(e: std::io::Error) -> Self {
        EvalError::Io(e.to_string())
    }
}

impl From<OboParseError> for EvalError {
    fn from(e: OboParseError) -> Self {
        EvalError::MalformedSource {
            line: e.line(),
            message: e.to_string(),
        }
    }
}

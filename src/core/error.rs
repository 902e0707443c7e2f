//! Error types for the linear SVM implementation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SVMError {
    /// Malformed data, mismatched lengths or bad hyperparameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation the model cannot perform, e.g. probabilities from a hinge-loss model
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SVMError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SVMError>;

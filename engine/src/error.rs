//! Error types for the Tandem engine.

use thiserror::Error;

/// All possible errors from the Tandem engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Sanitization errors
    #[error("serialization error at {path}: {reason}")]
    Serialization { path: String, reason: String },

    // Envelope errors
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("unsupported document version: {found} (supported: {supported})")]
    UnsupportedVersion { found: String, supported: String },

    #[error("unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("invalid local value for '{dataset}': {reason}")]
    InvalidLocalValue { dataset: String, reason: String },
}

impl Error {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Serialization { .. } => "serialization",
            Error::InvalidDocument(_) => "invalid-document",
            Error::UnsupportedVersion { .. } => "unsupported-version",
            Error::UnknownDataset(_) => "unknown-dataset",
            Error::InvalidLocalValue { .. } => "invalid-local-value",
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

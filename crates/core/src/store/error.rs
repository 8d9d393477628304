//! Structure store error types.

use thiserror::Error;

/// Structure store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage provider configuration error.
    #[error("store configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("store operation failed: {0}")]
    Operation(String),

    /// Document could not be encoded or decoded.
    #[error("structure document serialization failed: {0}")]
    Serialization(String),

    /// A persisted record does not describe a valid line.
    #[error("invalid record for line {line_id}: {reason}")]
    InvalidRecord {
        /// Line the record belongs to.
        line_id: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl StoreError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Create an invalid record error.
    #[must_use]
    pub fn invalid_record(line_id: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            line_id: line_id.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the error code for user-facing reports.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "STORE_CONFIGURATION",
            Self::Operation(_) => "STORE_OPERATION_FAILED",
            Self::Serialization(_) => "STORE_SERIALIZATION",
            Self::InvalidRecord { .. } => "STORE_INVALID_RECORD",
        }
    }
}

impl From<opendal::Error> for StoreError {
    fn from(err: opendal::Error) -> Self {
        Self::Operation(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

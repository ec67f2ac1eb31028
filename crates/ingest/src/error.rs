//! Ingestion Error Types

use crate::source::FetchError;
use record_validator::ValidationError;
use storage::StorageError;
use thiserror::Error;

/// Errors that end an invocation
#[derive(Debug, Error)]
pub enum IngestError {
    /// Event carried no notifications
    #[error("Invalid event structure: no records found")]
    NoNotifications,

    /// Event or one of its notifications has the wrong shape
    #[error("Invalid event structure: {0}")]
    InvalidEvent(String),

    /// Required configuration could not be resolved
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Object content failed validation
    #[error("Invalid content in s3://{bucket}/{key}: {source}")]
    Validation {
        bucket: String,
        key: String,
        #[source]
        source: ValidationError,
    },

    /// Object could not be fetched
    #[error("Failed to fetch s3://{bucket}/{key}: {source}")]
    Fetch {
        bucket: String,
        key: String,
        #[source]
        source: FetchError,
    },

    /// Records could not be persisted
    #[error("Failed to persist records from s3://{bucket}/{key}: {source}")]
    Storage {
        bucket: String,
        key: String,
        #[source]
        source: StorageError,
    },
}

impl IngestError {
    /// Whether the caller sent something unusable (as opposed to a dependency failing)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IngestError::NoNotifications
                | IngestError::InvalidEvent(_)
                | IngestError::Validation { .. }
        )
    }

    /// HTTP-style status code reported for this error
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }

    /// Client-visible message; details stay in the logs
    pub fn public_message(&self) -> String {
        match self {
            IngestError::NoNotifications | IngestError::InvalidEvent(_) => self.to_string(),
            IngestError::Validation {
                source: ValidationError::Malformed(_),
                ..
            } => "Invalid JSON format in S3 object".to_string(),
            IngestError::Validation { .. } => {
                "Invalid health_data format: expected a list".to_string()
            }
            IngestError::Fetch { .. }
            | IngestError::Storage {
                source: StorageError::Unavailable(_) | StorageError::Conversion(_),
                ..
            } => "AWS service call failed".to_string(),
            IngestError::Configuration(_)
            | IngestError::Storage {
                source: StorageError::Configuration(_),
                ..
            } => "Internal server error".to_string(),
        }
    }
}

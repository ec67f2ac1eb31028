//! Validation Error Types

use thiserror::Error;

/// Errors raised while turning raw object content into telemetry records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Content is not well-formed JSON
    #[error("Malformed input: {0}")]
    Malformed(String),

    /// Top-level value is not a list
    #[error("Expected a list of records, found {found}")]
    NotAList { found: &'static str },

    /// A list element is not a mapping
    #[error("Record at index {index} is {found}, expected a mapping")]
    RecordNotMapping { index: usize, found: &'static str },
}

impl ValidationError {
    /// Whether the content parsed but had the wrong shape
    pub fn is_schema(&self) -> bool {
        !matches!(self, ValidationError::Malformed(_))
    }
}

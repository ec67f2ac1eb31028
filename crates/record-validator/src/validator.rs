//! Record Validator for Raw Object Content

use crate::error::ValidationError;
use crate::record::TelemetryRecord;
use serde_json::Value;
use tracing::debug;

/// Parses raw object bytes into telemetry records.
///
/// Only the shape is checked: the document must be a JSON list whose
/// elements are all mappings. Field types are not validated here.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Parse content into records, preserving their order
    pub fn parse(&self, content: &[u8]) -> Result<Vec<TelemetryRecord>, ValidationError> {
        let document: Value = serde_json::from_slice(content)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;

        let items = match document {
            Value::Array(items) => items,
            other => {
                return Err(ValidationError::NotAList {
                    found: kind_of(&other),
                })
            }
        };

        let records = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(map) => Ok(TelemetryRecord::from_document(map)),
                other => Err(ValidationError::RecordNotMapping {
                    index,
                    found: kind_of(&other),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Parsed {} telemetry records", records.len());
        Ok(records)
    }
}

/// Parse content with a default validator
pub fn parse_records(content: &[u8]) -> Result<Vec<TelemetryRecord>, ValidationError> {
    Validator::new().parse(content)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

//! Telemetry Record Type

use bigdecimal::BigDecimal;
use serde_json::{Map, Number, Value};
use std::str::FromStr;
use tracing::warn;

/// Device identity field
pub const PRODUCT_ID: &str = "productId";
/// Battery level field (fraction, 0..1)
pub const BATTERY_LEVEL: &str = "batteryLevel";
/// Temperature field (degrees)
pub const TEMPERATURE: &str = "temperature";

/// One device health reading as submitted.
///
/// The three well-known fields are lifted into typed slots when they carry
/// the expected JSON type. Anything else, including a well-known field with
/// an unexpected type, stays in `extra` untouched so the stored item matches
/// what the device sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryRecord {
    pub product_id: Option<String>,
    pub battery_level: Option<BigDecimal>,
    pub temperature: Option<BigDecimal>,
    pub extra: Map<String, Value>,
}

impl TelemetryRecord {
    /// Build a record from one parsed JSON mapping
    pub fn from_document(document: Map<String, Value>) -> Self {
        let mut record = Self::default();

        for (field, value) in document {
            let value = match (field.as_str(), value) {
                (PRODUCT_ID, Value::String(id)) => {
                    record.product_id = Some(id);
                    continue;
                }
                (BATTERY_LEVEL, Value::Number(n)) => match decimal_from_number(&n) {
                    Some(level) => {
                        record.battery_level = Some(level);
                        continue;
                    }
                    None => Value::Number(n),
                },
                (TEMPERATURE, Value::Number(n)) => match decimal_from_number(&n) {
                    Some(temp) => {
                        record.temperature = Some(temp);
                        continue;
                    }
                    None => Value::Number(n),
                },
                (_, value) => value,
            };

            if matches!(field.as_str(), BATTERY_LEVEL | TEMPERATURE) {
                warn!(field = %field, "Value not usable as a decimal reading, kept verbatim");
            }
            record.extra.insert(field, value);
        }

        record
    }

    /// Render the record back into a JSON mapping, typed fields included
    pub fn to_document(&self) -> Map<String, Value> {
        let mut document = self.extra.clone();
        if let Some(id) = &self.product_id {
            document.insert(PRODUCT_ID.to_string(), Value::String(id.clone()));
        }
        if let Some(level) = &self.battery_level {
            document.insert(BATTERY_LEVEL.to_string(), decimal_to_value(level));
        }
        if let Some(temp) = &self.temperature {
            document.insert(TEMPERATURE.to_string(), decimal_to_value(temp));
        }
        document
    }

    /// Number of top-level fields the record carries
    pub fn field_count(&self) -> usize {
        self.extra.len()
            + usize::from(self.product_id.is_some())
            + usize::from(self.battery_level.is_some())
            + usize::from(self.temperature.is_some())
    }
}

/// Convert a JSON number to an exact decimal.
///
/// Relies on serde_json's `arbitrary_precision` feature so the number still
/// holds its source text; no binary float is involved and neither magnitude
/// nor precision is bounded.
pub fn decimal_from_number(number: &Number) -> Option<BigDecimal> {
    BigDecimal::from_str(&number.to_string()).ok()
}

fn decimal_to_value(value: &BigDecimal) -> Value {
    let text = value.to_string();
    match Number::from_str(&text) {
        Ok(n) => Value::Number(n),
        Err(_) => Value::String(text),
    }
}

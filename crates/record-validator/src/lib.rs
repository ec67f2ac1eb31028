//! Telemetry Record Validation and Normalization
//!
//! Parses raw object content into typed telemetry records, keeping every
//! numeric value in exact decimal form, and derives the defaulted reading
//! used for anomaly evaluation.

mod error;
mod normalizer;
mod record;
mod validator;

pub use error::ValidationError;
pub use normalizer::{NormalizedReading, UNKNOWN_PRODUCT};
pub use record::{decimal_from_number, TelemetryRecord, BATTERY_LEVEL, PRODUCT_ID, TEMPERATURE};
pub use validator::{parse_records, Validator};

pub use bigdecimal::BigDecimal;

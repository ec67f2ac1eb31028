//! Record Normalization
//!
//! Applies the field defaults once, in one place, so that persistence,
//! evaluation, and alert formatting all agree on what a missing field means.

use crate::record::TelemetryRecord;
use bigdecimal::BigDecimal;

/// Product id used when a record carries none
pub const UNKNOWN_PRODUCT: &str = "Unknown";

/// Battery level assumed when absent (full charge, never anomalous)
fn default_battery_level() -> BigDecimal {
    BigDecimal::from(1)
}

/// Temperature assumed when absent (never anomalous)
fn default_temperature() -> BigDecimal {
    BigDecimal::from(0)
}

/// Fully-defaulted view of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedReading {
    pub product_id: String,
    pub battery_level: BigDecimal,
    pub temperature: BigDecimal,
}

impl TelemetryRecord {
    /// Produce the defaulted reading for this record
    pub fn normalize(&self) -> NormalizedReading {
        NormalizedReading {
            product_id: self
                .product_id
                .clone()
                .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
            battery_level: self
                .battery_level
                .clone()
                .unwrap_or_else(default_battery_level),
            temperature: self.temperature.clone().unwrap_or_else(default_temperature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_defaults_applied() {
        let reading = TelemetryRecord::default().normalize();
        assert_eq!(reading.product_id, "Unknown");
        assert_eq!(reading.battery_level, BigDecimal::from(1));
        assert_eq!(reading.temperature, BigDecimal::from(0));
    }

    #[test]
    fn test_present_values_kept() {
        let record = TelemetryRecord {
            product_id: Some("p7".to_string()),
            battery_level: Some(BigDecimal::from_str("0.05").unwrap()),
            temperature: Some(BigDecimal::from(55)),
            ..Default::default()
        };

        let reading = record.normalize();
        assert_eq!(reading.product_id, "p7");
        assert_eq!(reading.battery_level.to_string(), "0.05");
        assert_eq!(reading.temperature, BigDecimal::from(55));
    }
}

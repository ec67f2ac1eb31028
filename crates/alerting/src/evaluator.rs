//! Anomaly Evaluator

use record_validator::{BigDecimal, NormalizedReading, TelemetryRecord};

/// Safety thresholds for a reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnomalyThresholds {
    /// Battery levels strictly below this are anomalous (default: 0.1)
    pub battery_floor: BigDecimal,
    /// Temperatures strictly above this are anomalous (default: 50)
    pub temperature_ceiling: BigDecimal,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            battery_floor: BigDecimal::new(1.into(), 1),
            temperature_ceiling: BigDecimal::from(50),
        }
    }
}

/// Pure predicate over one reading; no I/O
#[derive(Debug, Clone, Default)]
pub struct AnomalyEvaluator {
    thresholds: AnomalyThresholds,
}

impl AnomalyEvaluator {
    /// Create an evaluator with given thresholds
    pub fn new(thresholds: AnomalyThresholds) -> Self {
        Self { thresholds }
    }

    /// True iff the battery is below the floor or the temperature above the ceiling
    pub fn is_anomalous(&self, reading: &NormalizedReading) -> bool {
        reading.battery_level < self.thresholds.battery_floor
            || reading.temperature > self.thresholds.temperature_ceiling
    }

    /// Evaluate a record after applying its defaults
    pub fn evaluate(&self, record: &TelemetryRecord) -> bool {
        self.is_anomalous(&record.normalize())
    }
}

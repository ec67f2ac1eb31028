//! Pipeline configuration

use crate::error::IngestError;
use config::{Config, Environment};
use serde::Deserialize;
use storage::DEFAULT_BATCH_SIZE;

/// Default low-water mark for the remaining time budget (ms)
pub const DEFAULT_TIME_BUDGET_FLOOR_MS: u64 = 10_000;

fn default_time_budget_floor_ms() -> u64 {
    DEFAULT_TIME_BUDGET_FLOOR_MS
}

fn default_write_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Raw settings as read from the environment
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Target table (`HEALTH_METRICS_TABLE`)
    #[serde(default)]
    pub health_metrics_table: Option<String>,
    /// Alert topic address (`ALERT_TOPIC_ARN`)
    #[serde(default)]
    pub alert_topic_arn: Option<String>,
    /// Stop taking new notifications below this much remaining time (`TIME_BUDGET_FLOOR_MS`)
    #[serde(default = "default_time_budget_floor_ms")]
    pub time_budget_floor_ms: u64,
    /// Records per store write (`WRITE_BATCH_SIZE`)
    #[serde(default = "default_write_batch_size")]
    pub write_batch_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            health_metrics_table: None,
            alert_topic_arn: None,
            time_budget_floor_ms: DEFAULT_TIME_BUDGET_FLOOR_MS,
            write_batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Settings with every required value present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub table_name: String,
    pub alert_topic_arn: String,
    pub time_budget_floor_ms: u64,
    pub write_batch_size: usize,
}

impl Settings {
    /// Load settings from process environment variables
    pub fn from_env() -> Result<Self, IngestError> {
        Self::from_source(Environment::default().try_parsing(true))
    }

    /// Load settings from any `config` source
    pub fn from_source<S>(source: S) -> Result<Self, IngestError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(source)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| IngestError::Configuration(e.to_string()))
    }

    /// Resolve the required values; empty strings count as missing
    pub fn resolve(&self) -> Result<PipelineConfig, IngestError> {
        let table_name = required(&self.health_metrics_table, "HEALTH_METRICS_TABLE")?;
        let alert_topic_arn = required(&self.alert_topic_arn, "ALERT_TOPIC_ARN")?;

        Ok(PipelineConfig {
            table_name,
            alert_topic_arn,
            time_budget_floor_ms: self.time_budget_floor_ms,
            write_batch_size: self.write_batch_size,
        })
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String, IngestError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| IngestError::Configuration(format!("{} must be set", name)))
}

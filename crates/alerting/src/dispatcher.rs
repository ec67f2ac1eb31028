//! Alert Dispatcher

use crate::notifier::Notifier;
use metrics::counter;
use record_validator::{TelemetryRecord, BATTERY_LEVEL, PRODUCT_ID, TEMPERATURE, UNKNOWN_PRODUCT};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

const NOT_AVAILABLE: &str = "N/A";

/// Sends one notification per flagged record. Delivery is best-effort.
#[derive(Clone)]
pub struct AlertDispatcher {
    notifier: Arc<dyn Notifier>,
    channel: String,
}

impl AlertDispatcher {
    /// Create a dispatcher publishing to `channel`
    pub fn new(notifier: Arc<dyn Notifier>, channel: impl Into<String>) -> Self {
        Self {
            notifier,
            channel: channel.into(),
        }
    }

    /// Channel address alerts are sent to
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Send an alert for `record`.
    ///
    /// Returns whether the message was delivered. A delivery failure is
    /// logged and swallowed.
    pub async fn dispatch(&self, record: &TelemetryRecord) -> bool {
        let product = product_label(record);
        let message = format_alert(record);

        match self.notifier.publish(&self.channel, &message).await {
            Ok(()) => {
                counter!("telemetry_alerts_sent_total").increment(1);
                info!(product_id = %product, "Alert sent for product {}", product);
                true
            }
            Err(e) => {
                counter!("telemetry_alerts_failed_total").increment(1);
                error!(
                    product_id = %product,
                    channel = %self.channel,
                    "Error publishing alert: {}",
                    e
                );
                false
            }
        }
    }
}

/// Human-readable alert text for a record, using the submitted values.
///
/// Placeholders stand in only for fields the record does not carry at all;
/// a field with an unexpected type is shown as sent.
pub fn format_alert(record: &TelemetryRecord) -> String {
    let product = product_label(record);
    let battery = match &record.battery_level {
        Some(level) => level.to_string(),
        None => raw_field(record, BATTERY_LEVEL).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    };
    let temperature = match &record.temperature {
        Some(temp) => temp.to_string(),
        None => raw_field(record, TEMPERATURE).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    };

    format!(
        "Alert for product {}: Battery level: {}, Temperature: {}",
        product, battery, temperature
    )
}

fn product_label(record: &TelemetryRecord) -> String {
    match &record.product_id {
        Some(id) => id.clone(),
        None => raw_field(record, PRODUCT_ID).unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
    }
}

/// Text of a well-known field kept verbatim because of its type
fn raw_field(record: &TelemetryRecord, field: &str) -> Option<String> {
    record.extra.get(field).map(|value| match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::MemoryNotifier;
    use record_validator::{parse_records, BigDecimal};
    use std::str::FromStr;

    fn flagged() -> TelemetryRecord {
        TelemetryRecord {
            product_id: Some("p1".to_string()),
            battery_level: Some(BigDecimal::from_str("0.05").unwrap()),
            temperature: Some(BigDecimal::from(55)),
            ..Default::default()
        }
    }

    #[test]
    fn test_message_format() {
        assert_eq!(
            format_alert(&flagged()),
            "Alert for product p1: Battery level: 0.05, Temperature: 55"
        );
    }

    #[test]
    fn test_message_placeholders() {
        assert_eq!(
            format_alert(&TelemetryRecord::default()),
            "Alert for product Unknown: Battery level: N/A, Temperature: N/A"
        );
    }

    #[test]
    fn test_message_shows_mistyped_values() {
        let records = parse_records(br#"[{"productId":42,"batteryLevel":"low"}]"#).unwrap();
        assert_eq!(
            format_alert(&records[0]),
            "Alert for product 42: Battery level: low, Temperature: N/A"
        );
    }

    #[test]
    fn test_message_shows_wide_values() {
        let records = parse_records(br#"[{"productId":"p9","temperature":1e30}]"#).unwrap();
        let message = format_alert(&records[0]);
        assert!(message.starts_with("Alert for product p9: Battery level: N/A, Temperature: "));
        assert!(!message.ends_with("N/A"));
    }

    #[tokio::test]
    async fn test_dispatch_publishes_to_channel() {
        let notifier = Arc::new(MemoryNotifier::new());
        let dispatcher =
            AlertDispatcher::new(notifier.clone(), "arn:aws:sns:eu-west-1:123:alerts");

        assert!(dispatcher.dispatch(&flagged()).await);

        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].channel, "arn:aws:sns:eu-west-1:123:alerts");
        assert!(messages[0].text.contains("p1"));
    }

    #[tokio::test]
    async fn test_delivery_failure_swallowed() {
        let notifier = Arc::new(MemoryNotifier::new());
        notifier.set_failing(true);
        let dispatcher = AlertDispatcher::new(notifier.clone(), "topic");

        assert!(!dispatcher.dispatch(&flagged()).await);
        assert_eq!(notifier.attempts(), 1);
    }
}

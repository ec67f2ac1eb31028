//! DynamoDB-backed key-value store

use crate::store::KeyValueStore;
use crate::StorageError;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use aws_smithy_types::error::display::DisplayErrorContext;
use record_validator::TelemetryRecord;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Largest number of items a single BatchWriteItem request accepts
pub const MAX_BATCH_ITEMS: usize = 25;

/// Attempts per chunk before unprocessed items are reported as a failure
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Initial delay between resubmissions of unprocessed items
const BASE_BACKOFF_MS: u64 = 50;

/// DynamoDB table writer
#[derive(Debug, Clone)]
pub struct DynamoStore {
    client: Client,
}

impl DynamoStore {
    /// Wrap an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from shared AWS configuration
    pub fn from_sdk_config(config: &SdkConfig) -> Self {
        Self::new(Client::new(config))
    }

    /// Submit one chunk, resubmitting unprocessed items with backoff
    async fn write_chunk(
        &self,
        table: &str,
        requests: Vec<WriteRequest>,
    ) -> Result<(), StorageError> {
        submit_until_processed(table, requests, DEFAULT_MAX_ATTEMPTS, |pending| {
            let request = self.client.batch_write_item().request_items(table, pending);
            async move {
                let output = request
                    .send()
                    .await
                    .map_err(|e| StorageError::Unavailable(DisplayErrorContext(&e).to_string()))?;

                let unprocessed = output
                    .unprocessed_items()
                    .and_then(|items| items.get(table))
                    .cloned()
                    .unwrap_or_default();
                Ok::<_, StorageError>(unprocessed)
            }
        })
        .await
    }
}

/// Drive `submit` until it reports nothing unprocessed.
///
/// `submit` sends a batch and returns the items the service left
/// unprocessed. Those are resubmitted after an exponential backoff, for at
/// most `max_attempts` submissions in total. A request error ends the loop
/// immediately.
async fn submit_until_processed<T, F, Fut>(
    table: &str,
    mut pending: Vec<T>,
    max_attempts: u32,
    mut submit: F,
) -> Result<(), StorageError>
where
    F: FnMut(Vec<T>) -> Fut,
    Fut: Future<Output = Result<Vec<T>, StorageError>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;
        let unprocessed = submit(pending).await?;

        if unprocessed.is_empty() {
            return Ok(());
        }

        if attempt >= max_attempts {
            return Err(StorageError::Unavailable(format!(
                "{} items left unprocessed in {} after {} attempts",
                unprocessed.len(),
                table,
                attempt
            )));
        }

        let delay = backoff_delay(attempt);
        warn!(
            table,
            unprocessed = unprocessed.len(),
            attempt,
            "Resubmitting unprocessed items after {:?}",
            delay
        );
        tokio::time::sleep(delay).await;
        pending = unprocessed;
    }
}

/// Delay before resubmission number `attempt` (1-based), doubling each time
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(factor))
}

#[async_trait]
impl KeyValueStore for DynamoStore {
    async fn batch_write(
        &self,
        table: &str,
        records: &[TelemetryRecord],
    ) -> Result<usize, StorageError> {
        let mut accepted = 0;

        for chunk in records.chunks(MAX_BATCH_ITEMS) {
            let requests = chunk
                .iter()
                .map(|record| {
                    let put = PutRequest::builder()
                        .set_item(Some(record_to_item(record)))
                        .build()
                        .map_err(|e| StorageError::Conversion(e.to_string()))?;
                    Ok(WriteRequest::builder().put_request(put).build())
                })
                .collect::<Result<Vec<_>, StorageError>>()?;

            self.write_chunk(table, requests).await?;
            accepted += chunk.len();
            debug!(table, items = chunk.len(), "BatchWriteItem chunk accepted");
        }

        Ok(accepted)
    }
}

/// Convert a record into a DynamoDB item.
///
/// Numbers travel as `N` attributes holding their exact decimal text.
pub fn record_to_item(record: &TelemetryRecord) -> HashMap<String, AttributeValue> {
    record
        .to_document()
        .into_iter()
        .map(|(field, value)| (field, value_to_attribute(value)))
        .collect()
}

/// Convert a DynamoDB item back into a record
pub fn item_to_record(
    item: &HashMap<String, AttributeValue>,
) -> Result<TelemetryRecord, StorageError> {
    let document = item
        .iter()
        .map(|(field, attr)| Ok((field.clone(), attribute_to_value(attr)?)))
        .collect::<Result<Map<String, Value>, StorageError>>()?;
    Ok(TelemetryRecord::from_document(document))
}

fn value_to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(items) => {
            AttributeValue::L(items.into_iter().map(value_to_attribute).collect())
        }
        Value::Object(map) => AttributeValue::M(
            map.into_iter()
                .map(|(k, v)| (k, value_to_attribute(v)))
                .collect(),
        ),
    }
}

fn attribute_to_value(attr: &AttributeValue) -> Result<Value, StorageError> {
    Ok(match attr {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::N(n) => Value::Number(
            Number::from_str(n).map_err(|e| StorageError::Conversion(format!("{}: {}", n, e)))?,
        ),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::L(items) => Value::Array(
            items
                .iter()
                .map(attribute_to_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), attribute_to_value(v)?)))
                .collect::<Result<Map<_, _>, StorageError>>()?,
        ),
        other => {
            return Err(StorageError::Conversion(format!(
                "unsupported attribute type: {:?}",
                other
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use record_validator::{parse_records, BigDecimal};

    #[test]
    fn test_numbers_sent_as_exact_text() {
        let content = br#"[{"productId":"p1","batteryLevel":0.1,"temperature":25}]"#;
        let records = parse_records(content).unwrap();
        let item = record_to_item(&records[0]);

        assert_eq!(item.get("productId"), Some(&AttributeValue::S("p1".to_string())));
        assert_eq!(item.get("batteryLevel"), Some(&AttributeValue::N("0.1".to_string())));
        assert_eq!(item.get("temperature"), Some(&AttributeValue::N("25".to_string())));
    }

    #[test]
    fn test_item_read_back_is_exact() {
        let records = parse_records(br#"[{"productId":"p1","batteryLevel":0.5}]"#).unwrap();
        let item = record_to_item(&records[0]);
        let back = item_to_record(&item).unwrap();

        assert_eq!(back.battery_level.as_ref().unwrap().to_string(), "0.5");
        assert_eq!(back.battery_level, Some(BigDecimal::new(5.into(), 1)));
        assert_eq!(back, records[0]);
    }

    #[test]
    fn test_nested_values_convert() {
        let records = parse_records(
            br#"[{"location":{"lat":52.37,"lon":4.89},"tags":["a",null,true],"rssi":-71}]"#,
        )
        .unwrap();
        let item = record_to_item(&records[0]);

        match item.get("location") {
            Some(AttributeValue::M(map)) => {
                assert_eq!(map.get("lat"), Some(&AttributeValue::N("52.37".to_string())));
            }
            other => panic!("unexpected location attribute: {:?}", other),
        }
        assert_eq!(
            item.get("tags"),
            Some(&AttributeValue::L(vec![
                AttributeValue::S("a".to_string()),
                AttributeValue::Null(true),
                AttributeValue::Bool(true),
            ]))
        );
        assert_eq!(item_to_record(&item).unwrap(), records[0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unprocessed_items_resubmitted() {
        let mut submitted: Vec<Vec<u32>> = Vec::new();
        let result = submit_until_processed("health", vec![1, 2, 3, 4, 5], 5, |pending| {
            let unprocessed = if submitted.is_empty() { vec![4, 5] } else { Vec::new() };
            submitted.push(pending);
            async move { Ok(unprocessed) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(submitted, vec![vec![1, 2, 3, 4, 5], vec![4, 5]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_attempts_exhausted() {
        let mut calls = 0;
        let result = submit_until_processed("health", vec!["a", "b"], 3, |pending| {
            calls += 1;
            async move { Ok(pending[..1].to_vec()) }
        })
        .await;

        assert_eq!(calls, 3);
        match result {
            Err(StorageError::Unavailable(message)) => {
                assert!(message.contains("1 items left unprocessed in health after 3 attempts"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_error_not_retried() {
        let mut calls = 0;
        let result = submit_until_processed("health", vec![1], 5, |_pending: Vec<u32>| {
            calls += 1;
            async { Err::<Vec<u32>, _>(StorageError::Unavailable("throttled".to_string())) }
        })
        .await;

        assert_eq!(calls, 1);
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
    }

    #[test]
    fn test_backoff_doubles_and_saturates() {
        assert_eq!(backoff_delay(1), Duration::from_millis(50));
        assert_eq!(backoff_delay(2), Duration::from_millis(100));
        assert_eq!(backoff_delay(5), Duration::from_millis(800));
        assert_eq!(backoff_delay(100), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_unsupported_attribute_rejected() {
        let mut item = HashMap::new();
        item.insert(
            "labels".to_string(),
            AttributeValue::Ss(vec!["x".to_string()]),
        );
        assert!(matches!(
            item_to_record(&item),
            Err(StorageError::Conversion(_))
        ));
    }
}

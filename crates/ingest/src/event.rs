//! Invocation payload and result types

use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SUCCESS_MESSAGE: &str = "Health data processed successfully";

/// One pointer to a source object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IngestionNotification {
    pub bucket: String,
    pub key: String,
}

impl IngestionNotification {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

/// S3 event notification payload, reduced to the fields the pipeline reads
#[derive(Debug, Default, Deserialize)]
pub struct InvocationPayload {
    #[serde(rename = "Records", default)]
    pub records: Option<Vec<NotificationRecord>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationRecord {
    #[serde(default)]
    pub s3: Option<S3Entity>,
}

#[derive(Debug, Default, Deserialize)]
pub struct S3Entity {
    #[serde(default)]
    pub bucket: Option<BucketRef>,
    #[serde(default)]
    pub object: Option<ObjectRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BucketRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ObjectRef {
    #[serde(default)]
    pub key: Option<String>,
}

impl InvocationPayload {
    /// Parse a raw invocation event
    pub fn from_event(event: Value) -> Result<Self, IngestError> {
        serde_json::from_value(event).map_err(|e| IngestError::InvalidEvent(e.to_string()))
    }

    /// Extract the ordered notification list.
    ///
    /// A missing or empty list, or an entry without bucket name and object
    /// key, is a client error.
    pub fn into_notifications(self) -> Result<Vec<IngestionNotification>, IngestError> {
        let records = match self.records {
            Some(records) if !records.is_empty() => records,
            _ => return Err(IngestError::NoNotifications),
        };

        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let entity = record.s3.unwrap_or_default();
                let bucket = entity.bucket.and_then(|b| b.name);
                let key = entity.object.and_then(|o| o.key);
                match (bucket, key) {
                    (Some(bucket), Some(key)) if !bucket.is_empty() && !key.is_empty() => {
                        Ok(IngestionNotification { bucket, key })
                    }
                    _ => Err(IngestError::InvalidEvent(format!(
                        "record {} lacks a bucket name or object key",
                        index
                    ))),
                }
            })
            .collect()
    }
}

/// Result category of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Success,
    ClientError,
    ServerError,
}

/// The single response of an invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionResult {
    pub status_code: u16,
    pub body: String,
}

impl IngestionResult {
    /// All processed notifications succeeded
    pub fn success() -> Self {
        Self {
            status_code: 200,
            body: SUCCESS_MESSAGE.to_string(),
        }
    }

    /// Result for an error that ended the invocation
    pub fn from_error(error: &IngestError) -> Self {
        Self {
            status_code: error.status_code(),
            body: error.public_message(),
        }
    }

    pub fn kind(&self) -> ResultKind {
        match self.status_code {
            200..=299 => ResultKind::Success,
            400..=499 => ResultKind::ClientError,
            _ => ResultKind::ServerError,
        }
    }
}

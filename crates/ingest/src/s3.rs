//! S3-backed object source

use crate::source::{FetchError, ObjectSource};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use aws_smithy_types::error::display::DisplayErrorContext;
use tracing::debug;

/// Fetches telemetry batches from S3
#[derive(Debug, Clone)]
pub struct S3ObjectSource {
    client: Client,
}

impl S3ObjectSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from shared AWS configuration
    pub fn from_sdk_config(config: &SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl ObjectSource for S3ObjectSource {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, FetchError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|s| s.is_no_such_key()) {
                    FetchError::NotFound
                } else {
                    FetchError::Request(DisplayErrorContext(&e).to_string())
                }
            })?;

        let content = output
            .body
            .collect()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?
            .into_bytes();

        debug!(bucket, key, bytes = content.len(), "Fetched source object");
        Ok(content.to_vec())
    }
}

//! SNS-backed notification channel

use crate::notifier::{DeliveryError, Notifier};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sns::Client;
use aws_smithy_types::error::display::DisplayErrorContext;
use tracing::debug;

/// Publishes alerts to an SNS topic; the channel address is the topic ARN
#[derive(Debug, Clone)]
pub struct SnsNotifier {
    client: Client,
}

impl SnsNotifier {
    /// Wrap an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from shared AWS configuration
    pub fn from_sdk_config(config: &SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(&self, channel: &str, text: &str) -> Result<(), DeliveryError> {
        let output = self
            .client
            .publish()
            .topic_arn(channel)
            .message(text)
            .send()
            .await
            .map_err(|e| DeliveryError::Publish(DisplayErrorContext(&e).to_string()))?;

        debug!(message_id = ?output.message_id(), "SNS publish accepted");
        Ok(())
    }
}

//! Notification Channel Port

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Errors delivering a notification
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    #[error("Publish failed: {0}")]
    Publish(String),
}

/// Outbound notification channel
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish `text` to the channel at `channel`
    async fn publish(&self, channel: &str, text: &str) -> Result<(), DeliveryError>;
}

/// A message captured by [`MemoryNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub channel: String,
    pub text: String,
}

/// In-memory notifier that records every publish
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    messages: Mutex<Vec<PublishedMessage>>,
    attempts: Mutex<usize>,
    failing: AtomicBool,
}

impl MemoryNotifier {
    /// Create an empty notifier
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Messages delivered so far
    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Publish calls made so far, failed ones included
    pub fn attempts(&self) -> usize {
        self.attempts.lock().map(|a| *a).unwrap_or(0)
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn publish(&self, channel: &str, text: &str) -> Result<(), DeliveryError> {
        if let Ok(mut attempts) = self.attempts.lock() {
            *attempts += 1;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Publish("notifier unavailable".to_string()));
        }

        let mut messages = self
            .messages
            .lock()
            .map_err(|e| DeliveryError::Publish(format!("Lock error: {}", e)))?;
        messages.push(PublishedMessage {
            channel: channel.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_messages() {
        let notifier = MemoryNotifier::new();
        notifier.publish("topic", "hello").await.unwrap();

        assert_eq!(
            notifier.messages(),
            vec![PublishedMessage {
                channel: "topic".to_string(),
                text: "hello".to_string()
            }]
        );
        assert_eq!(notifier.attempts(), 1);
    }

    #[tokio::test]
    async fn test_failing_mode() {
        let notifier = MemoryNotifier::new();
        notifier.set_failing(true);

        assert!(notifier.publish("topic", "hello").await.is_err());
        assert!(notifier.messages().is_empty());
        assert_eq!(notifier.attempts(), 1);
    }
}

//! Ingestion Orchestrator
//!
//! Walks the notifications of one invocation in order:
//! `Start -> FetchObject -> ParseObject -> ProcessRecords -> (next | Done)`,
//! leaving early (`Aborted`) when the remaining time budget drops below the
//! configured floor. Work finished before that point stands and the
//! invocation still succeeds.

use crate::budget::TimeBudget;
use crate::error::IngestError;
use crate::event::{IngestionNotification, IngestionResult, InvocationPayload};
use crate::settings::Settings;
use crate::source::ObjectSource;
use alerting::{AlertDispatcher, Notifier};
use metrics::counter;
use record_validator::Validator;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use storage::{BatchPersister, KeyValueStore};
use tracing::{debug, error, info, warn};

/// What one invocation got done
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Notifications whose object was fully processed
    pub objects: usize,
    /// Notifications skipped because their object was already processed
    pub duplicates: usize,
    /// Records accepted by the store
    pub records: usize,
    /// Alerts delivered
    pub alerts_sent: usize,
    /// Whether the time budget cut the run short
    pub stopped_early: bool,
}

/// Top-level controller for one notification batch.
///
/// Holds injected client handles only; no state survives between
/// invocations.
pub struct Orchestrator {
    source: Arc<dyn ObjectSource>,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    settings: Settings,
    validator: Validator,
}

impl Orchestrator {
    /// Create an orchestrator over the given clients
    pub fn new(
        source: Arc<dyn ObjectSource>,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        settings: Settings,
    ) -> Self {
        info!(
            "Creating ingestion orchestrator (time budget floor {}ms, batch size {})",
            settings.time_budget_floor_ms, settings.write_batch_size
        );
        Self {
            source,
            store,
            notifier,
            settings,
            validator: Validator::new(),
        }
    }

    /// Handle one raw invocation event, always producing exactly one result
    pub async fn handle_event(&self, event: Value, budget: &dyn TimeBudget) -> IngestionResult {
        let notifications =
            InvocationPayload::from_event(event).and_then(|p| p.into_notifications());
        let outcome = match notifications {
            Ok(notifications) => self.run(&notifications, budget).await,
            Err(e) => Err(e),
        };
        self.conclude(outcome)
    }

    /// Process notifications in order until done, out of time, or failed
    pub async fn run(
        &self,
        notifications: &[IngestionNotification],
        budget: &dyn TimeBudget,
    ) -> Result<RunSummary, IngestError> {
        if notifications.is_empty() {
            return Err(IngestError::NoNotifications);
        }

        let config = self.settings.resolve()?;
        let dispatcher =
            AlertDispatcher::new(self.notifier.clone(), config.alert_topic_arn.as_str());
        let persister =
            BatchPersister::new(self.store.clone(), dispatcher, config.table_name.as_str())
                .with_batch_size(config.write_batch_size);

        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        let mut summary = RunSummary::default();

        for (index, notification) in notifications.iter().enumerate() {
            let remaining = budget.remaining_millis();
            if remaining < config.time_budget_floor_ms {
                warn!(
                    remaining_ms = remaining,
                    processed = summary.objects,
                    pending = notifications.len() - index,
                    "Function is about to timeout. Stopping processing."
                );
                summary.stopped_early = true;
                break;
            }

            let IngestionNotification { bucket, key } = notification;
            if !seen.insert((bucket.as_str(), key.as_str())) {
                debug!(
                    bucket = %bucket,
                    key = %key,
                    "Object already processed in this invocation, skipping"
                );
                summary.duplicates += 1;
                continue;
            }

            let content = self
                .source
                .fetch(bucket, key)
                .await
                .map_err(|source| IngestError::Fetch {
                    bucket: bucket.clone(),
                    key: key.clone(),
                    source,
                })?;

            let records = self
                .validator
                .parse(&content)
                .map_err(|source| IngestError::Validation {
                    bucket: bucket.clone(),
                    key: key.clone(),
                    source,
                })?;
            debug!(bucket = %bucket, key = %key, records = records.len(), "Parsed source object");

            let persisted = persister
                .persist(records)
                .await
                .map_err(|source| IngestError::Storage {
                    bucket: bucket.clone(),
                    key: key.clone(),
                    source,
                })?;

            counter!("telemetry_objects_processed_total").increment(1);
            summary.objects += 1;
            summary.records += persisted.accepted;
            summary.alerts_sent += persisted.alerts_sent;
        }

        Ok(summary)
    }

    fn conclude(&self, outcome: Result<RunSummary, IngestError>) -> IngestionResult {
        let result = match outcome {
            Ok(summary) => {
                info!(
                    objects = summary.objects,
                    duplicates = summary.duplicates,
                    records = summary.records,
                    alerts_sent = summary.alerts_sent,
                    stopped_early = summary.stopped_early,
                    "Invocation complete"
                );
                IngestionResult::success()
            }
            Err(e) if e.is_client_error() => {
                warn!("Rejected invocation: {}", e);
                IngestionResult::from_error(&e)
            }
            Err(e) => {
                error!("Invocation failed: {}", e);
                IngestionResult::from_error(&e)
            }
        };

        counter!("telemetry_invocations_total", "status" => result.status_code.to_string())
            .increment(1);
        result
    }
}

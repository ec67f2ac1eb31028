//! Batch Persister

use crate::dynamo::MAX_BATCH_ITEMS;
use crate::store::KeyValueStore;
use crate::StorageError;
use alerting::{AlertDispatcher, AnomalyEvaluator};
use metrics::counter;
use record_validator::TelemetryRecord;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Default number of records coalesced into one store write
pub const DEFAULT_BATCH_SIZE: usize = MAX_BATCH_ITEMS;

/// Outcome of persisting one object's records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    /// Records accepted by the store
    pub accepted: usize,
    /// Records that crossed a threshold
    pub flagged: usize,
    /// Alerts delivered
    pub alerts_sent: usize,
}

/// Records waiting for the next flush, with their evaluation result
#[derive(Default)]
struct WriteBuffer {
    records: Vec<TelemetryRecord>,
    flagged: Vec<bool>,
}

impl WriteBuffer {
    fn push(&mut self, record: TelemetryRecord, flagged: bool) {
        self.records.push(record);
        self.flagged.push(flagged);
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Buffered writer that evaluates and alerts per record.
///
/// Records are written in chunks of `batch_size`. Once a chunk is accepted
/// by the store, alerts for its flagged records go out in record order, so
/// an alert is only ever sent for a record that was persisted. A failed
/// chunk stops the batch: its records and everything after are neither
/// written nor alerted.
pub struct BatchPersister {
    store: Arc<dyn KeyValueStore>,
    evaluator: AnomalyEvaluator,
    dispatcher: AlertDispatcher,
    table: String,
    batch_size: usize,
}

impl BatchPersister {
    /// Create a persister writing to `table` and alerting through `dispatcher`
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        dispatcher: AlertDispatcher,
        table: impl Into<String>,
    ) -> Self {
        Self {
            store,
            evaluator: AnomalyEvaluator::default(),
            dispatcher,
            table: table.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the write batch size (clamped to 1..=25)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_ITEMS);
        self
    }

    /// Persist records in order, alerting on flagged ones as they land
    pub async fn persist(
        &self,
        records: Vec<TelemetryRecord>,
    ) -> Result<PersistSummary, StorageError> {
        if self.table.trim().is_empty() {
            return Err(StorageError::Configuration(
                "target table name is not set".to_string(),
            ));
        }
        if self.dispatcher.channel().trim().is_empty() {
            return Err(StorageError::Configuration(
                "alert channel address is not set".to_string(),
            ));
        }

        let mut summary = PersistSummary::default();
        let mut buffer = WriteBuffer::default();

        for record in records {
            let flagged = self.evaluator.evaluate(&record);
            buffer.push(record, flagged);

            if buffer.len() >= self.batch_size {
                self.flush(&mut buffer, &mut summary).await?;
            }
        }

        if !buffer.is_empty() {
            self.flush(&mut buffer, &mut summary).await?;
        }

        info!(
            table = %self.table,
            accepted = summary.accepted,
            flagged = summary.flagged,
            alerts_sent = summary.alerts_sent,
            "Telemetry batch persisted"
        );
        Ok(summary)
    }

    async fn flush(
        &self,
        buffer: &mut WriteBuffer,
        summary: &mut PersistSummary,
    ) -> Result<(), StorageError> {
        let WriteBuffer { records, flagged } = std::mem::take(buffer);

        let accepted = match self.store.batch_write(&self.table, &records).await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(
                    table = %self.table,
                    pending = records.len(),
                    "Error writing telemetry batch: {}",
                    e
                );
                return Err(e);
            }
        };

        summary.accepted += accepted;
        counter!("telemetry_records_persisted_total").increment(accepted as u64);
        debug!(table = %self.table, accepted, "Flushed telemetry batch");

        for (record, _) in records.iter().zip(flagged).filter(|(_, f)| *f) {
            summary.flagged += 1;
            if self.dispatcher.dispatch(record).await {
                summary.alerts_sent += 1;
            }
        }

        Ok(())
    }
}

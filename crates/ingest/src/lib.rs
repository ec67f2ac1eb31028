//! Health Telemetry Ingestion
//!
//! Fetches telemetry batches named by object-store notifications, validates
//! them, persists each record, and alerts on anomalous readings. The
//! external clients are injected so the whole pipeline runs against
//! in-memory doubles in tests.

mod budget;
mod error;
mod event;
mod orchestrator;
mod s3;
mod settings;
mod source;

pub use budget::{DeadlineBudget, ScriptedBudget, TimeBudget, Unbounded};
pub use error::IngestError;
pub use event::{
    IngestionNotification, IngestionResult, InvocationPayload, NotificationRecord, ResultKind,
};
pub use orchestrator::{Orchestrator, RunSummary};
pub use s3::S3ObjectSource;
pub use settings::{PipelineConfig, Settings, DEFAULT_TIME_BUDGET_FLOOR_MS};
pub use source::{FetchError, MemoryObjectSource, ObjectSource};

use tracing_subscriber::EnvFilter;

/// Initialize JSON logging, honouring `RUST_LOG` (default `info`)
pub fn init_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .without_time()
        .try_init()
}

//! Health Telemetry Ingestion - Lambda Entry Point

use alerting::SnsNotifier;
use ingest::{init_logging, DeadlineBudget, IngestionResult, Orchestrator, S3ObjectSource, Settings};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use std::sync::Arc;
use storage::DynamoStore;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging()?;

    info!("=== Health telemetry ingest v{} ===", env!("CARGO_PKG_VERSION"));

    let settings = Settings::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(S3ObjectSource::from_sdk_config(&aws_config)),
        Arc::new(DynamoStore::from_sdk_config(&aws_config)),
        Arc::new(SnsNotifier::from_sdk_config(&aws_config)),
        settings,
    ));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let orchestrator = orchestrator.clone();
        async move {
            let budget = DeadlineBudget::new(event.context.deadline);
            Ok::<IngestionResult, Error>(orchestrator.handle_event(event.payload, &budget).await)
        }
    }))
    .await
}

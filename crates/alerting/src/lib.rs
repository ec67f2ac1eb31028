//! Alerting
//!
//! Decides whether a telemetry record is anomalous and sends a
//! best-effort notification for the ones that are.

mod dispatcher;
mod evaluator;
mod notifier;
mod sns;

pub use dispatcher::{format_alert, AlertDispatcher};
pub use evaluator::{AnomalyEvaluator, AnomalyThresholds};
pub use notifier::{DeliveryError, MemoryNotifier, Notifier, PublishedMessage};
pub use sns::SnsNotifier;

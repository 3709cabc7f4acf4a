//! Telemetry adapters.
//!
//! Provides:
//! - The [`Instrumentation`] capability every backend implements
//! - An [`AdapterRegistry`](registry::AdapterRegistry) that isolates failures
//! - Backends: structured log, OTLP spans, OpenTelemetry metrics, JSONL eval log

pub mod eval_log;
pub mod log;
pub mod metrics;
pub mod otlp;
pub mod registry;

use crate::config::AdapterSettings;
use crate::error::AdapterError;
use crate::record::{AdapterStatus, CallRecord};

/// Capability set of one telemetry backend.
///
/// The tracer only ever talks to this trait and never branches on which
/// backend is behind it.
pub trait Instrumentation: Send + Sync {
    /// Stable adapter name, used as the key into adapter settings.
    fn name(&self) -> &str;

    /// Set up the backend.
    ///
    /// Must not panic. Failures are reported through the returned status,
    /// and a disabled adapter is never invoked again.
    fn initialize(&mut self, settings: &AdapterSettings) -> AdapterStatus;

    /// Emit one finalized call record.
    fn record(&self, call: &CallRecord) -> Result<(), AdapterError>;

    /// Deliver buffered telemetry, bounded by a backend-defined timeout.
    fn flush(&self) -> Result<(), AdapterError>;
}

/// Names of the built-in adapters.
pub const BUILTIN_ADAPTERS: &[&str] = &[log::NAME, otlp::NAME, metrics::NAME, eval_log::NAME];

/// Construct a built-in adapter by name.
pub fn builtin(name: &str) -> Option<Box<dyn Instrumentation>> {
    match name {
        log::NAME => Some(Box::new(log::LogAdapter::new())),
        otlp::NAME => Some(Box::new(otlp::OtlpSpanAdapter::new())),
        metrics::NAME => Some(Box::new(metrics::MetricsAdapter::new())),
        eval_log::NAME => Some(Box::new(eval_log::EvalLogAdapter::new())),
        _ => None,
    }
}

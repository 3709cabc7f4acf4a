//! Structured-log adapter.
//!
//! Emits one `tracing` event per call under the `sightline::calls` target.
//! Needs no backend, so it always initializes.

use super::Instrumentation;
use crate::config::AdapterSettings;
use crate::error::AdapterError;
use crate::record::{AdapterStatus, CallRecord};

pub const NAME: &str = "log";

/// Logs every call record as a structured event.
#[derive(Debug, Default)]
pub struct LogAdapter;

impl LogAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Instrumentation for LogAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn initialize(&mut self, _settings: &AdapterSettings) -> AdapterStatus {
        AdapterStatus::enabled(NAME)
    }

    fn record(&self, call: &CallRecord) -> Result<(), AdapterError> {
        if !call.success {
            tracing::warn!(
                target: "sightline::calls",
                call_id = %call.call_id,
                sequence = call.sequence_number,
                user = %call.user_id,
                model = %call.model,
                latency_seconds = call.latency_seconds,
                error = call.error_message.as_deref().unwrap_or(""),
                "LLM call failed"
            );
        } else if call.high_cost {
            tracing::warn!(
                target: "sightline::calls",
                call_id = %call.call_id,
                sequence = call.sequence_number,
                cost_usd = call.cost_estimate_usd,
                threshold_usd = call.high_cost_threshold_usd,
                "High-cost LLM call"
            );
        }

        if call.success {
            tracing::info!(
                target: "sightline::calls",
                call_id = %call.call_id,
                sequence = call.sequence_number,
                user = %call.user_id,
                model = %call.model,
                latency_seconds = call.latency_seconds,
                input_tokens = call.input_tokens(),
                output_tokens = call.output_tokens(),
                cost_usd = call.cost_estimate_usd,
                "LLM call completed"
            );
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), AdapterError> {
        Ok(())
    }
}

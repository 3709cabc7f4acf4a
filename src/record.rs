//! Call records and adapter status.

use serde::Serialize;
use std::time::SystemTime;

/// Identity of a call within its session.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub sequence_number: u64,
    pub user_id: String,
    pub session_id: String,
    pub model: String,
}

/// Finalized description of one request/response interaction.
///
/// Built by the tracer while the call is in flight and handed to adapters by
/// shared reference once finalized. Token and cost estimates are zero for
/// failed calls.
#[derive(Debug, Clone, Serialize)]
pub struct CallRecord {
    pub call_id: String,
    pub sequence_number: u64,
    pub user_id: String,
    pub session_id: String,
    pub model: String,
    pub input_text: String,
    pub output_text: Option<String>,
    #[serde(serialize_with = "serialize_millis")]
    pub start_time: SystemTime,
    #[serde(serialize_with = "serialize_millis")]
    pub end_time: SystemTime,
    pub latency_seconds: f64,
    pub input_tokens_est: f64,
    pub output_tokens_est: f64,
    pub cost_estimate_usd: f64,
    pub success: bool,
    pub error_message: Option<String>,
    /// Set when the estimated cost exceeded the configured threshold.
    pub high_cost: bool,
    /// Threshold the marker was evaluated against.
    pub high_cost_threshold_usd: f64,
}

impl CallRecord {
    /// Start a record for a call that begins at `start_time`.
    pub fn begin(ctx: CallContext, input_text: impl Into<String>, start_time: SystemTime) -> Self {
        Self {
            call_id: crate::generate_id(),
            sequence_number: ctx.sequence_number,
            user_id: ctx.user_id,
            session_id: ctx.session_id,
            model: ctx.model,
            input_text: input_text.into(),
            output_text: None,
            start_time,
            end_time: start_time,
            latency_seconds: 0.0,
            input_tokens_est: 0.0,
            output_tokens_est: 0.0,
            cost_estimate_usd: 0.0,
            success: false,
            error_message: None,
            high_cost: false,
            high_cost_threshold_usd: 0.0,
        }
    }

    /// Estimated input tokens, truncated for display and integer attributes.
    pub fn input_tokens(&self) -> i64 {
        self.input_tokens_est as i64
    }

    /// Estimated output tokens, truncated for display and integer attributes.
    pub fn output_tokens(&self) -> i64 {
        self.output_tokens_est as i64
    }
}

fn serialize_millis<S: serde::Serializer>(time: &SystemTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(crate::unix_millis(*time))
}

/// Outcome of one adapter's initialization. Never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterStatus {
    pub name: String,
    pub enabled: bool,
    pub init_error: Option<String>,
}

impl AdapterStatus {
    pub fn enabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            init_error: None,
        }
    }

    pub fn disabled(name: impl Into<String>, error: impl ToString) -> Self {
        Self {
            name: name.into(),
            enabled: false,
            init_error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> CallContext {
        CallContext {
            sequence_number: 1,
            user_id: "ada".into(),
            session_id: "s-1".into(),
            model: "test-model".into(),
        }
    }

    #[test]
    fn test_begin_starts_unfinished() {
        let record = CallRecord::begin(ctx(), "hello", SystemTime::now());
        assert!(!record.success);
        assert!(record.output_text.is_none());
        assert_eq!(record.sequence_number, 1);
        assert_eq!(record.call_id.len(), 36);
    }

    #[test]
    fn test_serializes_times_as_millis() {
        let record = CallRecord::begin(ctx(), "hello", std::time::UNIX_EPOCH);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["start_time"], 0);
        assert_eq!(json["input_text"], "hello");
    }

    #[test]
    fn test_status_constructors() {
        let ok = AdapterStatus::enabled("log");
        assert!(ok.enabled);
        assert!(ok.init_error.is_none());

        let bad = AdapterStatus::disabled("otlp", "no endpoint");
        assert!(!bad.enabled);
        assert_eq!(bad.init_error.as_deref(), Some("no endpoint"));
    }
}

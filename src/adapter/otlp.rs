//! OpenTelemetry span adapter.
//!
//! Emits a `chat-interaction` span with a nested `llm-generation` span for
//! every call, exported over OTLP/gRPC (e.g. to Jaeger). Spans carry the
//! call's own start and end timestamps, so they line up with the real call
//! even though they are built after it finished.

use opentelemetry::trace::{Span, SpanKind, Status, TraceContextExt, Tracer, TracerProvider as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::trace::{Tracer as SdkTracer, TracerProvider};

use super::Instrumentation;
use crate::config::AdapterSettings;
use crate::error::AdapterError;
use crate::observability::tracing::otlp_tracer_provider;
use crate::record::{AdapterStatus, CallRecord};

pub const NAME: &str = "otlp";

const DEFAULT_SERVICE_NAME: &str = "sightline";

/// Manual span-based tracer over OTLP.
#[derive(Debug, Default)]
pub struct OtlpSpanAdapter {
    provider: Option<TracerProvider>,
    tracer: Option<SdkTracer>,
}

impl OtlpSpanAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already-built provider instead of an OTLP pipeline.
    pub fn with_provider(provider: TracerProvider) -> Self {
        let tracer = provider.tracer(DEFAULT_SERVICE_NAME);
        Self {
            provider: Some(provider),
            tracer: Some(tracer),
        }
    }

    fn build_provider(settings: &AdapterSettings) -> Result<TracerProvider, AdapterError> {
        let endpoint = settings
            .get("endpoint")
            .ok_or_else(|| AdapterError::Init("no OTLP endpoint configured".into()))?;
        let service_name = settings.get("service_name").unwrap_or(DEFAULT_SERVICE_NAME);
        let environment = settings.get("environment").unwrap_or("demo");

        otlp_tracer_provider(endpoint, service_name, environment)
            .map_err(|e| AdapterError::Init(e.to_string()))
    }
}

impl Instrumentation for OtlpSpanAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn initialize(&mut self, settings: &AdapterSettings) -> AdapterStatus {
        if self.provider.is_some() {
            return AdapterStatus::enabled(NAME);
        }

        match Self::build_provider(settings) {
            Ok(provider) => {
                self.tracer = Some(provider.tracer(DEFAULT_SERVICE_NAME));
                self.provider = Some(provider);
                tracing::info!(endpoint = ?settings.get("endpoint"), "OTLP span exporter configured");
                AdapterStatus::enabled(NAME)
            }
            Err(e) => AdapterStatus::disabled(NAME, e),
        }
    }

    fn record(&self, call: &CallRecord) -> Result<(), AdapterError> {
        let tracer = self
            .tracer
            .as_ref()
            .ok_or_else(|| AdapterError::Record("tracer not initialized".into()))?;

        let interaction = tracer
            .span_builder("chat-interaction")
            .with_kind(SpanKind::Internal)
            .with_start_time(call.start_time)
            .with_attributes(vec![
                KeyValue::new("user.id", call.user_id.clone()),
                KeyValue::new("user.input", call.input_text.clone()),
                KeyValue::new("session.id", call.session_id.clone()),
                KeyValue::new("conversation.number", call.sequence_number as i64),
                KeyValue::new("call.id", call.call_id.clone()),
            ])
            .start(tracer);
        let cx = Context::current_with_span(interaction);

        let mut generation = tracer
            .span_builder("llm-generation")
            .with_kind(SpanKind::Client)
            .with_start_time(call.start_time)
            .with_attributes(generation_attributes(call))
            .start_with_context(tracer, &cx);

        if call.high_cost {
            generation.add_event(
                "high_cost_warning",
                vec![
                    KeyValue::new("cost_usd", call.cost_estimate_usd),
                    KeyValue::new("threshold", call.high_cost_threshold_usd),
                ],
            );
        }
        if let Some(message) = &call.error_message {
            generation.add_event(
                "error_occurred",
                vec![KeyValue::new("error.message", message.clone())],
            );
            generation.set_status(Status::error(message.clone()));
        }

        generation.end_with_timestamp(call.end_time);
        cx.span().end_with_timestamp(call.end_time);
        Ok(())
    }

    fn flush(&self) -> Result<(), AdapterError> {
        let Some(provider) = &self.provider else {
            return Ok(());
        };

        let errors: Vec<String> = provider
            .force_flush()
            .into_iter()
            .filter_map(|r| r.err().map(|e| e.to_string()))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AdapterError::Flush(errors.join("; ")))
        }
    }
}

fn generation_attributes(call: &CallRecord) -> Vec<KeyValue> {
    let mut attrs = vec![
        KeyValue::new("llm.model", call.model.clone()),
        KeyValue::new("llm.provider", "google"),
        KeyValue::new("llm.request.type", "chat.completion"),
        KeyValue::new("llm.input.length", call.input_text.len() as i64),
        KeyValue::new("llm.latency_seconds", round_to(call.latency_seconds, 3)),
        KeyValue::new("llm.success", call.success),
    ];

    if call.success {
        attrs.extend([
            KeyValue::new("llm.input_tokens", call.input_tokens()),
            KeyValue::new("llm.output_tokens", call.output_tokens()),
            KeyValue::new("llm.estimated_cost_usd", round_to(call.cost_estimate_usd, 6)),
            KeyValue::new(
                "llm.output.length",
                call.output_text.as_deref().map_or(0, str::len) as i64,
            ),
        ]);
    }
    if let Some(message) = &call.error_message {
        attrs.push(KeyValue::new("error.message", message.clone()));
    }
    attrs
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

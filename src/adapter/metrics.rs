//! OpenTelemetry metrics adapter.
//!
//! Key metrics:
//! - sightline_llm_calls_total: Counter of calls, by model and outcome
//! - sightline_llm_latency_seconds: Histogram of call latency
//! - sightline_llm_tokens_total: Counter of estimated tokens, by direction
//! - sightline_llm_cost_usd_total: Counter of estimated spend
//! - sightline_llm_high_cost_total: Counter of calls over the cost threshold

use opentelemetry::metrics::{Counter, Histogram, Meter, MeterProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::reader::MetricReader;
use opentelemetry_sdk::metrics::{ManualReader, SdkMeterProvider};
use opentelemetry_sdk::Resource;
use std::time::Duration;

use super::Instrumentation;
use crate::config::AdapterSettings;
use crate::error::AdapterError;
use crate::record::{AdapterStatus, CallRecord};

pub const NAME: &str = "metrics";

const EXPORT_PERIOD: Duration = Duration::from_secs(10);

const DEFAULT_SERVICE_NAME: &str = "sightline";

/// Resource identifying this process on exported metrics.
fn service_resource(settings: &AdapterSettings) -> Resource {
    let service_name = settings.get("service_name").unwrap_or(DEFAULT_SERVICE_NAME);
    Resource::new(vec![
        KeyValue::new("service.name", service_name.to_string()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ])
}

/// Meter provider over a single reader, tagged with the service resource.
fn reader_provider<R: MetricReader>(reader: R, settings: &AdapterSettings) -> SdkMeterProvider {
    SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(service_resource(settings))
        .build()
}

/// Instruments recorded for every call.
#[derive(Debug)]
pub struct LlmMetrics {
    /// Total number of calls.
    pub calls_total: Counter<u64>,
    /// Histogram of call latency in seconds.
    pub latency: Histogram<f64>,
    /// Estimated tokens, split by direction (input/output).
    pub tokens_total: Counter<u64>,
    /// Estimated spend in USD.
    pub cost_total: Counter<f64>,
    /// Calls whose cost exceeded the threshold.
    pub high_cost_total: Counter<u64>,
}

impl LlmMetrics {
    /// Create the instruments from a meter.
    fn new(meter: &Meter) -> Self {
        Self {
            calls_total: meter
                .u64_counter("sightline_llm_calls_total")
                .with_description("Total number of LLM calls")
                .with_unit("1")
                .init(),
            latency: meter
                .f64_histogram("sightline_llm_latency_seconds")
                .with_description("LLM call latency from request to response")
                .with_unit("s")
                .init(),
            tokens_total: meter
                .u64_counter("sightline_llm_tokens_total")
                .with_description("Estimated tokens sent and received")
                .with_unit("1")
                .init(),
            cost_total: meter
                .f64_counter("sightline_llm_cost_usd_total")
                .with_description("Estimated spend on LLM calls")
                .with_unit("USD")
                .init(),
            high_cost_total: meter
                .u64_counter("sightline_llm_high_cost_total")
                .with_description("Calls whose estimated cost exceeded the threshold")
                .with_unit("1")
                .init(),
        }
    }
}

/// Records call metrics through an OpenTelemetry meter provider.
#[derive(Debug, Default)]
pub struct MetricsAdapter {
    provider: Option<SdkMeterProvider>,
    metrics: Option<LlmMetrics>,
}

impl MetricsAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already-built provider instead of building one from settings.
    pub fn with_provider(provider: SdkMeterProvider) -> Self {
        Self {
            provider: Some(provider),
            metrics: None,
        }
    }

    /// OTLP periodic export when an endpoint is set, otherwise an in-process
    /// manual reader (metrics are recorded but not exported).
    fn build_provider(settings: &AdapterSettings) -> Result<SdkMeterProvider, AdapterError> {
        let Some(endpoint) = settings.get("endpoint") else {
            return Ok(reader_provider(ManualReader::builder().build(), settings));
        };

        use opentelemetry_otlp::{Protocol, WithExportConfig};

        let exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(endpoint)
            .with_protocol(Protocol::Grpc);

        let provider = opentelemetry_otlp::new_pipeline()
            .metrics(opentelemetry_sdk::runtime::Tokio)
            .with_exporter(exporter)
            .with_resource(service_resource(settings))
            .with_period(EXPORT_PERIOD)
            .build()
            .map_err(|e| AdapterError::Init(e.to_string()))?;

        tracing::info!(endpoint, "OTLP metrics exporter configured");
        Ok(provider)
    }
}

impl Instrumentation for MetricsAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn initialize(&mut self, settings: &AdapterSettings) -> AdapterStatus {
        let provider = match self.provider.take() {
            Some(provider) => provider,
            None => match Self::build_provider(settings) {
                Ok(provider) => provider,
                Err(e) => return AdapterStatus::disabled(NAME, e),
            },
        };

        let meter = provider.meter("sightline");
        self.metrics = Some(LlmMetrics::new(&meter));
        self.provider = Some(provider);
        AdapterStatus::enabled(NAME)
    }

    fn record(&self, call: &CallRecord) -> Result<(), AdapterError> {
        let m = self
            .metrics
            .as_ref()
            .ok_or_else(|| AdapterError::Record("metrics not initialized".into()))?;

        let attrs = [
            KeyValue::new("model", call.model.clone()),
            KeyValue::new("success", call.success),
        ];
        m.calls_total.add(1, &attrs);
        m.latency.record(call.latency_seconds, &attrs);

        if call.success {
            let model = KeyValue::new("model", call.model.clone());
            m.tokens_total.add(
                call.input_tokens() as u64,
                &[model.clone(), KeyValue::new("direction", "input")],
            );
            m.tokens_total.add(
                call.output_tokens() as u64,
                &[model.clone(), KeyValue::new("direction", "output")],
            );
            m.cost_total.add(call.cost_estimate_usd, &[model.clone()]);
            if call.high_cost {
                m.high_cost_total.add(1, &[model]);
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), AdapterError> {
        match &self.provider {
            Some(provider) => provider
                .force_flush()
                .map_err(|e| AdapterError::Flush(e.to_string())),
            None => Ok(()),
        }
    }
}

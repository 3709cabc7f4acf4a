//! Logging and OpenTelemetry tracing setup.
//!
//! Configures structured logging with:
//! - Console output on stderr (stdout belongs to the chat)
//! - An optional OTLP layer exporting the process's own spans, so the
//!   `llm-generation` span around every model call reaches the collector
//!   without any adapter involvement

use opentelemetry::trace::{TraceError, TracerProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{Config as TraceConfig, TracerProvider};
use opentelemetry_sdk::Resource;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// OTLP export settings for the process-level layer.
#[derive(Debug, Clone)]
pub struct OtelExport {
    pub endpoint: String,
    pub service_name: String,
}

/// Keeps the OTLP tracer provider alive; flushes and shuts it down on drop.
#[derive(Debug, Default)]
pub struct TracingGuard {
    provider: Option<TracerProvider>,
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            for result in provider.force_flush() {
                if let Err(e) = result {
                    eprintln!("Failed to flush process spans: {e}");
                }
            }
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to shut down tracer provider: {e}");
            }
        }
    }
}

/// Build a batching OTLP/gRPC tracer provider.
///
/// Must be called from within a Tokio runtime.
pub fn otlp_tracer_provider(
    endpoint: &str,
    service_name: &str,
    environment: &str,
) -> Result<TracerProvider, TraceError> {
    let resource = Resource::new(vec![
        KeyValue::new("service.name", service_name.to_string()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        KeyValue::new("deployment.environment", environment.to_string()),
    ]);

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint)
        .with_timeout(Duration::from_secs(10));

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(TraceConfig::default().with_resource(resource))
        .install_batch(opentelemetry_sdk::runtime::Tokio)
}

/// Initialize logging, and span export when `otel` is given.
///
/// This sets up:
/// - Console logging with structured format
/// - Filter from `log_level` (an `EnvFilter` directive string)
///
/// # Panics
///
/// Panics if tracing has already been initialized.
pub fn init_tracing(log_level: &str, otel: Option<&OtelExport>) -> TracingGuard {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let (provider, otel_status) = match otel {
        Some(export) => match otlp_tracer_provider(&export.endpoint, &export.service_name, "demo") {
            Ok(provider) => (Some(provider), Some(Ok(export.endpoint.clone()))),
            Err(e) => (None, Some(Err(e.to_string()))),
        },
        None => (None, None),
    };

    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("sightline")));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    match otel_status {
        Some(Ok(endpoint)) => tracing::info!(%endpoint, "Process span export enabled"),
        Some(Err(error)) => {
            tracing::warn!(%error, "Failed to initialize OTLP span export, continuing without it");
        }
        None => tracing::debug!("Process span export disabled"),
    }

    TracingGuard { provider }
}

/// Initialize tracing for tests (only logs errors).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("error")
        .with_test_writer()
        .try_init();
}

//! Sightline: chat with a hosted model while every call is traced.
//!
//! # Usage
//!
//! ```bash
//! sightline --adapters log,otlp,metrics,eval_log \
//!     --otel-endpoint http://localhost:4317 --eval-log ./calls.jsonl
//! ```
//!
//! Environment variables can also be used:
//! - `GEMINI_API_KEY`: API key for the model
//! - `SIGHTLINE_ADAPTERS`: Comma-separated adapters to enable
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: Collector for spans and metrics
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use anyhow::{Context, Result};
use futures::StreamExt;
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;

use sightline::adapter::{self, registry::AdapterRegistry};
use sightline::config::{AdapterSettings, Config};
use sightline::estimate::WordCountEstimator;
use sightline::llm::gemini::GeminiClient;
use sightline::observability::tracing::{init_tracing, OtelExport};
use sightline::session::SessionRunner;
use sightline::tracer::CallTracer;

/// Print startup banner with version, model and adapter status.
fn print_banner(config: &Config, registry: &AdapterRegistry) {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"
  Sightline v{} - traced LLM chat

  Configuration:
    Model:      {}
    Pricing:    ${}/1k in, ${}/1k out
    High cost:  > ${}
"#,
        version,
        config.model,
        config.price_per_1k_input,
        config.price_per_1k_output,
        config.high_cost_threshold
    );

    eprintln!("  Adapters:");
    for status in registry.statuses() {
        match &status.init_error {
            None => eprintln!("    [ok]  {}", status.name),
            Some(error) => eprintln!("    [off] {}: {}", status.name, error),
        }
    }
    eprintln!(
        "\n  {}/{} adapters initialized. Type 'quit' to exit.\n",
        registry.active_count(),
        registry.statuses().len()
    );
}

/// Initialize every requested adapter.
fn build_registry(config: &Config) -> Result<AdapterRegistry> {
    let settings = config.adapter_configs()?;
    let empty = AdapterSettings::new();
    let mut registry = AdapterRegistry::new();

    for name in &config.adapters {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        match adapter::builtin(name) {
            Some(instance) => {
                registry.register(instance, settings.get(name).unwrap_or(&empty));
            }
            None => {
                registry.register_unavailable(
                    name,
                    format!("unknown adapter (known: {})", adapter::BUILTIN_ADAPTERS.join(", ")),
                );
            }
        }
    }
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    // Initialize tracing/logging, exporting process spans when a collector is set
    let otel = config.otel_endpoint.as_ref().map(|endpoint| OtelExport {
        endpoint: endpoint.clone(),
        service_name: config.service_name.clone(),
    });
    let _guard = init_tracing(&config.log_level, otel.as_ref());

    let api_key = config
        .api_key
        .clone()
        .context("GEMINI_API_KEY is not set (pass --api-key or set the variable)")?;
    let client = GeminiClient::new(
        config.api_base.clone(),
        api_key,
        Duration::from_secs(config.request_timeout_secs),
    )
    .context("failed to build HTTP client")?;

    let registry = build_registry(&config)?;
    print_banner(&config, &registry);

    let tracer = CallTracer::new(registry, config.model.clone())
        .with_pricing(config.pricing())
        .with_estimator(WordCountEstimator::new(config.token_factor))
        .with_high_cost_threshold(config.high_cost_threshold);

    let mut inputs = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let mut stdout = std::io::stdout();

    let user_id = match config.user.clone() {
        Some(user) => user,
        None => {
            print!("Enter your name: ");
            stdout.flush()?;
            inputs
                .next()
                .await
                .transpose()
                .context("failed to read user name")?
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "anonymous".to_string())
        }
    };
    println!("\nHello {user_id}! Each question is traced by every active adapter.");

    let runner = SessionRunner::new(tracer, client);
    let summary = runner.run(&mut inputs, &user_id, &mut stdout).await?;

    println!("\n{}", "=".repeat(70));
    println!(
        "Goodbye {}! You had {} interactions ({} failed).",
        summary.user_id, summary.interactions, summary.failures
    );
    println!("Session: {}", summary.session_id);
    println!("All telemetry flushed.");
    println!("{}", "=".repeat(70));

    tracing::info!("Sightline shutdown complete");
    Ok(())
}

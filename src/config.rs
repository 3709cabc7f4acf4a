//! Configuration parsing for Sightline.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Per-adapter settings via repeatable `--adapter-opt name.key=value`

use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::estimate::Pricing;
use crate::llm::gemini::DEFAULT_BASE_URL;

/// Sightline: chat with a hosted model while every call is traced.
#[derive(Parser, Debug, Clone)]
#[command(name = "sightline")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Model name passed to the generation API
    #[arg(long, env = "SIGHTLINE_MODEL", default_value = "gemini-2.0-flash-exp")]
    pub model: String,

    /// Price in USD per 1000 input tokens
    #[arg(long, env = "SIGHTLINE_PRICE_PER_1K_INPUT", default_value_t = 0.01)]
    pub price_per_1k_input: f64,

    /// Price in USD per 1000 output tokens
    #[arg(long, env = "SIGHTLINE_PRICE_PER_1K_OUTPUT", default_value_t = 0.03)]
    pub price_per_1k_output: f64,

    /// Calls costing more than this (USD) are marked high-cost
    #[arg(long, env = "SIGHTLINE_HIGH_COST_THRESHOLD", default_value_t = 0.01)]
    pub high_cost_threshold: f64,

    /// Tokens estimated per whitespace-delimited word
    #[arg(long, env = "SIGHTLINE_TOKEN_FACTOR", default_value_t = 1.3)]
    pub token_factor: f64,

    /// Telemetry adapters to enable (log, otlp, metrics, eval_log)
    #[arg(long, env = "SIGHTLINE_ADAPTERS", value_delimiter = ',', default_value = "log")]
    pub adapters: Vec<String>,

    /// Adapter-specific setting as name.key=value (repeatable)
    #[arg(long = "adapter-opt", value_name = "NAME.KEY=VALUE")]
    pub adapter_opts: Vec<String>,

    /// OpenTelemetry collector endpoint for spans and metrics
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otel_endpoint: Option<String>,

    /// JSON-lines file for the evaluation log adapter
    #[arg(long, env = "SIGHTLINE_EVAL_LOG")]
    pub eval_log: Option<PathBuf>,

    /// Service name reported to telemetry backends
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "sightline")]
    pub service_name: String,

    /// API key for the generation API
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the generation API
    #[arg(
        long,
        env = "SIGHTLINE_API_BASE",
        default_value = DEFAULT_BASE_URL
    )]
    pub api_base: String,

    /// HTTP timeout for one generation request, in seconds
    #[arg(long, env = "SIGHTLINE_REQUEST_TIMEOUT_SECS", default_value_t = 60)]
    pub request_timeout_secs: u64,

    /// User name (prompted for when omitted)
    #[arg(long, env = "SIGHTLINE_USER")]
    pub user: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Pricing constants for the configured model.
    pub fn pricing(&self) -> Pricing {
        Pricing::new(self.price_per_1k_input, self.price_per_1k_output)
    }

    /// Build the settings map handed to each adapter's `initialize`.
    ///
    /// Shared flags seed the defaults; explicit `--adapter-opt` entries win.
    pub fn adapter_configs(&self) -> Result<BTreeMap<String, AdapterSettings>, ConfigError> {
        let mut configs: BTreeMap<String, AdapterSettings> = BTreeMap::new();

        for name in ["otlp", "metrics"] {
            let settings = configs.entry(name.to_string()).or_default();
            settings.set("service_name", &self.service_name);
            if let Some(endpoint) = &self.otel_endpoint {
                settings.set("endpoint", endpoint);
            }
        }
        if let Some(path) = &self.eval_log {
            configs
                .entry("eval_log".to_string())
                .or_default()
                .set("path", path.display().to_string());
        }

        for opt in &self.adapter_opts {
            let (name, key, value) = parse_adapter_opt(opt)?;
            configs.entry(name.to_string()).or_default().set(key, value);
        }

        Ok(configs)
    }

    /// Create a configuration for testing.
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            adapters: vec!["log".into()],
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash-exp".into(),
            price_per_1k_input: 0.01,
            price_per_1k_output: 0.03,
            high_cost_threshold: 0.01,
            token_factor: 1.3,
            adapters: vec!["log".into()],
            adapter_opts: Vec::new(),
            otel_endpoint: None,
            eval_log: None,
            service_name: "sightline".into(),
            api_key: None,
            api_base: DEFAULT_BASE_URL.into(),
            request_timeout_secs: 60,
            user: None,
            log_level: "warn".into(),
        }
    }
}

fn parse_adapter_opt(opt: &str) -> Result<(&str, &str, &str), ConfigError> {
    let invalid = || ConfigError::AdapterOption(opt.to_string());
    let (path, value) = opt.split_once('=').ok_or_else(invalid)?;
    let (name, key) = path.split_once('.').ok_or_else(invalid)?;
    if name.is_empty() || key.is_empty() {
        return Err(invalid());
    }
    Ok((name.trim(), key.trim(), value))
}

/// Backend-specific key/value settings for one adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterSettings {
    values: BTreeMap<String, String>,
}

impl AdapterSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

//! Per-call instrumentation.
//!
//! [`CallTracer::execute`] is the unit of work: it times one model call,
//! derives token and cost estimates, applies the high-cost marker and hands
//! the finalized record to every active adapter. It never retries.

use std::time::{Instant, SystemTime};
use tracing::Instrument;

use crate::adapter::registry::AdapterRegistry;
use crate::estimate::{Pricing, TokenEstimator, WordCountEstimator};
use crate::llm::LlmClient;
use crate::record::{CallContext, CallRecord};

/// Default high-cost threshold in USD.
pub const DEFAULT_HIGH_COST_THRESHOLD_USD: f64 = 0.01;

/// Wraps model calls with timing, estimates and adapter fan-out.
pub struct CallTracer {
    registry: AdapterRegistry,
    model: String,
    pricing: Pricing,
    estimator: Box<dyn TokenEstimator>,
    high_cost_threshold_usd: f64,
}

impl CallTracer {
    /// Create a tracer with default pricing, estimator and threshold.
    pub fn new(registry: AdapterRegistry, model: impl Into<String>) -> Self {
        Self {
            registry,
            model: model.into(),
            pricing: Pricing::default(),
            estimator: Box::new(WordCountEstimator::default()),
            high_cost_threshold_usd: DEFAULT_HIGH_COST_THRESHOLD_USD,
        }
    }

    #[must_use]
    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    #[must_use]
    pub fn with_estimator(mut self, estimator: impl TokenEstimator + 'static) -> Self {
        self.estimator = Box::new(estimator);
        self
    }

    #[must_use]
    pub fn with_high_cost_threshold(mut self, threshold_usd: f64) -> Self {
        self.high_cost_threshold_usd = threshold_usd;
        self
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn high_cost_threshold(&self) -> f64 {
        self.high_cost_threshold_usd
    }

    /// Execute one call outside any session.
    pub async fn execute<C>(&self, input_text: &str, sequence_number: u64, caller: &C) -> CallRecord
    where
        C: LlmClient + ?Sized,
    {
        let ctx = CallContext {
            sequence_number,
            user_id: String::new(),
            session_id: String::new(),
            model: self.model.clone(),
        };
        self.execute_with(ctx, input_text, caller).await
    }

    /// Execute one call with full session identity.
    ///
    /// The returned record is the same one every adapter received.
    pub async fn execute_with<C>(&self, ctx: CallContext, input_text: &str, caller: &C) -> CallRecord
    where
        C: LlmClient + ?Sized,
    {
        let span = tracing::info_span!(
            "llm-generation",
            sequence = ctx.sequence_number,
            model = %ctx.model,
            success = tracing::field::Empty,
        );

        let mut record = CallRecord::begin(ctx, input_text, SystemTime::now());
        let started = Instant::now();

        let result = caller
            .generate(&record.model, input_text)
            .instrument(span.clone())
            .await;

        record.end_time = SystemTime::now();
        record.latency_seconds = started.elapsed().as_secs_f64();
        record.high_cost_threshold_usd = self.high_cost_threshold_usd;

        match result {
            Ok(output_text) => {
                record.input_tokens_est = self.estimator.estimate(input_text);
                record.output_tokens_est = self.estimator.estimate(&output_text);
                record.cost_estimate_usd = self
                    .pricing
                    .cost(record.input_tokens_est, record.output_tokens_est);
                record.output_text = Some(output_text);
                record.success = true;
                record.high_cost = exceeds_threshold(record.cost_estimate_usd, self.high_cost_threshold_usd);
            }
            Err(e) => {
                record.error_message = Some(e.to_string());
            }
        }
        span.record("success", record.success);

        let delivered = self.registry.record_all(&record);
        tracing::debug!(
            sequence = record.sequence_number,
            delivered,
            active = self.registry.active_count(),
            "Call record dispatched"
        );

        record
    }
}

/// Whether `cost_usd` is strictly above `threshold_usd`.
pub fn exceeds_threshold(cost_usd: f64, threshold_usd: f64) -> bool {
    cost_usd > threshold_usd
}

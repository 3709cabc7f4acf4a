//! Token estimation and cost pricing.
//!
//! The model API is not asked for token counts; they are estimated from
//! text length. The estimator is a trait so a real tokenizer can replace the
//! word-count heuristic without touching the tracer.

/// Estimates the token count of a piece of text.
pub trait TokenEstimator: Send + Sync {
    /// Estimated tokens in `text`. Never negative.
    fn estimate(&self, text: &str) -> f64;
}

/// Default multiplier applied to the whitespace word count.
pub const DEFAULT_TOKEN_FACTOR: f64 = 1.3;

/// Word-count heuristic: `words(text) * factor`.
#[derive(Debug, Clone, Copy)]
pub struct WordCountEstimator {
    factor: f64,
}

impl WordCountEstimator {
    /// Create an estimator with the given multiplier.
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }
}

impl Default for WordCountEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_FACTOR)
    }
}

impl TokenEstimator for WordCountEstimator {
    fn estimate(&self, text: &str) -> f64 {
        word_count(text) as f64 * self.factor
    }
}

/// Count of whitespace-delimited words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Per-model pricing in USD per 1000 tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub per_1k_input: f64,
    pub per_1k_output: f64,
}

impl Pricing {
    pub fn new(per_1k_input: f64, per_1k_output: f64) -> Self {
        Self {
            per_1k_input,
            per_1k_output,
        }
    }

    /// Estimated cost in USD for the given token estimates.
    pub fn cost(&self, input_tokens: f64, output_tokens: f64) -> f64 {
        (input_tokens / 1000.0) * self.per_1k_input + (output_tokens / 1000.0) * self.per_1k_output
    }
}

impl Default for Pricing {
    /// 0.00001 USD per input token, 0.00003 USD per output token.
    fn default() -> Self {
        Self::new(0.01, 0.03)
    }
}

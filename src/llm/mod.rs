//! External model client.
//!
//! The tracer treats the model as an opaque `generate(model, input)` call.
//! [`gemini::GeminiClient`] is the HTTP implementation used by the CLI.

pub mod gemini;

use async_trait::async_trait;

use crate::error::ExternalCallError;

/// A hosted text-generation API.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion for `input` with the named model.
    async fn generate(&self, model: &str, input: &str) -> Result<String, ExternalCallError>;
}

//! Error types.
//!
//! Only [`SessionError`] ends a session. Adapter errors are logged and
//! swallowed, and an [`ExternalCallError`] fails the current call only.

use thiserror::Error;

/// Failure inside a telemetry adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Setup failed; the adapter stays disabled.
    #[error("initialization failed: {0}")]
    Init(String),

    /// Emitting a call record failed.
    #[error("record failed: {0}")]
    Record(String),

    /// Delivering buffered telemetry failed.
    #[error("flush failed: {0}")]
    Flush(String),
}

/// Failure of the outbound model call.
#[derive(Debug, Error)]
pub enum ExternalCallError {
    /// The API answered with a non-success status.
    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never completed (network, TLS, timeout, decode).
    #[error("request failed: {0}")]
    Transport(String),

    /// The API answered but produced no text.
    #[error("model returned no text")]
    EmptyResponse,

    /// Any other failure, carried verbatim.
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for ExternalCallError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Fatal session failure.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The input stream could not be read any further.
    #[error("input stream failed: {0}")]
    Input(#[from] std::io::Error),
}

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An `--adapter-opt` value not shaped like `name.key=value`.
    #[error("invalid adapter option '{0}', expected name.key=value")]
    AdapterOption(String),
}

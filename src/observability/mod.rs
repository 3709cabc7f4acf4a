//! Process-level observability.
//!
//! Provides:
//! - Structured logging to stderr
//! - Optional OpenTelemetry export of the process's own `tracing` spans

pub mod tracing;

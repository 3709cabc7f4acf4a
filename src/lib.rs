//! Sightline: a pluggable telemetry pipeline for request/response LLM calls.
//!
//! Every call to the model is wrapped by a [`tracer::CallTracer`] that times
//! it, estimates tokens and cost, and fans the finalized
//! [`record::CallRecord`] out to every telemetry backend that initialized
//! successfully.
//!
//! # Architecture
//!
//! - **Adapters**: one per backend, all behind [`adapter::Instrumentation`]
//! - **Registry**: keeps only adapters whose initialization succeeded
//! - **Isolation**: a failing adapter never affects the call or its peers
//! - **Single flight**: exactly one call is in progress at a time
//!
//! # Modules
//!
//! - [`adapter`]: Instrumentation trait, registry and backends
//! - [`config`]: CLI and environment configuration
//! - [`error`]: Error taxonomy
//! - [`estimate`]: Token estimation and pricing
//! - [`llm`]: External model client
//! - [`observability`]: Process-level logging and tracing setup
//! - [`record`]: Call records and adapter status
//! - [`session`]: Interactive session loop
//! - [`tracer`]: Per-call instrumentation

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // adapter::log::LogAdapter is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::missing_panics_doc,         // Panic docs can be verbose
    clippy::cast_possible_truncation,   // Token estimates are small
    clippy::cast_precision_loss,        // Word counts fit in f64
    clippy::too_many_lines              // Report rendering is long
)]

pub mod adapter;
pub mod config;
pub mod error;
pub mod estimate;
pub mod llm;
pub mod observability;
pub mod record;
pub mod session;
pub mod tracer;

use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable) identifier.
///
/// Used for call and session IDs so backends can order them by creation time.
///
/// # Example
///
/// ```
/// let id = sightline::generate_id();
/// assert!(id.len() == 36); // UUID string format
/// ```
#[must_use]
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// Convert a wall-clock timestamp to Unix milliseconds.
#[must_use]
pub fn unix_millis(time: std::time::SystemTime) -> i64 {
    time.duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

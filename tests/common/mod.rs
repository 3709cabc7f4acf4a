//! Test utilities for Sightline tests.
//!
//! Provides:
//! - Scripted model clients
//! - Recording and failing adapters
//! - Input stream helpers

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use sightline::adapter::Instrumentation;
use sightline::config::AdapterSettings;
use sightline::error::{AdapterError, ExternalCallError};
use sightline::llm::LlmClient;
use sightline::record::{AdapterStatus, CallRecord};

/// Model client that always answers with the same text.
pub struct FixedReply(pub &'static str);

#[async_trait]
impl LlmClient for FixedReply {
    async fn generate(&self, _model: &str, _input: &str) -> Result<String, ExternalCallError> {
        Ok(self.0.to_string())
    }
}

/// Model client that always fails with the given detail.
pub struct FailingModel(pub &'static str);

#[async_trait]
impl LlmClient for FailingModel {
    async fn generate(&self, _model: &str, _input: &str) -> Result<String, ExternalCallError> {
        Err(ExternalCallError::Other(self.0.to_string()))
    }
}

/// Model client replaying a script of results, then echoing input.
#[derive(Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Result<&str, &str>>) -> Self {
        Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedModel {
    async fn generate(&self, _model: &str, input: &str) -> Result<String, ExternalCallError> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(detail)) => Err(ExternalCallError::Other(detail)),
            None => Ok(input.to_string()),
        }
    }
}

/// What a [`RecordingAdapter`] observed.
#[derive(Default)]
pub struct Recorded {
    pub calls: Mutex<Vec<CallRecord>>,
    pub flushes: Mutex<usize>,
    pub initialized: Mutex<usize>,
}

impl Recorded {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn sequence_numbers(&self) -> Vec<u64> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.sequence_number)
            .collect()
    }

    pub fn flush_count(&self) -> usize {
        *self.flushes.lock().unwrap()
    }
}

/// Adapter that stores every record it receives.
pub struct RecordingAdapter {
    name: &'static str,
    init_error: Option<&'static str>,
    seen: Arc<Recorded>,
}

impl RecordingAdapter {
    pub fn new(name: &'static str) -> (Box<dyn Instrumentation>, Arc<Recorded>) {
        Self::build(name, None)
    }

    /// An adapter whose initialization fails.
    pub fn failing_init(
        name: &'static str,
        error: &'static str,
    ) -> (Box<dyn Instrumentation>, Arc<Recorded>) {
        Self::build(name, Some(error))
    }

    fn build(
        name: &'static str,
        init_error: Option<&'static str>,
    ) -> (Box<dyn Instrumentation>, Arc<Recorded>) {
        let seen = Arc::new(Recorded::default());
        let adapter = Self {
            name,
            init_error,
            seen: seen.clone(),
        };
        (Box::new(adapter), seen)
    }
}

impl Instrumentation for RecordingAdapter {
    fn name(&self) -> &str {
        self.name
    }

    fn initialize(&mut self, _settings: &AdapterSettings) -> AdapterStatus {
        *self.seen.initialized.lock().unwrap() += 1;
        match self.init_error {
            None => AdapterStatus::enabled(self.name),
            Some(error) => AdapterStatus::disabled(self.name, error),
        }
    }

    fn record(&self, call: &CallRecord) -> Result<(), AdapterError> {
        self.seen.calls.lock().unwrap().push(call.clone());
        Ok(())
    }

    fn flush(&self) -> Result<(), AdapterError> {
        *self.seen.flushes.lock().unwrap() += 1;
        Ok(())
    }
}

/// Adapter whose record and flush always fail.
pub struct BrokenAdapter;

impl Instrumentation for BrokenAdapter {
    fn name(&self) -> &str {
        "broken"
    }

    fn initialize(&mut self, _settings: &AdapterSettings) -> AdapterStatus {
        AdapterStatus::enabled("broken")
    }

    fn record(&self, _call: &CallRecord) -> Result<(), AdapterError> {
        Err(AdapterError::Record("collector refused connection".into()))
    }

    fn flush(&self) -> Result<(), AdapterError> {
        Err(AdapterError::Flush("collector refused connection".into()))
    }
}

/// Input stream yielding the given lines.
pub fn lines(inputs: &[&str]) -> impl Stream<Item = io::Result<String>> + Unpin {
    let items: Vec<io::Result<String>> = inputs.iter().map(|s| Ok(s.to_string())).collect();
    stream::iter(items)
}

/// Input stream yielding the given lines, then an I/O error.
pub fn lines_then_error(inputs: &[&str]) -> impl Stream<Item = io::Result<String>> + Unpin {
    let mut items: Vec<io::Result<String>> = inputs.iter().map(|s| Ok(s.to_string())).collect();
    items.push(Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed")));
    stream::iter(items)
}

//! Evaluation log adapter.
//!
//! Appends one JSON object per call to a JSON-lines file in the shape
//! evaluation tools ingest: input, output, metadata and tags.

use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use super::Instrumentation;
use crate::config::AdapterSettings;
use crate::error::AdapterError;
use crate::record::{AdapterStatus, CallRecord};

pub const NAME: &str = "eval_log";

#[derive(Serialize)]
struct EvalTrace<'a> {
    name: &'static str,
    id: &'a str,
    timestamp_ms: i64,
    input: EvalInput<'a>,
    output: EvalOutput<'a>,
    metadata: EvalMetadata<'a>,
    tags: Vec<String>,
}

#[derive(Serialize)]
struct EvalInput<'a> {
    query: &'a str,
    user: &'a str,
}

#[derive(Serialize)]
struct EvalOutput<'a> {
    response: Option<&'a str>,
}

#[derive(Serialize)]
struct EvalMetadata<'a> {
    model: &'a str,
    session_id: &'a str,
    latency_seconds: f64,
    estimated_cost_usd: f64,
    conversation_number: u64,
    input_tokens: i64,
    output_tokens: i64,
    success: bool,
    high_cost: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<'a> EvalTrace<'a> {
    fn from_call(call: &'a CallRecord, project: Option<&str>) -> Self {
        let mut tags = vec![
            call.model.clone(),
            "sightline".to_string(),
            format!("user-{}", call.user_id),
        ];
        if let Some(project) = project {
            tags.push(format!("project-{project}"));
        }

        Self {
            name: "chat-interaction",
            id: &call.call_id,
            timestamp_ms: crate::unix_millis(call.start_time),
            input: EvalInput {
                query: &call.input_text,
                user: &call.user_id,
            },
            output: EvalOutput {
                response: call.output_text.as_deref(),
            },
            metadata: EvalMetadata {
                model: &call.model,
                session_id: &call.session_id,
                latency_seconds: call.latency_seconds,
                estimated_cost_usd: call.cost_estimate_usd,
                conversation_number: call.sequence_number,
                input_tokens: call.input_tokens(),
                output_tokens: call.output_tokens(),
                success: call.success,
                high_cost: call.high_cost,
                error: call.error_message.as_deref(),
            },
            tags,
        }
    }
}

/// Writes call traces to a JSON-lines file.
#[derive(Debug, Default)]
pub struct EvalLogAdapter {
    project: Option<String>,
    writer: Option<Mutex<BufWriter<File>>>,
}

impl EvalLogAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Instrumentation for EvalLogAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn initialize(&mut self, settings: &AdapterSettings) -> AdapterStatus {
        let Some(path) = settings.get("path").map(PathBuf::from) else {
            return AdapterStatus::disabled(NAME, AdapterError::Init("no log path configured".into()));
        };

        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                tracing::info!(path = %path.display(), "Evaluation log opened");
                self.writer = Some(Mutex::new(BufWriter::new(file)));
                self.project = settings.get("project").map(str::to_string);
                AdapterStatus::enabled(NAME)
            }
            Err(e) => AdapterStatus::disabled(
                NAME,
                AdapterError::Init(format!("cannot open {}: {e}", path.display())),
            ),
        }
    }

    fn record(&self, call: &CallRecord) -> Result<(), AdapterError> {
        let writer = self
            .writer
            .as_ref()
            .ok_or_else(|| AdapterError::Record("log file not open".into()))?;

        let trace = EvalTrace::from_call(call, self.project.as_deref());
        let line = serde_json::to_string(&trace).map_err(|e| AdapterError::Record(e.to_string()))?;

        let mut writer = writer
            .lock()
            .map_err(|_| AdapterError::Record("log writer poisoned".into()))?;
        writeln!(writer, "{line}").map_err(|e| AdapterError::Record(e.to_string()))
    }

    fn flush(&self) -> Result<(), AdapterError> {
        let Some(writer) = &self.writer else {
            return Ok(());
        };
        writer
            .lock()
            .map_err(|_| AdapterError::Flush("log writer poisoned".into()))?
            .flush()
            .map_err(|e| AdapterError::Flush(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CallContext;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn call(seq: u64) -> CallRecord {
        let ctx = CallContext {
            sequence_number: seq,
            user_id: "ada".into(),
            session_id: "s-1".into(),
            model: "gemini-2.0-flash-exp".into(),
        };
        let mut call = CallRecord::begin(ctx, "what is rust", SystemTime::now());
        call.success = true;
        call.output_text = Some("a systems language".into());
        call.input_tokens_est = 3.9;
        call.output_tokens_est = 3.9;
        call
    }

    #[test]
    fn test_missing_path_disables() {
        let mut adapter = EvalLogAdapter::new();
        let status = adapter.initialize(&AdapterSettings::new());
        assert!(!status.enabled);
        assert!(status.init_error.unwrap().contains("path"));
    }

    #[test]
    fn test_unopenable_path_disables() {
        let dir = TempDir::new().unwrap();
        let settings =
            AdapterSettings::new().with("path", dir.path().join("missing/calls.jsonl").display().to_string());
        let mut adapter = EvalLogAdapter::new();
        assert!(!adapter.initialize(&settings).enabled);
    }

    #[test]
    fn test_writes_one_line_per_call() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calls.jsonl");
        let settings = AdapterSettings::new()
            .with("path", path.display().to_string())
            .with("project", "demo");

        let mut adapter = EvalLogAdapter::new();
        assert!(adapter.initialize(&settings).enabled);
        adapter.record(&call(1)).unwrap();
        adapter.record(&call(2)).unwrap();
        adapter.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["input"]["query"], "what is rust");
        assert_eq!(lines[0]["output"]["response"], "a systems language");
        assert_eq!(lines[1]["metadata"]["conversation_number"], 2);
        assert_eq!(lines[0]["metadata"]["input_tokens"], 3);
        assert!(lines[0]["metadata"].get("error").is_none());
        let tags: Vec<&str> = lines[0]["tags"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t.as_str().unwrap())
            .collect();
        assert!(tags.contains(&"user-ada"));
        assert!(tags.contains(&"project-demo"));
    }
}

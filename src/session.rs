//! Interactive session loop.
//!
//! A session reads one input at a time, runs it through the [`CallTracer`],
//! writes a human-readable report and flushes every adapter exactly once
//! when the user quits or the input ends.

use futures::{Stream, StreamExt};
use std::io::{self, Write};

use crate::error::SessionError;
use crate::llm::LlmClient;
use crate::record::{AdapterStatus, CallContext, CallRecord};
use crate::tracer::CallTracer;

/// Inputs that end a session (compared case-insensitively).
pub const EXIT_COMMANDS: &[&str] = &["quit", "exit", "q"];

/// Whether `line` is one of the exit sentinels.
pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    EXIT_COMMANDS.iter().any(|cmd| line.eq_ignore_ascii_case(cmd))
}

/// One continuous run of calls sharing a user and a sequence counter.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    sequence_count: u64,
    statuses: Vec<AdapterStatus>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, statuses: Vec<AdapterStatus>) -> Self {
        Self {
            session_id: crate::generate_id(),
            user_id: user_id.into(),
            sequence_count: 0,
            statuses,
        }
    }

    /// Number of calls issued so far.
    pub fn sequence_count(&self) -> u64 {
        self.sequence_count
    }

    /// Adapter statuses captured at session start.
    pub fn statuses(&self) -> &[AdapterStatus] {
        &self.statuses
    }

    /// Advance the counter and return the new sequence number (starts at 1).
    fn next_sequence(&mut self) -> u64 {
        self.sequence_count += 1;
        self.sequence_count
    }
}

/// What a finished session did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: String,
    pub user_id: String,
    pub interactions: u64,
    pub failures: u64,
}

/// Drives a session over a stream of input lines.
pub struct SessionRunner<C> {
    tracer: CallTracer,
    client: C,
}

impl<C: LlmClient> SessionRunner<C> {
    pub fn new(tracer: CallTracer, client: C) -> Self {
        Self { tracer, client }
    }

    pub fn tracer(&self) -> &CallTracer {
        &self.tracer
    }

    /// Run until an exit command or the end of `inputs`.
    ///
    /// Adapters are flushed exactly once before returning, including when
    /// the input stream fails.
    pub async fn run<S, W>(
        &self,
        mut inputs: S,
        user_id: &str,
        out: &mut W,
    ) -> Result<SessionSummary, SessionError>
    where
        S: Stream<Item = io::Result<String>> + Unpin,
        W: Write,
    {
        let mut session = Session::new(user_id, self.tracer.registry().statuses().to_vec());
        let mut failures = 0;
        tracing::info!(session_id = %session.session_id, user = %user_id, "Session started");

        loop {
            write_or_log(out, |out| {
                write!(out, "\n[Q{}] You: ", session.sequence_count() + 1)?;
                out.flush()
            });

            let line = match inputs.next().await {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Input stream failed, flushing telemetry");
                    self.tracer.registry().flush_all();
                    return Err(SessionError::Input(e));
                }
                None => break,
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            if is_exit_command(input) {
                break;
            }

            let ctx = CallContext {
                sequence_number: session.next_sequence(),
                user_id: session.user_id.clone(),
                session_id: session.session_id.clone(),
                model: self.tracer.model().to_string(),
            };
            let record = self.tracer.execute_with(ctx, input, &self.client).await;
            if !record.success {
                failures += 1;
            }

            write_or_log(out, |out| write_report(out, &record, session.statuses()));
        }

        write_or_log(out, |out| writeln!(out, "\n\nFlushing telemetry..."));
        let flushed = self.tracer.registry().flush_all();
        tracing::info!(
            session_id = %session.session_id,
            interactions = session.sequence_count(),
            flushed,
            "Session ended"
        );

        Ok(SessionSummary {
            session_id: session.session_id,
            user_id: session.user_id,
            interactions: session.sequence_count,
            failures,
        })
    }
}

fn write_or_log<W, F>(out: &mut W, f: F)
where
    W: Write,
    F: FnOnce(&mut W) -> io::Result<()>,
{
    if let Err(e) = f(out) {
        tracing::warn!(error = %e, "Failed to write session output");
    }
}

/// Write the human-readable report for one finished call.
pub fn write_report<W: Write>(
    out: &mut W,
    record: &CallRecord,
    statuses: &[AdapterStatus],
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(70))?;
    writeln!(out, "Query #{}", record.sequence_number)?;
    writeln!(out, "{}", "=".repeat(70))?;

    match (&record.output_text, &record.error_message) {
        (Some(output), _) => {
            writeln!(out, "Bot:")?;
            writeln!(out, "   {output}")?;
        }
        (None, Some(error)) => writeln!(out, "Error: {error}")?,
        (None, None) => writeln!(out, "Error: no response")?,
    }

    writeln!(out)?;
    writeln!(out, "Telemetry:")?;
    if statuses.is_empty() {
        writeln!(out, "   (no adapters registered)")?;
    }
    for status in statuses {
        if status.enabled {
            writeln!(out, "   [ok]  {:<10} recorded", status.name)?;
        } else {
            writeln!(
                out,
                "   [off] {:<10} {}",
                status.name,
                status.init_error.as_deref().unwrap_or("disabled")
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Metrics:")?;
    writeln!(out, "   Latency:        {:.3}s", record.latency_seconds)?;
    if record.success {
        writeln!(out, "   Input tokens:   ~{}", record.input_tokens())?;
        writeln!(out, "   Output tokens:  ~{}", record.output_tokens())?;
        writeln!(out, "   Est. Cost:      ${:.6}", record.cost_estimate_usd)?;
    }
    if record.high_cost {
        writeln!(
            out,
            "\n   HIGH COST ALERT! (>${})",
            record.high_cost_threshold_usd
        )?;
    }
    Ok(())
}

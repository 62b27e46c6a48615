//! Stream splicing state machine.
//!
//! ```text
//! AwaitingFirstStream → RelayingPassthrough ──(no tool call)──────────────────────→ Done
//!                              │
//!                              └→ ToolDetected → Dispatching → AwaitingSecondStream
//!                                                               → RelayingSecond → Done
//! any state ──→ Error
//! ```
//!
//! Stream-1 relay strictly precedes dispatch, which strictly precedes stream-2
//! relay. Exactly one dispatch can happen per request; a tool call inside the
//! second stream is relayed like any other byte.

use super::{Orchestrator, RelaySink};
use crate::pipeline::{FragmentReader, FragmentSource, StreamUnit, ToolCallDetector};
use crate::types::{ToolCallRequest, ENQUEUE_COMMAND};
use crate::{Error, Result};
use futures::StreamExt;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpliceState {
    AwaitingFirstStream,
    RelayingPassthrough,
    ToolDetected,
    Dispatching,
    AwaitingSecondStream,
    RelayingSecond,
    Done,
    Error,
}

/// What happened to one streaming request.
#[derive(Debug, Clone)]
pub struct SpliceReport {
    pub request_id: Uuid,
    /// `Done` or `Error`.
    pub state: SpliceState,
    /// Stream-1 lines written to the client, tool-call line included.
    pub relayed_units: usize,
    /// Stream-2 fragments written to the client.
    pub relayed_fragments: usize,
    pub tool_call: Option<ToolCallRequest>,
    /// Display text of the failure when `state` is `Error`.
    pub error: Option<String>,
}

/// Per-request machine state. Lives for exactly one request.
pub(crate) struct Splice<'a> {
    orchestrator: &'a Orchestrator,
    prompt: &'a str,
    sink: RelaySink,
    state: SpliceState,
    report: SpliceReport,
}

impl<'a> Splice<'a> {
    pub(crate) fn new(
        orchestrator: &'a Orchestrator,
        prompt: &'a str,
        sink: RelaySink,
        request_id: Uuid,
    ) -> Self {
        Self {
            orchestrator,
            prompt,
            sink,
            state: SpliceState::AwaitingFirstStream,
            report: SpliceReport {
                request_id,
                state: SpliceState::AwaitingFirstStream,
                relayed_units: 0,
                relayed_fragments: 0,
                tool_call: None,
                error: None,
            },
        }
    }

    fn enter(&mut self, next: SpliceState) {
        debug!(
            request_id = %self.report.request_id,
            from = ?self.state,
            to = ?next,
            "splice transition"
        );
        self.state = next;
    }

    /// Drive the machine to a terminal state. The sink is dropped on return,
    /// which ends the client's response body.
    pub(crate) async fn run<S: FragmentSource>(mut self, first: S) -> SpliceReport {
        match self.drive(first).await {
            Ok(()) => self.enter(SpliceState::Done),
            Err(err) => {
                self.enter(SpliceState::Error);
                if err.is_disconnect() {
                    debug!(request_id = %self.report.request_id, "client went away; stopping");
                } else {
                    warn!(request_id = %self.report.request_id, error = %err, "splice failed");
                    if !self.sink.is_closed() {
                        // Headers are already out; the diagnostic goes inline.
                        let _ = self.sink.send(format!("\n\n{}\n", err)).await;
                    }
                }
                self.report.error = Some(err.to_string());
            }
        }
        self.report.state = self.state;
        self.report
    }

    async fn drive<S: FragmentSource>(&mut self, first: S) -> Result<()> {
        self.enter(SpliceState::RelayingPassthrough);
        let Some(call) = self.relay_first(first).await? else {
            return Ok(());
        };

        self.enter(SpliceState::ToolDetected);
        self.report.tool_call = Some(call.clone());
        let command = command_of(&call)?;

        self.enter(SpliceState::Dispatching);
        let payload = self.orchestrator.executor.dispatch(&command).await?;

        self.enter(SpliceState::AwaitingSecondStream);
        let messages = super::conversation::build(self.prompt, &call, &payload)?;
        let second = self.orchestrator.chat.open_stream(&messages, None).await?;

        self.enter(SpliceState::RelayingSecond);
        let mut fragments = FragmentReader::new(second).into_stream();
        while let Some(fragment) = fragments.next().await {
            self.sink.send(fragment?).await?;
            self.report.relayed_fragments += 1;
        }
        Ok(())
    }

    /// Relay stream 1 line by line until a tool call shows up or the source
    /// runs dry. Nothing after the tool-call line is read.
    async fn relay_first<S: FragmentSource>(
        &mut self,
        mut source: S,
    ) -> Result<Option<ToolCallRequest>> {
        let mut detector = ToolCallDetector::new(self.orchestrator.line_splitting);

        while let Some(fragment) = source.next_fragment().await? {
            let units = detector.scan(&fragment);
            if let Some(call) = self.forward(units).await? {
                return Ok(Some(call));
            }
        }

        let tail = detector.finish();
        self.forward(tail).await
    }

    async fn forward(&mut self, units: Vec<StreamUnit>) -> Result<Option<ToolCallRequest>> {
        for unit in units {
            match unit {
                StreamUnit::Passthrough(line) => {
                    self.sink.send_line(&line).await?;
                    self.report.relayed_units += 1;
                }
                StreamUnit::ToolCall { line, call } => {
                    self.sink.send_line(&line).await?;
                    self.report.relayed_units += 1;
                    return Ok(Some(call));
                }
            }
        }
        Ok(None)
    }
}

/// The command to run for a detected call, or why there is none.
fn command_of(call: &ToolCallRequest) -> Result<String> {
    if call.name() != ENQUEUE_COMMAND {
        return Err(Error::ToolArgument(format!(
            "unsupported tool: {:?}",
            call.name()
        )));
    }
    call.command()
        .ok_or_else(|| Error::ToolArgument("tool called without command".to_string()))
}

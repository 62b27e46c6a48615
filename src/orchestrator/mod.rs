//! 编排模块：拦截工具调用并拼接两段流式响应。
//!
//! # Orchestrator
//!
//! Ties the chat client, the stream pipeline and the execution dispatcher
//! together. Two entry points mirror the two inbound endpoints:
//!
//! - [`Orchestrator::ask`]: non-streaming; at most one dispatch, answers with
//!   the final chat document or an error payload.
//! - [`Orchestrator::open_first_stream`] + [`Orchestrator::relay`]: streaming;
//!   runs the [`SpliceState`] machine, writing to a [`RelaySink`].
//!
//! Each request runs its own independent machine; the orchestrator itself is
//! read-only and shared behind an `Arc`.

pub mod conversation;
mod sink;
mod splice;

pub use sink::{RelayItem, RelaySink};
pub use splice::{SpliceReport, SpliceState};

use crate::client::ChatClient;
use crate::config::BridgeConfig;
use crate::dispatch::{CommandExecutor, ExecutionDispatcher};
use crate::pipeline::{BodySource, FragmentReader, LineSplitting};
use crate::types::{ChatMessage, StreamChunk, ToolDefinition, ENQUEUE_COMMAND};
use crate::{Error, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of a non-streaming ask.
#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    /// Final chat service document (after the tool round-trip, if any).
    Final(Value),
    /// The request finished without an answer; reported as an error payload.
    Rejected { error: String, raw: Option<Value> },
}

pub struct Orchestrator {
    chat: ChatClient,
    executor: Arc<dyn CommandExecutor>,
    tools: Vec<ToolDefinition>,
    line_splitting: LineSplitting,
}

impl Orchestrator {
    pub fn new(chat: ChatClient, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            chat,
            executor,
            tools: vec![ToolDefinition::enqueue_command()],
            line_splitting: LineSplitting::default(),
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let chat = ChatClient::from_config(config)?;
        let executor = Arc::new(ExecutionDispatcher::from_config(config)?);
        Ok(Self::new(chat, executor).with_line_splitting(config.line_splitting))
    }

    pub fn with_line_splitting(mut self, splitting: LineSplitting) -> Self {
        self.line_splitting = splitting;
        self
    }

    /// Open stream 1: the prompt plus the tool schema, streaming enabled.
    ///
    /// Called before any response headers are sent, so failures here can
    /// still become a structured HTTP error.
    pub async fn open_first_stream(&self, prompt: &str) -> Result<BodySource> {
        let messages = [ChatMessage::user(prompt)];
        self.chat.open_stream(&messages, Some(self.tools.as_slice())).await
    }

    /// Run the splice machine over an already-opened stream 1.
    ///
    /// Never fails: errors end in [`SpliceState::Error`] with an inline
    /// diagnostic, and the sink is closed when this returns.
    pub async fn relay(&self, prompt: &str, first: BodySource, sink: RelaySink) -> SpliceReport {
        let request_id = Uuid::new_v4();
        let report = splice::Splice::new(self, prompt, sink, request_id)
            .run(FragmentReader::new(first))
            .await;
        info!(
            request_id = %report.request_id,
            state = ?report.state,
            relayed_units = report.relayed_units,
            relayed_fragments = report.relayed_fragments,
            dispatched = report.tool_call.is_some(),
            "stream finished"
        );
        report
    }

    /// Non-streaming round trip.
    pub async fn ask(&self, prompt: &str) -> Result<AskOutcome> {
        let messages = [ChatMessage::user(prompt)];
        let response = self
            .chat
            .complete(&messages, Some(self.tools.as_slice()))
            .await?;
        let first = StreamChunk::new(response);

        let call = match first.first_tool_call() {
            Some(call) if call.name() == ENQUEUE_COMMAND => call,
            Some(call) => {
                warn!(tool = call.name(), "ignoring call to unknown tool");
                return Ok(AskOutcome::Final(first.into_value()));
            }
            None => return Ok(AskOutcome::Final(first.into_value())),
        };

        let Some(command) = call.command() else {
            return Ok(AskOutcome::Rejected {
                error: "tool called without command".to_string(),
                raw: None,
            });
        };

        let payload = match self.executor.dispatch(&command).await {
            Ok(payload) => payload,
            Err(Error::Dispatch { message, raw }) => {
                return Ok(AskOutcome::Rejected {
                    error: message,
                    raw,
                })
            }
            Err(err @ Error::Timeout { .. }) => {
                return Ok(AskOutcome::Rejected {
                    error: err.to_string(),
                    raw: None,
                })
            }
            Err(err) => return Err(err),
        };

        let follow_up = conversation::build(prompt, &call, &payload)?;
        let answer = self.chat.complete(&follow_up, None).await?;
        Ok(AskOutcome::Final(answer))
    }
}

//! Streamed chat chunks

use super::tool::ToolCallRequest;
use serde_json::Value;
use tracing::warn;

/// One decoded JSON document from a newline-delimited chat stream.
///
/// The raw document is kept as-is: chunks are relayed to the client verbatim,
/// so the bridge only peeks at the handful of fields it cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamChunk {
    raw: Value,
}

impl StreamChunk {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// Parse a single stream line.
    pub fn parse(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line).map(Self::new)
    }

    /// Incremental answer text (`message.content`).
    pub fn content(&self) -> Option<&str> {
        self.raw.pointer("/message/content").and_then(Value::as_str)
    }

    /// Incremental reasoning text (`message.thinking`).
    pub fn thinking(&self) -> Option<&str> {
        self.raw.pointer("/message/thinking").and_then(Value::as_str)
    }

    /// `message.tool_calls`, only when it is a non-empty array.
    pub fn tool_calls(&self) -> Option<&[Value]> {
        self.raw
            .pointer("/message/tool_calls")
            .and_then(Value::as_array)
            .filter(|calls| !calls.is_empty())
            .map(Vec::as_slice)
    }

    /// Element 0 of `message.tool_calls`; later elements are never honored.
    ///
    /// An element that is not shaped like a tool call still counts as a
    /// detection and comes back as an empty call, which fails argument lookup.
    pub fn first_tool_call(&self) -> Option<ToolCallRequest> {
        let first = self.tool_calls()?.first()?;
        match serde_json::from_value(first.clone()) {
            Ok(call) => Some(call),
            Err(e) => {
                warn!(error = %e, "tool call element has an unexpected shape");
                Some(ToolCallRequest::default())
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.raw.get("done").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn as_value(&self) -> &Value {
        &self.raw
    }

    pub fn into_value(self) -> Value {
        self.raw
    }
}

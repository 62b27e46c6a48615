//! Follow-up conversation assembly.

use crate::types::{ChatMessage, ToolCallRequest, ENQUEUE_COMMAND};
use crate::Result;
use serde_json::Value;

/// Build the message list that seeds the second chat call.
///
/// Always exactly three turns: the user prompt, an empty assistant turn that
/// carries the detected call, and the tool result serialized as JSON text.
/// The chat service pairs the tool turn with the call through this shape.
pub fn build(prompt: &str, call: &ToolCallRequest, payload: &Value) -> Result<Vec<ChatMessage>> {
    Ok(vec![
        ChatMessage::user(prompt),
        ChatMessage::assistant_tool_calls(vec![call.clone()]),
        ChatMessage::tool(ENQUEUE_COMMAND, serde_json::to_string(payload)?),
    ])
}

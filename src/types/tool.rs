//! Tool calling definitions

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Name of the single capability advertised to the model.
pub const ENQUEUE_COMMAND: &str = "enqueueCommand";

/// Tool definition (for function calling)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String, // "function"
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: Option<String>,
    pub parameters: Option<Value>, // JSON Schema
}

impl ToolDefinition {
    /// Schema for `enqueueCommand`: one required `command` string.
    pub fn enqueue_command() -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: ENQUEUE_COMMAND.to_string(),
                description: Some("Enqueue a shell command on the execution host.".to_string()),
                parameters: Some(json!({
                    "type": "object",
                    "required": ["command"],
                    "properties": {
                        "command": { "type": "string", "description": "Command to run" }
                    }
                })),
            },
        }
    }
}

/// Tool call as emitted by the chat service.
///
/// Unknown fields are kept in `extra` so the call can be echoed back to the
/// service unchanged when the follow-up conversation is assembled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Opaque reference; not interpreted by the bridge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub function: FunctionCall,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default)]
    pub name: String,
    /// Usually an object; some services send a JSON-encoded string instead.
    #[serde(default)]
    pub arguments: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolCallRequest {
    /// Build a call to `name` with object arguments.
    pub fn function(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: None,
            function: FunctionCall {
                name: name.into(),
                arguments,
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Look up a string argument, decoding string-encoded arguments if needed.
    pub fn argument(&self, key: &str) -> Option<String> {
        match &self.function.arguments {
            Value::Object(map) => map.get(key).and_then(Value::as_str).map(str::to_owned),
            Value::String(raw) => serde_json::from_str::<Value>(raw)
                .ok()?
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_owned),
            _ => None,
        }
    }

    /// The non-empty `command` argument, if present.
    pub fn command(&self) -> Option<String> {
        self.argument("command").filter(|c| !c.is_empty())
    }
}

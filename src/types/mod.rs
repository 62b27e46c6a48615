//! 类型系统模块：桥接服务的核心数据类型。
//!
//! # Types Module
//!
//! Strongly-typed views of what flows through the bridge: chat messages sent
//! to the chat service, the tool schema and tool calls it exchanges, streamed
//! chunks, and the execution service's job records.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChatMessage`] | Conversation turn (user, assistant, tool) |
//! | [`ToolDefinition`] | Tool schema advertised to the model |
//! | [`ToolCallRequest`] | Tool invocation emitted by the model |
//! | [`StreamChunk`] | One decoded line of a streamed chat response |
//! | [`EnqueueResult`] / [`JobResult`] | Execution service responses |

pub mod events;
pub mod job;
pub mod message;
pub mod tool;

pub use events::StreamChunk;
pub use job::{EnqueueResult, JobResult, JobStatus};
pub use message::{ChatMessage, ChatRequest, MessageRole};
pub use tool::{FunctionCall, ToolCallRequest, ToolDefinition, ENQUEUE_COMMAND};

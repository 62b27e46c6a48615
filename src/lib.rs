//! # tool-bridge
//!
//! 工具调用桥接服务：拦截模型的工具调用，在远程执行主机上运行命令，并把结果拼接回流式回答。
//!
//! A chat bridge that lets a language model run shell commands on a separate,
//! trusted execution host. The bridge streams the model's answer to the
//! client, intercepts the first tool call in that stream, runs the command
//! through the execution service, and splices a second model answer (seeded
//! with the command's result) onto the same client response.
//!
//! ## Flow
//!
//! ```text
//! client ──POST /api/ask-stream──▶ Orchestrator
//!   stream 1  chat service ─▶ FragmentReader ─▶ ToolCallDetector ─▶ relay lines
//!   dispatch  ExecutionDispatcher: enqueue ─▶ poll until done / deadline
//!   stream 2  chat service (user, assistant tool call, tool result) ─▶ relay bytes
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Startup configuration from environment |
//! | [`client`] | Chat service client |
//! | [`dispatch`] | Execution service enqueue + poll |
//! | [`pipeline`] | Body decoding and tool-call detection |
//! | [`orchestrator`] | Stream splicing state machine and conversation assembly |
//! | [`server`] | axum routes |
//! | [`types`] | Messages, tool calls, stream chunks, job records |

pub mod client;
pub mod config;
pub mod dispatch;
pub mod orchestrator;
pub mod pipeline;
pub mod server;
pub mod transport;
pub mod types;

pub use client::ChatClient;
pub use config::BridgeConfig;
pub use dispatch::{CommandExecutor, ExecutionDispatcher, PollPolicy};
pub use orchestrator::{AskOutcome, Orchestrator, RelaySink, SpliceReport, SpliceState};
pub use types::{ChatMessage, MessageRole, ToolCallRequest};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A specialized Result for pipeline operations
pub type PipeResult<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `PipeResult<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = PipeResult<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};

//! 流水线模块：流式响应的解码与工具调用检测。
//!
//! # Stream Pipeline
//!
//! Turns an upstream response body into text fragments and picks the first
//! tool call out of a newline-delimited JSON stream.
//!
//! ```text
//! Body (reader | chunks | whole) → FragmentReader → ToolCallDetector → StreamUnit
//!                                   UTF-8 text        split + parse      Passthrough /
//!                                                                        ToolCall
//! ```
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`decode`] | Body source adapters and incremental UTF-8 decoding |
//! | [`detect`] | Line splitting, JSON parsing, one-shot tool-call detection |

pub mod decode;
pub mod detect;


pub use decode::{BodySource, FragmentReader, Utf8Decoder};
pub use detect::{LineSplitting, StreamUnit, ToolCallDetector};

use crate::Result;

/// Anything that yields decoded text fragments until it signals the end.
#[async_trait::async_trait]
pub trait FragmentSource: Send {
    /// Next fragment, or `None` once the body is exhausted.
    async fn next_fragment(&mut self) -> Result<Option<String>>;
}

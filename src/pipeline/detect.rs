//! Tool-call detection over newline-delimited JSON fragments.

use crate::types::{StreamChunk, ToolCallRequest};
use crate::Error;
use tracing::warn;

/// How fragments are cut into candidate JSON lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineSplitting {
    /// Each fragment is split on its own. A line cut across two fragments
    /// yields two unparseable halves, which are skipped.
    #[default]
    PerFragment,
    /// A trailing partial line is carried into the next fragment and flushed
    /// at end of stream.
    Buffered,
}

/// A parsed line handed back to the relay, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamUnit {
    /// Not a tool call; forward the line as-is.
    Passthrough(String),
    /// The first line carrying a non-empty `message.tool_calls`.
    ToolCall {
        line: String,
        call: ToolCallRequest,
    },
}

/// One-shot tool-call detector.
///
/// Once a tool call has been seen the detector goes quiet: every later
/// fragment, including the rest of the fragment that contained the call,
/// is ignored.
#[derive(Debug, Default)]
pub struct ToolCallDetector {
    splitting: LineSplitting,
    carry: String,
    detected: bool,
}

impl ToolCallDetector {
    pub fn new(splitting: LineSplitting) -> Self {
        Self {
            splitting,
            carry: String::new(),
            detected: false,
        }
    }

    pub fn is_detected(&self) -> bool {
        self.detected
    }

    /// Classify the lines of one decoded fragment.
    pub fn scan(&mut self, fragment: &str) -> Vec<StreamUnit> {
        if self.detected {
            return Vec::new();
        }

        let lines: Vec<String> = match self.splitting {
            LineSplitting::PerFragment => fragment
                .split('\n')
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect(),
            LineSplitting::Buffered => {
                self.carry.push_str(fragment);
                let mut lines = Vec::new();
                while let Some(idx) = self.carry.find('\n') {
                    let line: String = self.carry.drain(..=idx).collect();
                    let line = line.trim_end_matches('\n');
                    if !line.is_empty() {
                        lines.push(line.to_owned());
                    }
                }
                lines
            }
        };

        self.classify(lines)
    }

    /// End of stream: flush a buffered trailing line, if any.
    pub fn finish(&mut self) -> Vec<StreamUnit> {
        if self.detected || self.carry.is_empty() {
            return Vec::new();
        }
        let line = std::mem::take(&mut self.carry);
        self.classify(vec![line])
    }

    fn classify(&mut self, lines: Vec<String>) -> Vec<StreamUnit> {
        let mut units = Vec::with_capacity(lines.len());
        for line in lines {
            let chunk = match StreamChunk::parse(&line) {
                Ok(chunk) => chunk,
                Err(source) => {
                    let err = Error::MalformedChunk { line, source };
                    warn!(error = %err, "skipping stream unit");
                    continue;
                }
            };

            if let Some(call) = chunk.first_tool_call() {
                self.detected = true;
                self.carry.clear();
                units.push(StreamUnit::ToolCall { line, call });
                break;
            }
            units.push(StreamUnit::Passthrough(line));
        }
        units
    }
}

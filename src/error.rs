use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for configuration failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Setting or header that caused the error (e.g., "BRIDGE_CHAT_URL", "x-api-key")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config", "http_transport")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the bridge.
///
/// Variants map onto how a failure is surfaced: upstream and transport
/// failures before streaming starts become HTTP 500 bodies, dispatch and
/// tool-argument failures become inline diagnostics or error payloads, and
/// malformed stream units are only ever logged.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    /// Non-2xx or unparseable response from the chat service.
    #[error("Chat service error {status}: {body}")]
    UpstreamChat { status: u16, body: String },

    /// Enqueue failed or returned no job identifier.
    #[error("Dispatch error: {message}")]
    Dispatch {
        message: String,
        /// Raw enqueue response, when one was received.
        raw: Option<serde_json::Value>,
    },

    #[error("Timed out waiting for job {job_id} after {timeout_ms}ms")]
    Timeout { job_id: String, timeout_ms: u64 },

    #[error("Tool argument error: {0}")]
    ToolArgument(String),

    #[error("Malformed stream chunk {line:?}: {source}")]
    MalformedChunk {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    /// The client side of a streaming response went away.
    #[error("Client disconnected")]
    ClientDisconnected,

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Shorthand for a dispatch failure without a raw response.
    pub fn dispatch(msg: impl Into<String>) -> Self {
        Error::Dispatch {
            message: msg.into(),
            raw: None,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Whether this error means the output channel can no longer be written.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Error::ClientDisconnected)
    }
}

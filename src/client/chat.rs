use crate::config::BridgeConfig;
use crate::pipeline::BodySource;
use crate::transport::HttpTransport;
use crate::types::{ChatMessage, ChatRequest, ToolDefinition};
use crate::{Error, Result};
use serde_json::Value;
use tracing::{debug, warn};

const CHAT_PATH: &str = "/chat";

/// Client for the chat-completion service.
///
/// No request timeout is applied: an unresponsive service holds the call open.
pub struct ChatClient {
    transport: HttpTransport,
    model: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(base_url)?,
            model: model.into(),
        })
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::with_pool(&config.chat_base_url, config.http_pool)?,
            model: config.model.clone(),
        })
    }

    async fn send(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
        stream: bool,
    ) -> Result<reqwest::Response> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            tools,
            stream,
        };
        debug!(
            model = %self.model,
            messages = messages.len(),
            with_tools = tools.is_some(),
            stream,
            "chat request"
        );

        let response = self.transport.post_json(CHAT_PATH, &request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "chat service returned an error");
            return Err(Error::UpstreamChat {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Non-streaming completion; the whole answer as one JSON document.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<Value> {
        let response = self.send(messages, tools, false).await?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| Error::UpstreamChat {
            status,
            body: format!("failed to read response body: {e}"),
        })?;
        serde_json::from_str(&text).map_err(|e| Error::UpstreamChat {
            status,
            body: format!("invalid JSON ({e}): {text}"),
        })
    }

    /// Streaming completion; the body is handed back unread.
    pub async fn open_stream(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<BodySource> {
        let response = self.send(messages, tools, true).await?;
        Ok(BodySource::from_response(response))
    }
}

//! Mock HTTP servers for the chat and execution services

use mockito::{Matcher, Mock, Server, ServerGuard};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tool_bridge::{ChatClient, ExecutionDispatcher, PollPolicy};

pub const TEST_API_KEY: &str = "test-key";
pub const TEST_MODEL: &str = "test-model";

/// Test fixture that manages one mock server per upstream service
pub struct MockServerFixture {
    pub chat: Arc<Mutex<ServerGuard>>,
    pub exec: Arc<Mutex<ServerGuard>>,
    pub chat_url: String,
    pub exec_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let chat = Server::new_async().await;
        let exec = Server::new_async().await;
        let chat_url = chat.url();
        let exec_url = exec.url();
        Self {
            chat: Arc::new(Mutex::new(chat)),
            exec: Arc::new(Mutex::new(exec)),
            chat_url,
            exec_url,
        }
    }

    pub fn chat_client(&self) -> ChatClient {
        ChatClient::new(&self.chat_url, TEST_MODEL).expect("chat client")
    }

    /// Dispatcher with a short poll cadence so tests stay fast
    pub fn dispatcher(&self) -> ExecutionDispatcher {
        ExecutionDispatcher::new(&self.exec_url, Some(TEST_API_KEY))
            .expect("dispatcher")
            .with_policy(PollPolicy {
                timeout: Duration::from_secs(2),
                interval: Duration::from_millis(10),
            })
    }

    /// Mock `POST /enqueue` answering with `body`
    pub async fn mock_enqueue(&self, body: &str) -> Mock {
        let mut server = self.exec.lock().await;
        server
            .mock("POST", "/enqueue")
            .match_header("x-api-key", TEST_API_KEY)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Mock `GET /result/{job_id}` answering with `body`
    pub async fn mock_result(&self, job_id: &str, body: &str) -> Mock {
        let mut server = self.exec.lock().await;
        server
            .mock("GET", format!("/result/{}", job_id).as_str())
            .match_header("x-api-key", TEST_API_KEY)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Mock a streaming `POST /chat` whose request body matches `matcher`
    pub async fn mock_chat_stream(&self, matcher: Matcher, lines: &[&str]) -> Mock {
        let body = lines
            .iter()
            .map(|line| format!("{}\n", line))
            .collect::<String>();
        let mut server = self.chat.lock().await;
        server
            .mock("POST", "/chat")
            .match_body(matcher)
            .with_status(200)
            .with_header("content-type", "application/x-ndjson")
            .with_body(body)
            .create_async()
            .await
    }

    /// Mock a non-streaming `POST /chat` (or an error answer)
    pub async fn mock_chat_json(&self, matcher: Matcher, status: usize, body: &str) -> Mock {
        let mut server = self.chat.lock().await;
        server
            .mock("POST", "/chat")
            .match_body(matcher)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}

/// Matches the first call: tools advertised
pub fn first_call(stream: bool) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::PartialJson(serde_json::json!({ "stream": stream, "model": TEST_MODEL })),
        Matcher::Regex(r#""tools":"#.to_string()),
    ])
}

/// Matches the follow-up call: carries a tool result turn
pub fn follow_up_call(stream: bool) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::PartialJson(serde_json::json!({ "stream": stream })),
        Matcher::Regex(r#""role":"tool""#.to_string()),
    ])
}

//! Inbound HTTP surface, driven through the router without a socket

use crate::integration::mock_server::{first_call, follow_up_call, MockServerFixture};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tool_bridge::{server, Orchestrator};
use tower::ServiceExt;

const LIST_FILES: &str = r#"{"message":{"role":"assistant","content":"","tool_calls":[{"function":{"name":"enqueueCommand","arguments":{"command":"ls"}}}]},"done":false}"#;

fn router(fixture: &MockServerFixture) -> Router {
    let orchestrator = Orchestrator::new(fixture.chat_client(), Arc::new(fixture.dispatcher()));
    server::build_router(Arc::new(orchestrator))
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn test_missing_prompt_is_400() {
    let fixture = MockServerFixture::new().await;

    for uri in ["/api/ask", "/api/ask-stream"] {
        for body in ["{}", r#"{"prompt":""}"#, "not json"] {
            let response = router(&fixture).oneshot(post(uri, body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri} {body}");
            assert_eq!(body_json(response).await, json!({ "error": "missing prompt" }));
        }
    }
}

#[tokio::test]
async fn test_stream_list_files_end_to_end() {
    let fixture = MockServerFixture::new().await;
    let thinking = r#"{"message":{"role":"assistant","content":"","thinking":"ls"},"done":false}"#;
    let answer = r#"{"message":{"role":"assistant","content":"a.txt b.txt"},"done":false}"#;
    let done = r#"{"message":{"role":"assistant","content":""},"done":true}"#;

    let first = fixture
        .mock_chat_stream(first_call(true), &[thinking, LIST_FILES])
        .await;
    let second = fixture
        .mock_chat_stream(follow_up_call(true), &[answer, done])
        .await;
    let _enqueue = fixture.mock_enqueue(r#"{"jobId":"J1"}"#).await;
    let _result = fixture
        .mock_result("J1", r#"{"status":"done","payload":{"stdout":"a.txt\nb.txt\n"}}"#)
        .await;

    let response = router(&fixture)
        .oneshot(post("/api/ask-stream", r#"{"prompt":"list files"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");

    let text = body_text(response).await;
    assert_eq!(text, format!("{thinking}\n{LIST_FILES}\n{answer}\n{done}\n"));
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_stream_first_call_failure_is_500() {
    let fixture = MockServerFixture::new().await;
    let _first = fixture.mock_chat_json(first_call(true), 500, "boom").await;

    let response = router(&fixture)
        .oneshot(post("/api/ask-stream", r#"{"prompt":"hi"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Chat service error 500: boom" })
    );
}

#[tokio::test]
async fn test_ask_without_tool_call_returns_first_answer() {
    let fixture = MockServerFixture::new().await;
    let answer = json!({ "message": { "role": "assistant", "content": "hello" }, "done": true });
    let _first = fixture
        .mock_chat_json(first_call(false), 200, &answer.to_string())
        .await;

    let response = router(&fixture)
        .oneshot(post("/api/ask", r#"{"prompt":"hi"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "ok": true, "final": answer }));
}

#[tokio::test]
async fn test_ask_with_tool_call_returns_follow_up_answer() {
    let fixture = MockServerFixture::new().await;
    let final_answer = json!({ "message": { "role": "assistant", "content": "a.txt" }, "done": true });
    let _first = fixture.mock_chat_json(first_call(false), 200, LIST_FILES).await;
    let _second = fixture
        .mock_chat_json(follow_up_call(false), 200, &final_answer.to_string())
        .await;
    let _enqueue = fixture.mock_enqueue(r#"{"jobId":"J1"}"#).await;
    let _result = fixture
        .mock_result("J1", r#"{"status":"done","payload":"a.txt"}"#)
        .await;

    let response = router(&fixture)
        .oneshot(post("/api/ask", r#"{"prompt":"list files"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "ok": true, "final": final_answer })
    );
}

#[tokio::test]
async fn test_ask_enqueue_without_job_id_reports_raw() {
    let fixture = MockServerFixture::new().await;
    let _first = fixture.mock_chat_json(first_call(false), 200, LIST_FILES).await;
    let _enqueue = fixture.mock_enqueue(r#"{"queued":false}"#).await;

    let response = router(&fixture)
        .oneshot(post("/api/ask", r#"{"prompt":"list files"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "enqueue failed", "raw": { "queued": false } })
    );
}

#[tokio::test]
async fn test_ask_upstream_failure_is_500() {
    let fixture = MockServerFixture::new().await;
    let _first = fixture.mock_chat_json(first_call(false), 503, "overloaded").await;

    let response = router(&fixture)
        .oneshot(post("/api/ask", r#"{"prompt":"hi"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Chat service error 503: overloaded" })
    );
}

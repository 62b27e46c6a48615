//! Execution dispatcher against a mock execution service

use crate::integration::mock_server::MockServerFixture;
use mockito::Matcher;
use serde_json::json;
use std::time::{Duration, Instant};
use tool_bridge::{CommandExecutor, Error};

#[tokio::test]
async fn test_dispatch_returns_done_payload() {
    let fixture = MockServerFixture::new().await;

    let enqueue = {
        let mut server = fixture.exec.lock().await;
        server
            .mock("POST", "/enqueue")
            .match_header("x-api-key", "test-key")
            .match_body(Matcher::Json(json!({ "command": "ls" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jobId":"J1"}"#)
            .expect(1)
            .create_async()
            .await
    };
    let result = fixture
        .mock_result("J1", r#"{"status":"done","payload":{"stdout":"a.txt\nb.txt\n"}}"#)
        .await;

    let payload = fixture.dispatcher().dispatch("ls").await.unwrap();
    assert_eq!(payload, json!({ "stdout": "a.txt\nb.txt\n" }));

    enqueue.assert_async().await;
    result.assert_async().await;
}

#[tokio::test]
async fn test_numeric_job_id_is_accepted() {
    let fixture = MockServerFixture::new().await;
    let _enqueue = fixture.mock_enqueue(r#"{"jobId":42}"#).await;
    let _result = fixture
        .mock_result("42", r#"{"status":"done","payload":"ok"}"#)
        .await;

    let payload = fixture.dispatcher().dispatch("uptime").await.unwrap();
    assert_eq!(payload, json!("ok"));
}

#[tokio::test]
async fn test_done_without_payload_is_null() {
    let fixture = MockServerFixture::new().await;
    let _enqueue = fixture.mock_enqueue(r#"{"jobId":"J2"}"#).await;
    let _result = fixture.mock_result("J2", r#"{"status":"done"}"#).await;

    let payload = fixture.dispatcher().dispatch("true").await.unwrap();
    assert!(payload.is_null());
}

#[tokio::test]
async fn test_missing_job_id_is_dispatch_error_with_raw() {
    let fixture = MockServerFixture::new().await;
    let _enqueue = fixture
        .mock_enqueue(r#"{"error":"queue full"}"#)
        .await;

    let err = fixture.dispatcher().dispatch("ls").await.unwrap_err();
    match err {
        Error::Dispatch { message, raw } => {
            assert_eq!(message, "enqueue failed");
            assert_eq!(raw, Some(json!({ "error": "queue full" })));
        }
        other => panic!("expected dispatch error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unparseable_enqueue_response_is_dispatch_error() {
    let fixture = MockServerFixture::new().await;
    let _enqueue = fixture.mock_enqueue("<html>bad gateway</html>").await;

    let err = fixture.dispatcher().dispatch("ls").await.unwrap_err();
    assert!(matches!(err, Error::Dispatch { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_pending_job_times_out_near_deadline() {
    let fixture = MockServerFixture::new().await;
    let _result = fixture
        .mock_result("J1", r#"{"status":"pending"}"#)
        .await;

    let dispatcher = fixture.dispatcher();
    let started = Instant::now();
    let err = dispatcher
        .await_result("J1", Duration::from_millis(100), Duration::from_millis(10))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    match err {
        Error::Timeout { job_id, timeout_ms } => {
            assert_eq!(job_id, "J1");
            assert_eq!(timeout_ms, 100);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(elapsed >= Duration::from_millis(100), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(300), "{elapsed:?}");
}

#[tokio::test]
async fn test_unknown_status_keeps_polling() {
    let fixture = MockServerFixture::new().await;
    let polls = {
        let mut server = fixture.exec.lock().await;
        server
            .mock("GET", "/result/J3")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"running"}"#)
            .expect_at_least(2)
            .create_async()
            .await
    };

    let err = fixture
        .dispatcher()
        .await_result("J3", Duration::from_millis(80), Duration::from_millis(10))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
    polls.assert_async().await;
}

#[tokio::test]
async fn test_null_status_keeps_polling_until_deadline() {
    let fixture = MockServerFixture::new().await;
    let polls = {
        let mut server = fixture.exec.lock().await;
        server
            .mock("GET", "/result/J1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":null}"#)
            .expect_at_least(2)
            .create_async()
            .await
    };

    let started = Instant::now();
    let err = fixture
        .dispatcher()
        .await_result("J1", Duration::from_millis(100), Duration::from_millis(10))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, Error::Timeout { .. }), "got {err:?}");
    assert!(elapsed >= Duration::from_millis(100), "{elapsed:?}");
    polls.assert_async().await;
}

#[tokio::test]
async fn test_missing_credential_omits_header() {
    let fixture = MockServerFixture::new().await;
    let _enqueue = {
        let mut server = fixture.exec.lock().await;
        server
            .mock("POST", "/enqueue")
            .match_header("x-api-key", Matcher::Missing)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jobId":"J9"}"#)
            .create_async()
            .await
    };

    let dispatcher = tool_bridge::ExecutionDispatcher::new(&fixture.exec_url, None).unwrap();
    let enqueued = dispatcher.enqueue("ls").await.unwrap();
    assert_eq!(enqueued.job_id.as_deref(), Some("J9"));
}

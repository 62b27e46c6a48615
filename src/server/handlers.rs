use super::{AppState, RELAY_CHANNEL_SIZE};
use crate::orchestrator::{AskOutcome, RelaySink};
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Unreadable bodies are treated the same as a missing prompt.
fn prompt_of(body: Result<Json<AskRequest>, JsonRejection>) -> Option<String> {
    match body {
        Ok(Json(request)) => request.prompt.filter(|p| !p.is_empty()),
        Err(rejection) => {
            debug!(error = %rejection, "unreadable request body");
            None
        }
    }
}

pub(super) async fn ask(
    State(state): State<AppState>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let Some(prompt) = prompt_of(body) else {
        return error_response(StatusCode::BAD_REQUEST, "missing prompt");
    };

    match state.orchestrator.ask(&prompt).await {
        Ok(AskOutcome::Final(answer)) => {
            Json(json!({ "ok": true, "final": answer })).into_response()
        }
        Ok(AskOutcome::Rejected { error, raw }) => {
            let mut body = json!({ "error": error });
            if let Some(raw) = raw {
                body["raw"] = raw;
            }
            Json(body).into_response()
        }
        Err(err) => {
            error!(error = %err, "ask failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

pub(super) async fn ask_stream(
    State(state): State<AppState>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let Some(prompt) = prompt_of(body) else {
        return error_response(StatusCode::BAD_REQUEST, "missing prompt");
    };

    // Nothing has been sent yet, so an upstream failure is still a clean 500.
    let first = match state.orchestrator.open_first_stream(&prompt).await {
        Ok(first) => first,
        Err(err) => {
            error!(error = %err, "opening first stream failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
        }
    };

    let (sink, body_stream) = RelaySink::channel(RELAY_CHANNEL_SIZE);
    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        orchestrator.relay(&prompt, first, sink).await;
    });

    let mut response = Body::from_stream(body_stream).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    response
}

//! 执行调度模块：把命令提交到执行服务并轮询结果。
//!
//! Execution dispatcher.
//!
//! Submits a command to the execution service (`POST {base}/enqueue`), then
//! polls `GET {base}/result/{jobId}` until the job reports `done` or the
//! deadline passes. There are no retries: one enqueue, one bounded poll loop.

use crate::config::BridgeConfig;
use crate::transport::HttpTransport;
use crate::types::{EnqueueResult, JobResult};
use crate::{Error, Result};
use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Header carrying the execution service credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Deadline and cadence of the result poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            interval: Duration::from_secs(1),
        }
    }
}

/// Runs a command somewhere and returns its result payload.
#[async_trait::async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn dispatch(&self, command: &str) -> Result<Value>;
}

/// HTTP client for the execution service.
pub struct ExecutionDispatcher {
    transport: HttpTransport,
    policy: PollPolicy,
}

impl ExecutionDispatcher {
    pub fn new(base_url: impl Into<String>, api_key: Option<&str>) -> Result<Self> {
        Self::with_transport(HttpTransport::new(base_url)?, api_key)
    }

    fn with_transport(mut transport: HttpTransport, api_key: Option<&str>) -> Result<Self> {
        if let Some(key) = api_key {
            transport = transport.with_header(API_KEY_HEADER, key)?;
        }
        Ok(Self {
            transport,
            policy: PollPolicy::default(),
        })
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let transport = HttpTransport::with_pool(&config.exec_base_url, config.http_pool)?;
        Ok(Self::with_transport(transport, config.exec_api_key.as_deref())?
            .with_policy(config.poll_policy))
    }

    /// Override the default deadline and interval.
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Submit `command`; a response without a job id is still returned here.
    pub async fn enqueue(&self, command: &str) -> Result<EnqueueResult> {
        let body = json!({ "command": command });
        let raw = self
            .transport
            .execute_service(Method::POST, "/enqueue", Some(&body))
            .await
            .map_err(|e| Error::dispatch(format!("enqueue request failed: {e}")))?;
        Ok(EnqueueResult::from_value(raw))
    }

    /// Poll once. Any JSON body is accepted; only transport failures and
    /// non-JSON bodies are errors.
    pub async fn poll(&self, job_id: &str) -> Result<JobResult> {
        let raw = self
            .transport
            .execute_service(Method::GET, &format!("/result/{job_id}"), None::<&Value>)
            .await
            .map_err(|e| Error::dispatch(format!("result poll failed: {e}")))?;
        Ok(JobResult::from_value(raw))
    }

    /// Poll `job_id` until it is done or `timeout` elapses.
    ///
    /// Each poll is itself bounded by the remaining deadline, and the wait
    /// between polls never overshoots it.
    pub async fn await_result(
        &self,
        job_id: &str,
        timeout: Duration,
        interval: Duration,
    ) -> Result<Value> {
        let deadline = Instant::now() + timeout;
        let timed_out = || Error::Timeout {
            job_id: job_id.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        };

        let mut attempt = 0u32;
        while Instant::now() < deadline {
            attempt += 1;
            let result = tokio::time::timeout_at(deadline, self.poll(job_id))
                .await
                .map_err(|_| timed_out())??;

            if result.is_done() {
                debug!(job_id, attempt, "job done");
                return Ok(result.payload.unwrap_or(Value::Null));
            }
            debug!(job_id, attempt, status = ?result.status, "job not done yet");

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            tokio::time::sleep(interval.min(deadline - now)).await;
        }
        Err(timed_out())
    }

    /// Enqueue + await under an explicit policy.
    pub async fn dispatch_with(&self, command: &str, policy: PollPolicy) -> Result<Value> {
        let enqueued = self.enqueue(command).await?;
        let Some(job_id) = enqueued.job_id else {
            return Err(Error::Dispatch {
                message: "enqueue failed".to_string(),
                raw: Some(enqueued.raw),
            });
        };
        info!(job_id = %job_id, "command enqueued");

        let payload = self
            .await_result(&job_id, policy.timeout, policy.interval)
            .await?;
        info!(job_id = %job_id, "command finished");
        Ok(payload)
    }
}

#[async_trait::async_trait]
impl CommandExecutor for ExecutionDispatcher {
    async fn dispatch(&self, command: &str) -> Result<Value> {
        self.dispatch_with(command, self.policy).await
    }
}

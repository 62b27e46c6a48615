//! Execution service job records

use serde_json::Value;

/// Response of `POST {base}/enqueue`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnqueueResult {
    pub job_id: Option<String>,
    /// Full response body, kept for error reporting.
    pub raw: Value,
}

impl EnqueueResult {
    /// `jobId` may be a string or a number; anything else counts as absent.
    pub fn from_value(raw: Value) -> Self {
        let job_id = match raw.get("jobId") {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Self { job_id, raw }
    }
}

/// Job status as reported by `GET {base}/result/{jobId}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobStatus {
    Pending,
    Done,
    /// Anything else, including a missing or non-string `status`.
    #[default]
    Unknown,
}

impl JobStatus {
    fn from_value(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("done") => JobStatus::Done,
            Some("pending") => JobStatus::Pending,
            _ => JobStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobResult {
    pub status: JobStatus,
    /// Present only once the job is done.
    pub payload: Option<Value>,
}

impl JobResult {
    /// Read a poll response. Never fails: a body of any shape that does not
    /// say `done` is simply not done yet.
    pub fn from_value(raw: Value) -> Self {
        let status = JobStatus::from_value(raw.get("status"));
        let payload = raw.get("payload").filter(|p| !p.is_null()).cloned();
        Self { status, payload }
    }

    pub fn is_done(&self) -> bool {
        self.status == JobStatus::Done
    }
}

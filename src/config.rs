//! Process-wide configuration, read once at startup.

use crate::dispatch::PollPolicy;
use crate::pipeline::LineSplitting;
use crate::transport::PoolSettings;
use crate::{Error, ErrorContext, Result};
use std::env;
use std::time::Duration;
use url::Url;

/// Immutable bridge configuration, shared by reference after startup.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Chat service base; requests go to `{chat_base_url}/chat`.
    pub chat_base_url: String,
    pub model: String,
    pub exec_base_url: String,
    /// Sent as `X-API-KEY`; omitted when unset.
    pub exec_api_key: Option<String>,
    pub port: u16,
    pub poll_policy: PollPolicy,
    pub line_splitting: LineSplitting,
    /// Shared by both upstream clients.
    pub http_pool: PoolSettings,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            chat_base_url: "http://localhost:11434/api".to_string(),
            model: "gpt-oss:20b".to_string(),
            exec_base_url: "http://127.0.0.1:5379".to_string(),
            exec_api_key: None,
            port: 3000,
            poll_policy: PollPolicy::default(),
            line_splitting: LineSplitting::PerFragment,
            http_pool: PoolSettings::default(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let chat_base_url = match get("BRIDGE_CHAT_URL") {
            Some(url) => validate_url("BRIDGE_CHAT_URL", url)?,
            None => defaults.chat_base_url,
        };
        let exec_base_url = match get("BRIDGE_EXEC_URL") {
            Some(url) => validate_url("BRIDGE_EXEC_URL", url)?,
            None => defaults.exec_base_url,
        };

        let port = match get("PORT") {
            Some(raw) => parse_number::<u16>("PORT", &raw)?,
            None => defaults.port,
        };

        let mut poll_policy = defaults.poll_policy;
        if let Some(raw) = get("BRIDGE_EXEC_TIMEOUT_MS") {
            poll_policy.timeout =
                Duration::from_millis(parse_number::<u64>("BRIDGE_EXEC_TIMEOUT_MS", &raw)?);
        }
        if let Some(raw) = get("BRIDGE_EXEC_POLL_INTERVAL_MS") {
            poll_policy.interval =
                Duration::from_millis(parse_number::<u64>("BRIDGE_EXEC_POLL_INTERVAL_MS", &raw)?);
        }

        let mut http_pool = defaults.http_pool;
        if let Some(raw) = get("BRIDGE_HTTP_POOL_MAX_IDLE_PER_HOST") {
            http_pool.max_idle_per_host =
                parse_number::<usize>("BRIDGE_HTTP_POOL_MAX_IDLE_PER_HOST", &raw)?;
        }
        if let Some(raw) = get("BRIDGE_HTTP_POOL_IDLE_TIMEOUT_SECS") {
            http_pool.idle_timeout = Duration::from_secs(parse_number::<u64>(
                "BRIDGE_HTTP_POOL_IDLE_TIMEOUT_SECS",
                &raw,
            )?);
        }

        let line_splitting = match get("BRIDGE_BUFFER_LINES").as_deref().map(str::trim) {
            Some("1") | Some("true") | Some("yes") => LineSplitting::Buffered,
            Some("0") | Some("false") | Some("no") | None => LineSplitting::PerFragment,
            Some(other) => {
                return Err(Error::configuration_with_context(
                    "expected a boolean",
                    ErrorContext::new()
                        .with_field_path("BRIDGE_BUFFER_LINES")
                        .with_details(format!("got {:?}", other))
                        .with_source("config"),
                ))
            }
        };

        Ok(Self {
            chat_base_url,
            model: get("BRIDGE_CHAT_MODEL").unwrap_or(defaults.model),
            exec_base_url,
            exec_api_key: get("BRIDGE_EXEC_API_KEY"),
            port,
            poll_policy,
            line_splitting,
            http_pool,
        })
    }
}

fn validate_url(key: &str, raw: String) -> Result<String> {
    let raw = raw.trim();
    let parsed = Url::parse(raw).map_err(|e| {
        Error::configuration_with_context(
            "invalid base URL",
            ErrorContext::new()
                .with_field_path(key)
                .with_details(e.to_string())
                .with_source("config"),
        )
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::configuration_with_context(
            "base URL must be http or https",
            ErrorContext::new()
                .with_field_path(key)
                .with_details(raw)
                .with_source("config"),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| {
        Error::configuration_with_context(
            "expected a number",
            ErrorContext::new()
                .with_field_path(key)
                .with_details(format!("{:?}: {}", raw, e))
                .with_source("config"),
        )
    })
}

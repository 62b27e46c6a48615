//! tool-bridge — 工具调用桥接服务入口
//!
//! Usage:
//!   tool-bridge                      Serve /api/ask and /api/ask-stream on $PORT
//!
//! Configuration is read from the environment (and `.env`), see `BridgeConfig`.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tool_bridge::{server, BridgeConfig, Orchestrator};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tool_bridge=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BridgeConfig::from_env().context("Failed to load configuration")?;
    if config.exec_api_key.is_none() {
        tracing::warn!(
            "BRIDGE_EXEC_API_KEY is not set; execution requests will carry no credential"
        );
    }
    tracing::info!(
        chat = %config.chat_base_url,
        model = %config.model,
        exec = %config.exec_base_url,
        "configuration loaded"
    );

    let orchestrator =
        Arc::new(Orchestrator::from_config(&config).context("Failed to build orchestrator")?);
    let app = server::build_router(orchestrator);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!("Bridge server running on http://localhost:{}", config.port);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

//! 主应用程序入口
//!
//! 加载配置，装配内存存储与实时推送组件，启动 Axum Web API 服务。

use std::sync::Arc;

use anyhow::Context;
use application::{Clock, SystemClock};
use config::AppConfig;
use infrastructure::Infrastructure;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let infra = Infrastructure::in_memory(&config.realtime);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let shutdown = CancellationToken::new();
    let state = AppState::from_infrastructure(&infra, clock, shutdown.clone());

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(address = %address, "messenger server listening");

    let app = router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    // 等待所有会话完成关闭握手并注销
    let drain = config.realtime.shutdown_drain();
    if infra.registry.wait_until_empty(drain).await {
        tracing::info!("all realtime sessions closed");
    } else {
        tracing::warn!(
            remaining = infra.registry.len().await,
            "realtime sessions still open after drain timeout"
        );
    }

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
    shutdown.cancel();
}

use anyhow::Context;
use insight_relay::util::init_tracing;
use insight_relay::{build_router, AppConfig, AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env()?;

    if config.uses_default_secret() {
        tracing::warn!("DASHBOARD_SECRET not set; using the placeholder secret (set it for any real deployment)");
    }
    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; /api/ai-insights will answer 500 until it is configured");
    }
    match config.upstream_timeout {
        Some(t) => tracing::info!("Upstream timeout: {}s", t.as_secs()),
        None => tracing::info!("Upstream timeout: none (transport default)"),
    }
    tracing::info!(model = %config.model, base_url = %config.openai_base_url, "Provider: openai");

    let addr = config.bind_addr();
    let app = build_router(AppState::new(config));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("AI proxy listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

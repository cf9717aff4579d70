use anyhow::Context;
use severity_proxy::{AppState, ProxyConfig, create_router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = ProxyConfig::from_env().context("Invalid proxy configuration")?;
    let addr = config.bind_addr;

    tracing::info!(
        endpoint = %config.endpoint,
        deployment = %config.deployment,
        timeout_secs = config.timeout.as_secs(),
        "proxy configured"
    );

    let app = create_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

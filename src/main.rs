use anyhow::Context;
use tracing::info;

use grok_relay::config::Config;
use grok_relay::routes;
use grok_relay::service::chat_service::ChatService;
use grok_relay::upstream::UpstreamClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grok_relay=debug,tower_http=debug".into()),
        )
        .init();

    if config.upstream.cookie.is_empty() {
        tracing::warn!("GROK_COOKIE is not set; the mirror will most likely reject requests");
    }

    // ── Dependency wiring ─────────────────────────────────────────────────────
    let upstream = UpstreamClient::new(&config.upstream).context("failed to set up upstream client")?;
    info!(url = upstream.url(), timeout = ?config.upstream.timeout, "upstream configured");
    let app = routes::router(ChatService::new(upstream));

    // ── Listen ────────────────────────────────────────────────────────────────
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/");

    axum::serve(listener, app).await?;
    Ok(())
}

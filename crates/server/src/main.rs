use std::sync::Arc;

use ala_origin::{HttpFetcher, OriginSite};
use ala_server::config::Config;
use ala_server::state::AppState;
use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    info!(origin = %config.origin_url, "using origin site");

    let site = OriginSite::new(config.origin_url.clone()).context("invalid origin site")?;
    let fetcher = HttpFetcher::new().context("failed to build origin client")?;
    let state = AppState::new(Arc::new(fetcher), site, config.cache_ttl);

    let app = ala_server::routes::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .context("failed to bind")?;
    info!(addr = %config.bind_addr, "addon listening");
    info!("manifest at http://{}/manifest.json", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

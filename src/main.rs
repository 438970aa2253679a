use anyhow::Context;
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use market_scraper::api::{self, AppState};
use market_scraper::{Aggregator, HttpFetcher, ScraperConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ScraperConfig::from_env().context("invalid scraper configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let fallbacks: Vec<&str> = config.fallback_terms.iter().map(|t| t.as_str()).collect();
    info!(
        base_url = %config.base_url,
        default_term = %config.default_term,
        fallbacks = ?fallbacks,
        "🛒 Scraper configured"
    );

    let fetcher = HttpFetcher::new(&config).context("failed to build HTTP client")?;
    let aggregator = Aggregator::new(&config, Arc::new(fetcher));
    let state = Arc::new(AppState { aggregator });

    let app = api::router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("✅ API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

//! Service binary: parse configuration, wire up state, and serve.

use anyhow::{Context, Result};
use clap::Parser;
use freightparse::{router, AnthropicBackend, AppConfig, AppState, ModelBackend};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::parse();

    // Guarded-once construction: build the client now when the credential is
    // present, otherwise start degraded and let parse routes answer 503.
    let backend: Option<Arc<dyn ModelBackend>> = match config.anthropic_api_key.as_deref() {
        Some(key) if !key.is_empty() => {
            Some(Arc::new(AnthropicBackend::new(key, config.model.clone())))
        }
        _ => {
            tracing::warn!("ANTHROPIC_API_KEY not set; parse routes will answer 503");
            None
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        %addr,
        model = %config.model,
        rate_limit = config.rate_limit_requests,
        window_secs = config.rate_limit_window,
        "starting freightparse"
    );

    let app = router(AppState::new(config, backend));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

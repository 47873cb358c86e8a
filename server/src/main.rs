use anyhow::{Context, Result};
use axum::serve;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use studio_desk::backend::{create_router, initialize_backend, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load(|key| std::env::var(key).ok())?;
    let bind_address = config.bind_address.clone();

    let app_state = initialize_backend(config).await?;
    let router = create_router(app_state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("🌐 Starting Studio Desk REST API server at {}", bind_address);
    serve(listener, router).await?;

    Ok(())
}

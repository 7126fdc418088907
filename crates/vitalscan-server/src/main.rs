//! vitalscan-server binary

use anyhow::Context;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vitalscan_server=info,tower_http=info")),
        )
        .init();

    let addr = std::env::var("VITALSCAN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(addr = %addr, "vitalscan-server listening");
    axum::serve(listener, vitalscan_server::router())
        .await
        .context("server exited with an error")?;

    Ok(())
}

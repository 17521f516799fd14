//! Binary crate for the `panahon` proxy gateway.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Wiring configuration into the HTTP router
//! - Serving the client-facing weather endpoints

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use panahon_core::Config;
use panahon_server::routes;

#[derive(Debug, Parser)]
#[command(name = "panahon-server", version, about = "Weather-risk proxy gateway")]
struct Args {
    /// Path to a TOML config file; defaults to the platform config dir.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured bind address, e.g. "0.0.0.0:8000".
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let bind_addr = args
        .bind
        .unwrap_or_else(|| config.server.bind_addr.clone());

    let state = routes::AppState::new(&config)?;
    let app = routes::router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    tracing::info!(%bind_addr, "panahon gateway listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

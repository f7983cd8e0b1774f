// ============================
// arbitrage-backend-bin/src/main.rs
// ============================
//! Tokio / Axum entry-point for the arbitrage authentication backend.

use std::net::SocketAddr;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arbitrage_backend_lib::{config::Settings, router, seed, AppState};

/// Authentication backend for the arbitrage platform
#[derive(Parser, Debug)]
#[command(name = "arbitrage-backend")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Override the configured bind address
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from(&cli.config)?;
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| settings.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState::in_memory(settings);
    seed::seed(state.store.as_ref()).await?;

    let app = router::create_router(state.clone());

    let addr = state.settings.bind_addr;
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}

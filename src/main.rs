use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use viberyt::config::Config;
use viberyt::db::AppState;
use viberyt::handlers;

#[derive(Parser, Debug)]
#[command(name = "viberyt")]
#[command(about = "Viberyt account and license service")]
struct Args {
    /// Host to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database path (overrides DATABASE_PATH)
    #[arg(long)]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }

    if config.identity_url.is_none() {
        tracing::warn!("IDENTITY_URL not set, account and license endpoints will fail");
    }
    if config.polar_access_token.is_none() {
        tracing::warn!("POLAR_ACCESS_TOKEN not set, checkout and webhook endpoints will fail");
    }

    let state = AppState::from_config(&config).context("failed to initialize state")?;
    let app = handlers::router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, base_url = %config.base_url, "viberyt listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

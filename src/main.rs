use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use sidequest::catalog::CatalogClient;
use sidequest::config::{Cli, Config};
use sidequest::state::AppState;
use sidequest::{db, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;
    if config.catalog.api_key.is_empty() {
        tracing::warn!("No catalog API key configured; set SIDEQUEST_API_KEY");
    }

    let pool = db::create_pool(config.db_path())?;
    db::run_migrations(&pool)?;

    let catalog = CatalogClient::new(
        config.catalog.base_url.clone(),
        config.catalog.api_key.clone(),
    );

    let state = AppState {
        db: pool,
        config: config.clone(),
        catalog,
    };

    let app = routes::app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

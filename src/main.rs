use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use coop_content_api::config::{self, StoreBackend};
use coop_content_api::state::{self, router};

#[derive(Debug, Parser)]
#[command(name = "coop-content-api", version, about = "Content tree API server")]
struct Args {
    /// Port to listen on (overrides CONTENT_API_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Tree storage backend: memory or postgres (overrides TREE_BACKEND)
    #[arg(long, value_parser = parse_backend)]
    backend: Option<StoreBackend>,
}

fn parse_backend(value: &str) -> Result<StoreBackend, String> {
    StoreBackend::parse(value).ok_or_else(|| format!("unknown backend '{}', expected memory or postgres", value))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = config::config();
    let backend = args.backend.unwrap_or(config.tree.backend);
    let port = args.port.unwrap_or(config.api.port);
    tracing::info!("Starting content API in {:?} mode with {:?} backend", config.environment, backend);

    let app = match backend {
        StoreBackend::Memory => {
            let (state, _handles) = state::memory_state(config);
            router(state, config.api.enable_request_logging)
        }
        StoreBackend::Postgres => {
            let state = state::postgres_state(config)
                .await
                .context("failed to connect to PostgreSQL")?;
            router(state, config.api.enable_request_logging)
        }
    };

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Content API listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

//! Catalog Service (otv-cs) - Main entry point
//!
//! Serves catalog reads with on-demand translation coordination. Translation
//! work itself happens in the otv-tw worker; this process only decides
//! between cache, store and enqueue per request.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use otv_common::cache::RedisCache;
use otv_common::config::Config;
use otv_common::db;
use otv_common::db::translations::SqliteTranslationStore;
use otv_common::queue::RedisJobQueue;

use otv_cs::api::{self, AppState};
use otv_cs::db::catalog::SqliteCatalog;
use otv_cs::seed;
use otv_cs::translation::TranslationOrchestrator;

/// Command-line arguments for otv-cs
#[derive(Parser, Debug)]
#[command(name = "otv-cs")]
#[command(about = "Catalog service for OmniverseTV")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "4000", env = "OTV_CS_PORT")]
    port: u16,

    /// Path to a TOML config file
    #[arg(short, long, env = "OTV_CONFIG")]
    config: Option<PathBuf>,

    /// Database URL (overrides config file and environment)
    #[arg(long)]
    database_url: Option<String>,

    /// Redis URL (overrides config file and environment)
    #[arg(long)]
    redis_url: Option<String>,

    /// Seed demo catalog data into an empty database and continue
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "otv_cs=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = args.database_url {
        config.database_url = url;
    }
    if let Some(url) = args.redis_url {
        config.redis_url = url;
    }

    info!("Starting OmniverseTV Catalog Service on port {}", args.port);

    // Database
    let pool = db::connect(&config.database_url)
        .await
        .context("Failed to open database")?;
    db::bootstrap_schema(&pool)
        .await
        .context("Failed to ensure database schema")?;
    if args.seed {
        seed::seed_catalog(&pool)
            .await
            .context("Failed to seed catalog")?;
    }

    // Redis: one reconnecting connection shared by cache and queue
    let redis_client =
        redis::Client::open(config.redis_url.as_str()).context("Invalid Redis URL")?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client)
        .await
        .context("Failed to connect to Redis")?;
    info!("Connected to Redis at {}", config.redis_url);

    let cache = Arc::new(RedisCache::from_connection(redis_conn.clone()));
    let queue = Arc::new(RedisJobQueue::from_connection(
        redis_conn,
        config.queue_config(),
    ));
    let catalog = Arc::new(SqliteCatalog::new(pool.clone()));
    let store = Arc::new(SqliteTranslationStore::new(pool));

    let orchestrator = Arc::new(TranslationOrchestrator::new(catalog, cache, store, queue));
    let app = api::create_router(AppState { orchestrator });

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}

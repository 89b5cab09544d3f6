//! Translation Worker (otv-tw) - Main entry point
//!
//! Long-running consumer of the translation queue. Runs alongside any
//! number of sibling workers; the queue hands each job to exactly one of
//! them at a time.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use otv_common::cache::RedisCache;
use otv_common::config::Config;
use otv_common::db;
use otv_common::db::translations::SqliteTranslationStore;
use otv_common::queue::RedisJobQueue;

use otv_tw::provider::DeepLClient;
use otv_tw::worker::Worker;

/// Command-line arguments for otv-tw
#[derive(Parser, Debug)]
#[command(name = "otv-tw")]
#[command(about = "Translation worker for OmniverseTV")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "OTV_CONFIG")]
    config: Option<PathBuf>,

    /// Database URL (overrides config file and environment)
    #[arg(long)]
    database_url: Option<String>,

    /// Redis URL (overrides config file and environment)
    #[arg(long)]
    redis_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "otv_tw=debug,otv_common=debug".into()),
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

    let api_key = config
        .provider_api_key
        .clone()
        .context("Translation provider API key is not configured (set DEEPL_API_KEY)")?;

    info!("Starting OmniverseTV Translation Worker");

    // Database
    let pool = db::connect(&config.database_url)
        .await
        .context("Failed to open database")?;
    db::bootstrap_schema(&pool)
        .await
        .context("Failed to ensure database schema")?;

    // Redis: one reconnecting connection shared by cache and queue
    let redis_client =
        redis::Client::open(config.redis_url.as_str()).context("Invalid Redis URL")?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client)
        .await
        .context("Failed to connect to Redis")?;
    info!("Connected to Redis at {}", config.redis_url);

    let cache = Arc::new(RedisCache::from_connection(redis_conn.clone()));
    let queue = RedisJobQueue::from_connection(redis_conn, config.queue_config());
    let store = Arc::new(SqliteTranslationStore::new(pool));
    let provider = Arc::new(DeepLClient::new(config.provider_url.clone(), api_key));

    let worker = Worker::new(queue, store, cache, provider);

    // Flip the watch on Ctrl+C / SIGTERM; the worker finishes its current
    // job before exiting.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    worker.run(shutdown_rx).await;

    info!("Worker shutdown complete");
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

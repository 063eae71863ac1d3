//! `sociograph-node`: HTTP server for the Sociograph social graph.
//!
//! # Quick start
//!
//! ```sh
//! # In-memory node on the default port:
//! sociograph-node
//!
//! # Persistent SQLite node:
//! SOCIOGRAPH_DB=./graph.db sociograph-node
//!
//! # Custom bind address:
//! SOCIOGRAPH_BIND=127.0.0.1:8080 sociograph-node
//! ```
//!
//! # Environment variables
//!
//! See [`NodeConfig::from_env`] for the full list.

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use sociograph_node::{build_router, MemoryStorage, NodeConfig, SqliteStorage, Storage};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sociograph_node=info,tower_http=debug".into()),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = NodeConfig::from_env()?;

    let storage: Arc<dyn Storage> = match &config.db_path {
        Some(path) => {
            tracing::info!("storage: SQLite at {path}");
            Arc::new(
                SqliteStorage::open(path)
                    .map_err(|e| format!("failed to open SQLite database at {path}: {e}"))?,
            )
        }
        None => {
            tracing::info!("storage: in-memory (data will not survive restart)");
            Arc::new(MemoryStorage::new())
        }
    };

    let app = build_router(storage, config.clone());

    tracing::info!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

/// Resolve once `signal` fires. If the signal cannot be installed this never
/// resolves, so the server keeps running until the process is killed.
async fn wait_for_shutdown(signal: impl Future<Output = std::io::Result<()>>) {
    match signal.await {
        Ok(()) => tracing::info!("shutting down"),
        Err(e) => {
            tracing::error!("cannot listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    }
}

//! taskdeck server binary.

use std::net::SocketAddr;

use taskdeck_server::{
    config::{Config, StoreBackend},
    create_app, create_state, ensure_local_user, init_tracing,
};
use todo_store::{MemoryTodoStore, SqliteTodoStore, TodoStore};
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(&config.log_level);

    info!(
        single_user_mode = config.single_user_mode,
        "Starting taskdeck server"
    );

    match config.store_backend() {
        StoreBackend::Memory => {
            info!("Using in-memory store");
            serve(config, MemoryTodoStore::new()).await
        }
        StoreBackend::Sqlite(url) => {
            info!(database_url = %url, "Using SQLite store");
            let store = SqliteTodoStore::connect(&url).await?;
            serve(config, store).await
        }
    }
}

async fn serve<S: TodoStore + 'static>(config: Config, store: S) -> anyhow::Result<()> {
    let addr: SocketAddr = config.server_addr().parse()?;

    let state = create_state(config, store)?;
    ensure_local_user(&state).await?;

    let app = create_app(state);

    info!(addr = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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

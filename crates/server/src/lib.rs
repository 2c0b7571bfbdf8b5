//! Web layer of the movie catalogue.
//!
//! [`services`] holds the application logic over a shared
//! [`MovieRepository`](repository::MovieRepository); [`routes`] exposes it as
//! a JSON API with bearer-token sessions.

pub mod auth;
pub mod config;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{RepositoryKind, ServerConfig};
pub use errors::{AppError, AppResult};
pub use routes::build_router;
pub use services::{ServiceError, SharedRepository};
pub use state::AppState;

use anyhow::{Context, Result};
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::info;

/// Open the configured repository on the blocking pool.
pub async fn open_repository(config: &ServerConfig) -> Result<SharedRepository> {
    let start = Instant::now();
    let config = config.clone();
    let repo = tokio::task::spawn_blocking(move || config.open_repository())
        .await
        .context("Repository loading task panicked")?
        .context("Failed to open repository")?;
    info!("Repository ready in {:?}", start.elapsed());
    Ok(repo)
}

/// Run the HTTP server until ctrl-c.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let repo = open_repository(&config).await?;
    let app = build_router(AppState::new(repo));

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", err);
    }
}

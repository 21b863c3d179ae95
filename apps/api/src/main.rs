//! envkeep API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use envkeep_core::AppError;
use envkeep_infrastructure::SystemClock;
use tracing::{info, warn};

use crate::api_config::{ApiConfig, StorageBackend, init_tracing};
use crate::api_services::{RepositorySet, build_app_state, connect, run_migrations};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let repositories = match &config.storage {
        StorageBackend::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = connect(database_url, *max_connections).await?;
            run_migrations(&pool).await?;

            if config.migrate_only {
                info!("database migrations applied successfully");
                return Ok(());
            }

            RepositorySet::postgres(&pool)
        }
        StorageBackend::Memory => {
            warn!("using in-memory storage; all data is lost on shutdown");
            RepositorySet::in_memory(Arc::new(SystemClock))
        }
    };

    let app_state = build_app_state(
        repositories,
        config.auth_proxy_secret.clone(),
        config.frontend_url.clone(),
    );
    let app = api_router::build_router(app_state)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind API listener: {error}")))?;

    info!(%address, "envkeep api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

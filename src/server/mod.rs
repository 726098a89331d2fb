pub mod app;
pub mod error;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;
use sea_orm_migration::prelude::*;
use tracing::info;

use crate::config::{AppConfig, ExecutorKind, StorageBackend};
use crate::database::{connection::*, migrations::Migrator};
use crate::query::{ConnectorQueryExecutor, QueryExecutor, SampleQueryExecutor};
use crate::store::{EntityStore, MemoryStore, SeaOrmStore};

pub use app::{create_app, AppState};
pub use error::ApiError;

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

/// Build the application state described by `config`: the entity store
/// backend, the query executor, services and the job runner.
pub async fn build_state(config: &AppConfig) -> Result<AppState> {
    let store: Arc<dyn EntityStore> = match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory entity store");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Sqlite => {
            let database_url = get_database_url(Some(&config.storage.database_path));
            let db = establish_connection(&database_url).await?;
            setup_database(&db).await?;
            info!("Using SQLite entity store at {}", config.storage.database_path);
            Arc::new(SeaOrmStore::new(db))
        }
    };

    let executor: Arc<dyn QueryExecutor> = match config.query.executor {
        ExecutorKind::Connector => Arc::new(ConnectorQueryExecutor::new()),
        ExecutorKind::Sample => {
            info!("Using sample query executor; data sources will not be contacted");
            Arc::new(SampleQueryExecutor)
        }
    };

    Ok(AppState::new(store, executor, config))
}

pub async fn start_server(mut config: AppConfig) -> Result<()> {
    let output_dir = config.prepare_output_dir()?.to_path_buf();
    info!("Writing report files to {}", output_dir.display());

    let state = build_state(&config).await?;
    let runner = state.runner().clone();
    let app = create_app(state, config.server.cors_origin.as_deref())?;

    let port = config.server.port;
    log_routes();

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    runner
        .shutdown(Duration::from_secs(config.jobs.shutdown_grace_secs))
        .await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  /health                              - Health check");
    info!("  /api/v1/datasources                  - Data source CRUD and schema discovery");
    info!("  /api/v1/reports                      - Report CRUD");
    info!("  /api/v1/reports/:id/generate         - Start a report job");
    info!("  /api/v1/reports/:id/status           - Poll report jobs");
    info!("  /api/v1/reports/:id/download         - Download a completed report file");
}

/// Create the metadata database and bring it to the latest schema
pub async fn init_database(database_path: &str) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;
    setup_database(&db).await?;
    info!("Database initialized at {}", database_path);
    Ok(())
}

pub async fn migrate_database(database_path: &str, direction: MigrateDirection) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    match direction {
        MigrateDirection::Up => {
            info!("Running migrations up");
            Migrator::up(&db, None).await?;
        }
        MigrateDirection::Down => {
            info!("Running migrations down");
            Migrator::down(&db, None).await?;
        }
        MigrateDirection::Fresh => {
            info!("Running fresh migrations (down then up)");
            Migrator::down(&db, None).await?;
            Migrator::up(&db, None).await?;
        }
    }

    info!("Database migration completed");
    Ok(())
}

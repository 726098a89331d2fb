use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{data_sources, health, report_jobs, reports};
use crate::config::AppConfig;
use crate::export::FileSerializer;
use crate::query::QueryExecutor;
use crate::services::{DataSourceService, JobRunner, ReportGenerator, ReportService};
use crate::store::EntityStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub data_sources: DataSourceService,
    pub reports: ReportService,
}

impl AppState {
    /// Wire services, the report generator and the job runner around one store
    pub fn new(
        store: Arc<dyn EntityStore>,
        executor: Arc<dyn QueryExecutor>,
        config: &AppConfig,
    ) -> Self {
        let generator = ReportGenerator::new(
            store.clone(),
            executor.clone(),
            FileSerializer::new(&config.reports.output_dir),
            Duration::from_secs(config.jobs.query_timeout_secs),
        );
        let runner = JobRunner::new(generator, config.jobs.max_concurrent, config.jobs.max_queued);

        Self {
            data_sources: DataSourceService::new(store.clone(), executor),
            reports: ReportService::new(store.clone(), runner),
            store,
        }
    }

    pub fn runner(&self) -> &JobRunner {
        self.reports.runner()
    }
}

pub fn create_app(state: AppState, cors_origin: Option<&str>) -> Result<Router> {
    let cors = match cors_origin.filter(|origin| *origin != "*") {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("invalid CORS origin: {}", origin))?,
            )
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_v1_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    Ok(app)
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Data source routes
        .route(
            "/datasources",
            get(data_sources::list_data_sources).post(data_sources::create_data_source),
        )
        .route(
            "/datasources/:id",
            get(data_sources::get_data_source)
                .put(data_sources::update_data_source)
                .delete(data_sources::delete_data_source),
        )
        .route("/datasources/:id/schema", get(data_sources::get_schema))
        .route(
            "/datasources/:id/schema/:entity_name",
            get(data_sources::get_entity_schema),
        )
        // Report routes
        .route(
            "/reports",
            get(reports::list_reports).post(reports::create_report),
        )
        .route(
            "/reports/:id",
            get(reports::get_report)
                .put(reports::update_report)
                .delete(reports::delete_report),
        )
        // Report job routes
        .route("/reports/:id/generate", post(report_jobs::generate_report))
        .route("/reports/:id/status", get(report_jobs::get_report_status))
        .route("/reports/:id/download", get(report_jobs::download_report))
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::{GenerationError, QueryError};
use crate::export::FileSerializer;
use crate::models::ReportJob;
use crate::query::QueryExecutor;
use crate::store::EntityStore;

pub const SHUTDOWN_REASON: &str = "runner is shutting down";

/// Receives every state change of a job the generator drives
#[async_trait]
pub trait JobObserver: Send + Sync {
    async fn job_started(&self, job: &ReportJob);
    async fn job_completed(&self, job: &ReportJob);
    async fn job_failed(&self, job: &ReportJob, error: &str);
}

/// Observer that writes job transitions to the log
pub struct TracingJobObserver;

#[async_trait]
impl JobObserver for TracingJobObserver {
    async fn job_started(&self, job: &ReportJob) {
        info!(job_id = %job.id, report_id = %job.report_id, format = %job.format, "Report job started");
    }

    async fn job_completed(&self, job: &ReportJob) {
        info!(
            job_id = %job.id,
            duration_secs = job.duration_seconds().unwrap_or_default(),
            "Report job completed: {}",
            job.file_path.as_deref().unwrap_or_default()
        );
    }

    async fn job_failed(&self, job: &ReportJob, error: &str) {
        error!(job_id = %job.id, "Report job failed: {}", error);
    }
}

/// Drives a single report job from `pending` to a terminal state.
#[derive(Clone)]
pub struct ReportGenerator {
    store: Arc<dyn EntityStore>,
    executor: Arc<dyn QueryExecutor>,
    serializer: FileSerializer,
    query_timeout: Duration,
    observer: Arc<dyn JobObserver>,
}

impl ReportGenerator {
    pub fn new(
        store: Arc<dyn EntityStore>,
        executor: Arc<dyn QueryExecutor>,
        serializer: FileSerializer,
        query_timeout: Duration,
    ) -> Self {
        Self {
            store,
            executor,
            serializer,
            query_timeout,
            observer: Arc::new(TracingJobObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn JobObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Run the job to completion and return it in its terminal state.
    ///
    /// Every transition is persisted before moving on. Store failures while
    /// persisting are logged; the in-memory job still reaches a terminal state.
    pub async fn generate(&self, mut job: ReportJob, cancel: &CancellationToken) -> ReportJob {
        if job.is_terminal() {
            warn!(job_id = %job.id, status = %job.status, "Refusing to re-drive a finished job");
            return job;
        }
        if cancel.is_cancelled() {
            self.fail(&mut job, GenerationError::Cancelled(SHUTDOWN_REASON.to_string()))
                .await;
            return job;
        }

        if let Err(e) = job.start() {
            self.fail(&mut job, GenerationError::Rejected(e.to_string())).await;
            return job;
        }
        self.persist(&job).await;
        self.observer.job_started(&job).await;

        match self.run_steps(&job, cancel).await {
            Ok(path) => {
                if let Err(e) = job.complete(path.to_string_lossy()) {
                    error!(job_id = %job.id, "Could not complete job: {}", e);
                    return job;
                }
                self.persist(&job).await;
                self.observer.job_completed(&job).await;
            }
            Err(e) => self.fail(&mut job, e).await,
        }
        job
    }

    async fn run_steps(
        &self,
        job: &ReportJob,
        cancel: &CancellationToken,
    ) -> Result<std::path::PathBuf, GenerationError> {
        let cancelled = || GenerationError::Cancelled(SHUTDOWN_REASON.to_string());

        let report = self
            .store
            .get_report(job.report_id)
            .await
            .map_err(GenerationError::Report)?;

        let data_source = self
            .store
            .get_data_source(report.data_source_id)
            .await
            .map_err(GenerationError::DataSource)?;

        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        debug!(job_id = %job.id, data_source = %data_source.name, "Running report query");
        let query = tokio::time::timeout(
            self.query_timeout,
            self.executor.execute(&data_source, &report),
        );
        let rows = tokio::select! {
            _ = cancel.cancelled() => return Err(cancelled()),
            result = query => match result {
                Ok(rows) => rows.map_err(GenerationError::Query)?,
                Err(_) => return Err(GenerationError::Query(QueryError::Timeout(self.query_timeout))),
            },
        };

        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        self.serializer
            .write(job, &report, &rows)
            .await
            .map_err(GenerationError::Export)
    }

    async fn fail(&self, job: &mut ReportJob, cause: GenerationError) {
        let message = cause.to_string();
        if let Err(e) = job.fail(message.as_str()) {
            error!(job_id = %job.id, "Could not mark job failed: {}", e);
            return;
        }
        self.persist(job).await;
        self.observer.job_failed(job, &message).await;
    }

    async fn persist(&self, job: &ReportJob) {
        if let Err(e) = self.store.save_job(job).await {
            error!(job_id = %job.id, status = %job.status, "Failed to persist job: {}", e);
        }
    }
}

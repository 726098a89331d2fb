use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::job_runner::JobRunner;
use crate::errors::{ServiceError, ServiceResult};
use crate::models::{JobStatus, OutputFormat, Report, ReportJob};
use crate::store::EntityStore;

const INVALID_DATA_SOURCE: &str = "invalid data source id";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReport {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub data_source_id: Uuid,
    pub query: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReport {
    pub name: Option<String>,
    pub description: Option<String>,
    pub data_source_id: Option<Uuid>,
    pub query: Option<String>,
    pub columns: Option<Vec<String>>,
}

/// A completed job together with the location of its output file
#[derive(Debug, Clone)]
pub struct ReportDownload {
    pub job: ReportJob,
    pub path: PathBuf,
}

/// Report definitions plus the job operations hanging off them.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn EntityStore>,
    runner: JobRunner,
}

impl ReportService {
    pub fn new(store: Arc<dyn EntityStore>, runner: JobRunner) -> Self {
        Self { store, runner }
    }

    pub fn runner(&self) -> &JobRunner {
        &self.runner
    }

    pub async fn list(&self) -> ServiceResult<Vec<Report>> {
        Ok(self.store.list_reports().await?)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Report> {
        Ok(self.store.get_report(id).await?)
    }

    pub async fn create(&self, input: CreateReport) -> ServiceResult<Report> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("name must not be empty".to_string()));
        }
        self.ensure_data_source(input.data_source_id).await?;

        let report = Report::new(
            name,
            input.description,
            input.data_source_id,
            input.query,
            input.columns,
        );
        self.store.save_report(&report).await?;
        info!(id = %report.id, name = %report.name, "Created report");
        Ok(report)
    }

    pub async fn update(&self, id: Uuid, input: UpdateReport) -> ServiceResult<Report> {
        let mut report = self.store.get_report(id).await?;

        if let Some(name) = input.name.filter(|n| !n.trim().is_empty()) {
            report.name = name.trim().to_string();
        }
        if let Some(description) = input.description {
            report.description = description;
        }
        if let Some(data_source_id) = input.data_source_id {
            self.ensure_data_source(data_source_id).await?;
            report.data_source_id = data_source_id;
        }
        if let Some(query) = input.query {
            report.query = query;
        }
        if let Some(columns) = input.columns {
            report.columns = columns;
        }
        report.touch();

        self.store.save_report(&report).await?;
        Ok(report)
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        self.store.delete_report(id).await?;
        info!(id = %id, "Deleted report");
        Ok(())
    }

    /// Create a pending job for the report and hand it to the runner.
    ///
    /// Returns as soon as the job is admitted; execution continues in the
    /// background.
    pub async fn generate(&self, report_id: Uuid, format: Option<&str>) -> ServiceResult<ReportJob> {
        let report = self.store.get_report(report_id).await?;

        let format: OutputFormat = format
            .ok_or_else(|| ServiceError::Validation("format is required".to_string()))?
            .parse()
            .map_err(ServiceError::Validation)?;

        let job = ReportJob::new(report.id, format);
        self.store.save_job(&job).await?;
        info!(job_id = %job.id, report_id = %report.id, format = %format, "Report generation requested");

        self.runner.submit(job.clone()).await?;
        Ok(job)
    }

    /// One job of the report. Jobs belonging to another report are not found.
    pub async fn job(&self, report_id: Uuid, job_id: Uuid) -> ServiceResult<ReportJob> {
        self.store.get_report(report_id).await?;
        self.job_of_report(report_id, job_id).await
    }

    /// Every job of the report, newest first
    pub async fn jobs(&self, report_id: Uuid) -> ServiceResult<Vec<ReportJob>> {
        self.store.get_report(report_id).await?;
        Ok(self.store.list_jobs_for_report(report_id).await?)
    }

    pub async fn download(&self, report_id: Uuid, job_id: Option<Uuid>) -> ServiceResult<ReportDownload> {
        let job_id = job_id.ok_or_else(|| ServiceError::Validation("job_id is required".to_string()))?;
        let job = self.job_of_report(report_id, job_id).await?;

        if job.status != JobStatus::Completed {
            return Err(ServiceError::NotReady(format!(
                "report job is not completed (status: {})",
                job.status
            )));
        }
        let path = job
            .file_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| ServiceError::NotReady("report file path is missing".to_string()))?;

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ServiceError::NotFound("report file not found".to_string()));
        }
        Ok(ReportDownload { job, path })
    }

    async fn job_of_report(&self, report_id: Uuid, job_id: Uuid) -> ServiceResult<ReportJob> {
        let job = self.store.get_job(job_id).await?;
        if job.report_id != report_id {
            return Err(ServiceError::NotFound(format!(
                "report job {} does not belong to report {}",
                job_id, report_id
            )));
        }
        Ok(job)
    }

    async fn ensure_data_source(&self, id: Uuid) -> ServiceResult<()> {
        match self.store.get_data_source(id).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                Err(ServiceError::Validation(INVALID_DATA_SOURCE.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

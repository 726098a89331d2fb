//! Entity storage for data sources, reports and report jobs.
//!
//! The store is injected as `Arc<dyn EntityStore>` into the services and the
//! job orchestrator. Every method hands out owned snapshots, so a reader never
//! observes a half-updated record.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::StoreResult;
use crate::models::{DataSource, Report, ReportJob};

pub mod memory;
pub mod sea_orm_store;

pub use memory::MemoryStore;
pub use sea_orm_store::SeaOrmStore;

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Insert or replace a data source.
    ///
    /// Fails with [`StoreError::DuplicateName`](crate::errors::StoreError) when
    /// another non-deleted data source already has the same name; the check
    /// and the write are one atomic step.
    async fn save_data_source(&self, data_source: &DataSource) -> StoreResult<()>;

    /// Fetch a non-deleted data source
    async fn get_data_source(&self, id: Uuid) -> StoreResult<DataSource>;

    async fn find_data_source_by_name(&self, name: &str) -> StoreResult<Option<DataSource>>;

    /// Non-deleted data sources ordered by creation time, plus the total count
    async fn list_data_sources(&self, offset: u64, limit: u64)
        -> StoreResult<(Vec<DataSource>, u64)>;

    /// Soft delete; the record stays but is no longer visible
    async fn delete_data_source(&self, id: Uuid) -> StoreResult<()>;

    async fn save_report(&self, report: &Report) -> StoreResult<()>;

    async fn get_report(&self, id: Uuid) -> StoreResult<Report>;

    async fn list_reports(&self) -> StoreResult<Vec<Report>>;

    async fn delete_report(&self, id: Uuid) -> StoreResult<()>;

    async fn save_job(&self, job: &ReportJob) -> StoreResult<()>;

    async fn get_job(&self, id: Uuid) -> StoreResult<ReportJob>;

    /// Jobs for one report, newest first
    async fn list_jobs_for_report(&self, report_id: Uuid) -> StoreResult<Vec<ReportJob>>;
}

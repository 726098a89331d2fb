use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::EntityStore;
use crate::errors::{StoreError, StoreResult};
use crate::models::{DataSource, Report, ReportJob};

/// In-memory store with one read/write lock per collection.
#[derive(Default)]
pub struct MemoryStore {
    data_sources: RwLock<HashMap<Uuid, DataSource>>,
    reports: RwLock<HashMap<Uuid, Report>>,
    jobs: RwLock<HashMap<Uuid, ReportJob>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn save_data_source(&self, data_source: &DataSource) -> StoreResult<()> {
        if data_source.id.is_nil() {
            return Err(StoreError::InvalidEntity("data source"));
        }
        let mut data_sources = self.data_sources.write().await;
        let taken = !data_source.is_deleted
            && data_sources
                .values()
                .any(|ds| ds.id != data_source.id && !ds.is_deleted && ds.name == data_source.name);
        if taken {
            return Err(StoreError::duplicate_name("data source", &data_source.name));
        }
        data_sources.insert(data_source.id, data_source.clone());
        Ok(())
    }

    async fn get_data_source(&self, id: Uuid) -> StoreResult<DataSource> {
        self.data_sources
            .read()
            .await
            .get(&id)
            .filter(|ds| !ds.is_deleted)
            .cloned()
            .ok_or_else(|| StoreError::not_found("data source", id.to_string()))
    }

    async fn find_data_source_by_name(&self, name: &str) -> StoreResult<Option<DataSource>> {
        Ok(self
            .data_sources
            .read()
            .await
            .values()
            .find(|ds| !ds.is_deleted && ds.name == name)
            .cloned())
    }

    async fn list_data_sources(
        &self,
        offset: u64,
        limit: u64,
    ) -> StoreResult<(Vec<DataSource>, u64)> {
        let data_sources = self.data_sources.read().await;
        let mut live: Vec<&DataSource> = data_sources.values().filter(|ds| !ds.is_deleted).collect();
        live.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let total = live.len() as u64;
        let page = live
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn delete_data_source(&self, id: Uuid) -> StoreResult<()> {
        let mut data_sources = self.data_sources.write().await;
        match data_sources.get_mut(&id) {
            Some(ds) if !ds.is_deleted => {
                ds.is_deleted = true;
                ds.touch();
                Ok(())
            }
            _ => Err(StoreError::not_found("data source", id.to_string())),
        }
    }

    async fn save_report(&self, report: &Report) -> StoreResult<()> {
        if report.id.is_nil() {
            return Err(StoreError::InvalidEntity("report"));
        }
        self.reports.write().await.insert(report.id, report.clone());
        Ok(())
    }

    async fn get_report(&self, id: Uuid) -> StoreResult<Report> {
        self.reports
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("report", id.to_string()))
    }

    async fn list_reports(&self) -> StoreResult<Vec<Report>> {
        let mut reports: Vec<Report> = self.reports.read().await.values().cloned().collect();
        reports.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(reports)
    }

    async fn delete_report(&self, id: Uuid) -> StoreResult<()> {
        self.reports
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("report", id.to_string()))
    }

    async fn save_job(&self, job: &ReportJob) -> StoreResult<()> {
        if job.id.is_nil() {
            return Err(StoreError::InvalidEntity("report job"));
        }
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<ReportJob> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("report job", id.to_string()))
    }

    async fn list_jobs_for_report(&self, report_id: Uuid) -> StoreResult<Vec<ReportJob>> {
        let mut jobs: Vec<ReportJob> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| job.report_id == report_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataSourceType, OutputFormat};

    #[tokio::test]
    async fn test_soft_deleted_data_source_is_invisible() {
        let store = MemoryStore::new();
        let ds = DataSource::new("sales", DataSourceType::Csv);
        store.save_data_source(&ds).await.unwrap();

        assert_eq!(store.get_data_source(ds.id).await.unwrap().name, "sales");

        store.delete_data_source(ds.id).await.unwrap();
        assert!(store.get_data_source(ds.id).await.unwrap_err().is_not_found());
        assert!(store.find_data_source_by_name("sales").await.unwrap().is_none());
        assert_eq!(store.list_data_sources(0, 10).await.unwrap().1, 0);

        // Deleting twice reports not found
        assert!(store.delete_data_source(ds.id).await.is_err());
    }

    #[tokio::test]
    async fn test_live_data_source_names_are_unique() {
        let store = MemoryStore::new();
        let first = DataSource::new("sales", DataSourceType::Csv);
        store.save_data_source(&first).await.unwrap();

        let err = store
            .save_data_source(&DataSource::new("sales", DataSourceType::Sqlite))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName { .. }));

        // Saving the owner again is an update, not a conflict
        store.save_data_source(&first).await.unwrap();

        // The name is free again once the owner is soft deleted
        store.delete_data_source(first.id).await.unwrap();
        store
            .save_data_source(&DataSource::new("sales", DataSourceType::Sqlite))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_data_sources_paginates() {
        let store = MemoryStore::new();
        for i in 0..5 {
            let mut ds = DataSource::new(format!("ds-{}", i), DataSourceType::Sqlite);
            ds.created_at += chrono::Duration::seconds(i);
            store.save_data_source(&ds).await.unwrap();
        }

        let (page, total) = store.list_data_sources(2, 2).await.unwrap();
        assert_eq!(total, 5);
        let names: Vec<&str> = page.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["ds-2", "ds-3"]);
    }

    #[tokio::test]
    async fn test_nil_ids_are_rejected() {
        let store = MemoryStore::new();
        let mut report = Report::new("r", "", Uuid::new_v4(), "select 1", vec![]);
        report.id = Uuid::nil();
        assert!(matches!(
            store.save_report(&report).await,
            Err(StoreError::InvalidEntity("report"))
        ));
    }

    #[tokio::test]
    async fn test_jobs_are_listed_per_report_newest_first() {
        let store = MemoryStore::new();
        let report_id = Uuid::new_v4();

        let older = ReportJob::new(report_id, OutputFormat::Csv);
        let mut newer = ReportJob::new(report_id, OutputFormat::Json);
        newer.created_at = older.created_at + chrono::Duration::seconds(5);
        let other = ReportJob::new(Uuid::new_v4(), OutputFormat::Csv);

        for job in [&older, &newer, &other] {
            store.save_job(job).await.unwrap();
        }

        let jobs = store.list_jobs_for_report(report_id).await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, newer.id);
        assert_eq!(jobs[1].id, older.id);
    }

    #[tokio::test]
    async fn test_saved_job_is_a_snapshot() {
        let store = MemoryStore::new();
        let mut job = ReportJob::new(Uuid::new_v4(), OutputFormat::Csv);
        store.save_job(&job).await.unwrap();

        job.start().unwrap();
        assert_eq!(
            store.get_job(job.id).await.unwrap().status,
            crate::models::JobStatus::Pending
        );
    }
}

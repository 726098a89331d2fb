use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

use super::EntityStore;
use crate::database::entities::{data_sources, report_jobs, reports};
use crate::errors::{StoreError, StoreResult};
use crate::models::{DataSource, Report, ReportJob};

/// Entity store backed by the SQLite metadata database.
///
/// SQLite serializes writers, and each save replaces the whole row, so
/// concurrent pollers read either the previous or the next full record.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl EntityStore for SeaOrmStore {
    async fn save_data_source(&self, data_source: &DataSource) -> StoreResult<()> {
        if data_source.id.is_nil() {
            return Err(StoreError::InvalidEntity("data source"));
        }
        let model = data_sources::ActiveModel::from(data_source);
        let exists = data_sources::Entity::find_by_id(data_source.id.to_string())
            .one(&self.db)
            .await?
            .is_some();

        // The live-name unique index settles concurrent writers
        let result = if exists {
            model.update(&self.db).await.map(|_| ())
        } else {
            data_sources::Entity::insert(model).exec(&self.db).await.map(|_| ())
        };
        result.map_err(|e| name_conflict(e, &data_source.name))
    }

    async fn get_data_source(&self, id: Uuid) -> StoreResult<DataSource> {
        data_sources::Entity::find_by_id(id.to_string())
            .filter(data_sources::Column::IsDeleted.eq(false))
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::not_found("data source", id.to_string()))?
            .try_into()
    }

    async fn find_data_source_by_name(&self, name: &str) -> StoreResult<Option<DataSource>> {
        data_sources::Entity::find()
            .filter(data_sources::Column::Name.eq(name))
            .filter(data_sources::Column::IsDeleted.eq(false))
            .one(&self.db)
            .await?
            .map(DataSource::try_from)
            .transpose()
    }

    async fn list_data_sources(
        &self,
        offset: u64,
        limit: u64,
    ) -> StoreResult<(Vec<DataSource>, u64)> {
        let live = data_sources::Entity::find().filter(data_sources::Column::IsDeleted.eq(false));

        let total = live.clone().count(&self.db).await?;
        let page = live
            .order_by_asc(data_sources::Column::CreatedAt)
            .order_by_asc(data_sources::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(DataSource::try_from)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok((page, total))
    }

    async fn delete_data_source(&self, id: Uuid) -> StoreResult<()> {
        let mut data_source = self.get_data_source(id).await?;
        data_source.is_deleted = true;
        data_source.touch();

        let update = data_sources::ActiveModel {
            id: Set(id.to_string()),
            is_deleted: Set(true),
            updated_at: Set(data_source.updated_at),
            ..Default::default()
        };
        update.update(&self.db).await?;
        Ok(())
    }

    async fn save_report(&self, report: &Report) -> StoreResult<()> {
        if report.id.is_nil() {
            return Err(StoreError::InvalidEntity("report"));
        }
        let model = reports::ActiveModel::from(report);
        let exists = reports::Entity::find_by_id(report.id.to_string())
            .one(&self.db)
            .await?
            .is_some();

        if exists {
            model.update(&self.db).await?;
        } else {
            reports::Entity::insert(model).exec(&self.db).await?;
        }
        Ok(())
    }

    async fn get_report(&self, id: Uuid) -> StoreResult<Report> {
        reports::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::not_found("report", id.to_string()))?
            .try_into()
    }

    async fn list_reports(&self) -> StoreResult<Vec<Report>> {
        reports::Entity::find()
            .order_by_asc(reports::Column::CreatedAt)
            .order_by_asc(reports::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Report::try_from)
            .collect()
    }

    async fn delete_report(&self, id: Uuid) -> StoreResult<()> {
        let result = reports::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(StoreError::not_found("report", id.to_string()));
        }
        Ok(())
    }

    async fn save_job(&self, job: &ReportJob) -> StoreResult<()> {
        if job.id.is_nil() {
            return Err(StoreError::InvalidEntity("report job"));
        }
        let model = report_jobs::ActiveModel::from(job);
        let exists = report_jobs::Entity::find_by_id(job.id.to_string())
            .one(&self.db)
            .await?
            .is_some();

        if exists {
            model.update(&self.db).await?;
        } else {
            report_jobs::Entity::insert(model).exec(&self.db).await?;
        }
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<ReportJob> {
        report_jobs::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::not_found("report job", id.to_string()))?
            .try_into()
    }

    async fn list_jobs_for_report(&self, report_id: Uuid) -> StoreResult<Vec<ReportJob>> {
        report_jobs::Entity::find()
            .filter(report_jobs::Column::ReportId.eq(report_id.to_string()))
            .order_by_desc(report_jobs::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(ReportJob::try_from)
            .collect()
    }
}

fn name_conflict(err: DbErr, name: &str) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            StoreError::duplicate_name("data source", name)
        }
        _ => StoreError::Database(err),
    }
}

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::{ServiceError, ServiceResult, StoreError};
use crate::models::{DataSource, DataSourceType};
use crate::query::{EntitySchema, QueryExecutor};
use crate::store::EntityStore;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

const DUPLICATE_NAME: &str = "datasource with this name already exists";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDataSource {
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: DataSourceType,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub file_path: Option<String>,
    pub extra_params: Option<String>,
    pub description: Option<String>,
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDataSource {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub source_type: Option<DataSourceType>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub file_path: Option<String>,
    pub extra_params: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataSourcePage {
    pub data: Vec<DataSource>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Clone)]
pub struct DataSourceService {
    store: Arc<dyn EntityStore>,
    executor: Arc<dyn QueryExecutor>,
}

impl DataSourceService {
    pub fn new(store: Arc<dyn EntityStore>, executor: Arc<dyn QueryExecutor>) -> Self {
        Self { store, executor }
    }

    pub async fn create(&self, input: CreateDataSource) -> ServiceResult<DataSource> {
        let name = required_name(&input.name)?;
        self.ensure_name_free(&name, None).await?;

        let mut data_source = DataSource::new(name, input.source_type);
        data_source.host = input.host;
        data_source.port = input.port;
        data_source.username = input.username;
        data_source.password = input.password;
        data_source.database = input.database;
        data_source.file_path = input.file_path;
        data_source.extra_params = input.extra_params;
        data_source.description = input.description;

        self.store
            .save_data_source(&data_source)
            .await
            .map_err(name_taken)?;
        info!(id = %data_source.id, name = %data_source.name, "Created data source");
        Ok(data_source)
    }

    /// Page numbers start at 1; zero values fall back to the defaults and the
    /// page size is capped at [`MAX_PAGE_SIZE`].
    pub async fn list(&self, page: Option<u64>, page_size: Option<u64>) -> ServiceResult<DataSourcePage> {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let page_size = page_size
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);

        let (data, total) = self
            .store
            .list_data_sources((page - 1) * page_size, page_size)
            .await?;
        Ok(DataSourcePage {
            data,
            total,
            page,
            page_size,
        })
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<DataSource> {
        Ok(self.store.get_data_source(id).await?)
    }

    pub async fn update(&self, id: Uuid, input: UpdateDataSource) -> ServiceResult<DataSource> {
        let mut data_source = self.store.get_data_source(id).await?;

        if let Some(name) = input.name {
            let name = required_name(&name)?;
            if name != data_source.name {
                self.ensure_name_free(&name, Some(id)).await?;
            }
            data_source.name = name;
        }
        if let Some(source_type) = input.source_type {
            data_source.source_type = source_type;
        }
        replace(&mut data_source.host, input.host);
        if input.port.is_some() {
            data_source.port = input.port;
        }
        replace(&mut data_source.username, input.username);
        replace(&mut data_source.password, input.password);
        replace(&mut data_source.database, input.database);
        replace(&mut data_source.file_path, input.file_path);
        replace(&mut data_source.extra_params, input.extra_params);
        replace(&mut data_source.description, input.description);
        data_source.touch();

        self.store
            .save_data_source(&data_source)
            .await
            .map_err(name_taken)?;
        Ok(data_source)
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        self.store.delete_data_source(id).await?;
        info!(id = %id, "Deleted data source");
        Ok(())
    }

    pub async fn schema(&self, id: Uuid) -> ServiceResult<Vec<EntitySchema>> {
        let data_source = self.store.get_data_source(id).await?;
        Ok(self.executor.describe_schema(&data_source).await?)
    }

    pub async fn entity_schema(&self, id: Uuid, entity_name: &str) -> ServiceResult<EntitySchema> {
        let data_source = self.store.get_data_source(id).await?;
        Ok(self.executor.describe_entity(&data_source, entity_name).await?)
    }

    async fn ensure_name_free(&self, name: &str, current: Option<Uuid>) -> ServiceResult<()> {
        match self.store.find_data_source_by_name(name).await? {
            Some(existing) if Some(existing.id) != current => {
                Err(ServiceError::Conflict(DUPLICATE_NAME.to_string()))
            }
            _ => Ok(()),
        }
    }
}

fn required_name(name: &str) -> ServiceResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation("name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

/// The store has the final say on uniqueness when two writers race past
/// `ensure_name_free`.
fn name_taken(err: StoreError) -> ServiceError {
    match err {
        StoreError::DuplicateName { .. } => ServiceError::Conflict(DUPLICATE_NAME.to_string()),
        other => other.into(),
    }
}

fn replace(field: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *field = value;
    }
}

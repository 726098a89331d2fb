//! Query execution against external data sources.
//!
//! [`QueryExecutor`] is the seam the job orchestrator calls through. The
//! production implementation, [`ConnectorQueryExecutor`], dispatches on the
//! data source type to a [`Connector`]; [`SampleQueryExecutor`] returns fixed
//! rows and is used by the demo command and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{QueryError, QueryResult};
use crate::models::{DataSource, DataSourceType, Report, Row};

pub mod csv_file;
pub mod sample;
pub mod sql;

pub use csv_file::CsvFileConnector;
pub use sample::SampleQueryExecutor;
pub use sql::SqlConnector;

/// A column of a table, view or file exposed by a data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// A queryable entity (table, view, file) and its columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run `report.query` against the data source and materialize every row.
    async fn execute(&self, data_source: &DataSource, report: &Report) -> QueryResult<Vec<Row>>;

    /// List the entities the data source exposes.
    async fn describe_schema(&self, data_source: &DataSource) -> QueryResult<Vec<EntitySchema>>;

    /// Describe a single entity by name.
    async fn describe_entity(
        &self,
        data_source: &DataSource,
        entity_name: &str,
    ) -> QueryResult<EntitySchema> {
        self.describe_schema(data_source)
            .await?
            .into_iter()
            .find(|entity| entity.name == entity_name)
            .ok_or_else(|| QueryError::EntityNotFound(entity_name.to_string()))
    }
}

/// One connection strategy, e.g. SQL over sea-orm or CSV files on disk.
///
/// Implementations acquire and release their connection within each call.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn query(&self, data_source: &DataSource, query: &str) -> QueryResult<Vec<Row>>;

    async fn describe(&self, data_source: &DataSource) -> QueryResult<Vec<EntitySchema>>;
}

/// Dispatches each call to the connector registered for the data source type.
#[derive(Clone)]
pub struct ConnectorQueryExecutor {
    connectors: HashMap<DataSourceType, Arc<dyn Connector>>,
}

impl Default for ConnectorQueryExecutor {
    fn default() -> Self {
        let sql: Arc<dyn Connector> = Arc::new(SqlConnector);
        Self::empty()
            .with_connector(DataSourceType::PostgreSql, sql.clone())
            .with_connector(DataSourceType::MySql, sql.clone())
            .with_connector(DataSourceType::Sqlite, sql)
            .with_connector(DataSourceType::Csv, Arc::new(CsvFileConnector))
    }
}

impl ConnectorQueryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// An executor with no connectors registered
    pub fn empty() -> Self {
        Self {
            connectors: HashMap::new(),
        }
    }

    pub fn with_connector(
        mut self,
        source_type: DataSourceType,
        connector: Arc<dyn Connector>,
    ) -> Self {
        self.connectors.insert(source_type, connector);
        self
    }

    pub fn supports(&self, source_type: DataSourceType) -> bool {
        self.connectors.contains_key(&source_type)
    }

    fn connector_for(&self, data_source: &DataSource) -> QueryResult<&Arc<dyn Connector>> {
        self.connectors
            .get(&data_source.source_type)
            .ok_or(QueryError::UnsupportedType(data_source.source_type))
    }
}

#[async_trait]
impl QueryExecutor for ConnectorQueryExecutor {
    async fn execute(&self, data_source: &DataSource, report: &Report) -> QueryResult<Vec<Row>> {
        let connector = self.connector_for(data_source)?;
        tracing::debug!(
            data_source = %data_source.name,
            source_type = %data_source.source_type,
            "Executing report query"
        );
        connector.query(data_source, &report.query).await
    }

    async fn describe_schema(&self, data_source: &DataSource) -> QueryResult<Vec<EntitySchema>> {
        self.connector_for(data_source)?.describe(data_source).await
    }
}

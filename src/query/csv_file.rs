use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{ColumnSchema, Connector, EntitySchema};
use crate::errors::{QueryError, QueryResult};
use crate::models::{CellValue, DataSource, Row};

/// Reads CSV files from disk. The report query is not interpreted: the whole
/// file is the result set, with column names taken from the header.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFileConnector;

fn file_path(data_source: &DataSource) -> QueryResult<PathBuf> {
    data_source
        .file_path
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| QueryError::InvalidConfig("csv data source requires file_path".to_string()))
}

fn read_rows(path: &Path) -> QueryResult<Vec<Row>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(name, raw)| (name.to_string(), CellValue::infer(raw)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn read_schema(path: &Path) -> QueryResult<EntitySchema> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let first = reader.records().next().transpose()?;

    let columns = headers
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let sample = first
                .as_ref()
                .and_then(|r| r.get(i))
                .map(CellValue::infer)
                .unwrap_or(CellValue::Null);
            ColumnSchema {
                name: name.to_string(),
                data_type: inferred_type(&sample).to_string(),
                nullable: true,
            }
        })
        .collect();

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(EntitySchema { name, columns })
}

fn inferred_type(value: &CellValue) -> &'static str {
    match value {
        CellValue::Null | CellValue::Text(_) => "text",
        CellValue::Bool(_) => "boolean",
        CellValue::Integer(_) => "integer",
        CellValue::Float(_) => "float",
        CellValue::Date(_) => "date",
    }
}

async fn blocking<T, F>(f: F) -> QueryResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> QueryResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| QueryError::Execution(format!("csv reader task failed: {}", e)))?
}

#[async_trait]
impl Connector for CsvFileConnector {
    async fn query(&self, data_source: &DataSource, _query: &str) -> QueryResult<Vec<Row>> {
        let path = file_path(data_source)?;
        blocking(move || read_rows(&path)).await
    }

    async fn describe(&self, data_source: &DataSource) -> QueryResult<Vec<EntitySchema>> {
        let path = file_path(data_source)?;
        let entity = blocking(move || read_schema(&path)).await?;
        Ok(vec![entity])
    }
}

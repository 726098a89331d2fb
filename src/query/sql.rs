use async_trait::async_trait;
use indexmap::IndexMap;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, FromQueryResult, JsonValue,
    Statement,
};
use url::Url;

use super::{ColumnSchema, Connector, EntitySchema};
use crate::errors::{QueryError, QueryResult};
use crate::models::{row_from_json, DataSource, DataSourceType, Row};

const SQLITE_SCHEMA_SQL: &str = r#"
SELECT m.name AS table_name,
       p.name AS column_name,
       p.type AS data_type,
       CASE WHEN p."notnull" = 0 THEN 'YES' ELSE 'NO' END AS is_nullable
FROM sqlite_master m
JOIN pragma_table_info(m.name) p
WHERE m.type IN ('table', 'view') AND m.name NOT LIKE 'sqlite_%'
ORDER BY m.name, p.cid
"#;

const POSTGRES_SCHEMA_SQL: &str = r#"
SELECT table_name::text AS table_name,
       column_name::text AS column_name,
       data_type::text AS data_type,
       is_nullable::text AS is_nullable
FROM information_schema.columns
WHERE table_schema = 'public'
ORDER BY table_name, ordinal_position
"#;

const MYSQL_SCHEMA_SQL: &str = r#"
SELECT CAST(table_name AS CHAR) AS table_name,
       CAST(column_name AS CHAR) AS column_name,
       CAST(data_type AS CHAR) AS data_type,
       CAST(is_nullable AS CHAR) AS is_nullable
FROM information_schema.columns
WHERE table_schema = DATABASE()
ORDER BY table_name, ordinal_position
"#;

#[derive(Debug, FromQueryResult)]
struct ColumnRow {
    table_name: String,
    column_name: String,
    data_type: String,
    is_nullable: String,
}

/// Connector for SQL databases reachable through sea-orm (SQLite, PostgreSQL, MySQL).
///
/// A connection is opened per call and closed before returning, whether the
/// statement succeeded or not.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlConnector;

impl SqlConnector {
    async fn connect(data_source: &DataSource) -> QueryResult<DatabaseConnection> {
        let url = connection_url(data_source)?;
        Database::connect(url.as_str())
            .await
            .map_err(|e| QueryError::Connection(e.to_string()))
    }
}

#[async_trait]
impl Connector for SqlConnector {
    async fn query(&self, data_source: &DataSource, query: &str) -> QueryResult<Vec<Row>> {
        let conn = Self::connect(data_source).await?;
        let backend = conn.get_database_backend();

        let result = JsonValue::find_by_statement(Statement::from_string(backend, query))
            .all(&conn)
            .await;
        close(conn, data_source).await;

        let rows: Vec<Row> = result?.into_iter().map(row_from_json).collect();
        tracing::debug!(data_source = %data_source.name, rows = rows.len(), "Query returned");
        Ok(rows)
    }

    async fn describe(&self, data_source: &DataSource) -> QueryResult<Vec<EntitySchema>> {
        let sql = match data_source.source_type {
            DataSourceType::Sqlite => SQLITE_SCHEMA_SQL,
            DataSourceType::PostgreSql => POSTGRES_SCHEMA_SQL,
            DataSourceType::MySql => MYSQL_SCHEMA_SQL,
            other => return Err(QueryError::UnsupportedType(other)),
        };

        let conn = Self::connect(data_source).await?;
        let backend = conn.get_database_backend();
        let result = ColumnRow::find_by_statement(Statement::from_string(backend, sql))
            .all(&conn)
            .await;
        close(conn, data_source).await;

        Ok(group_columns(result?))
    }
}

async fn close(conn: DatabaseConnection, data_source: &DataSource) {
    if let Err(e) = conn.close().await {
        tracing::warn!(data_source = %data_source.name, "Failed to close connection: {}", e);
    }
}

fn group_columns(rows: Vec<ColumnRow>) -> Vec<EntitySchema> {
    let mut entities: IndexMap<String, Vec<ColumnSchema>> = IndexMap::new();
    for row in rows {
        entities.entry(row.table_name).or_default().push(ColumnSchema {
            name: row.column_name,
            data_type: row.data_type,
            nullable: row.is_nullable.eq_ignore_ascii_case("YES"),
        });
    }
    entities
        .into_iter()
        .map(|(name, columns)| EntitySchema { name, columns })
        .collect()
}

/// Build the sea-orm connection URL for a SQL data source.
///
/// Credentials are percent-encoded; `extra_params` is appended verbatim as the
/// query string. SQLite sources are opened read-only.
pub fn connection_url(data_source: &DataSource) -> QueryResult<String> {
    let (scheme, default_port) = match data_source.source_type {
        DataSourceType::Sqlite => {
            let path = non_empty(&data_source.file_path).ok_or_else(|| {
                QueryError::InvalidConfig("sqlite data source requires file_path".to_string())
            })?;
            return Ok(format!("sqlite:{}?mode=ro", path));
        }
        DataSourceType::PostgreSql => ("postgres", 5432),
        DataSourceType::MySql => ("mysql", 3306),
        other => return Err(QueryError::UnsupportedType(other)),
    };

    let host = non_empty(&data_source.host).ok_or_else(|| {
        QueryError::InvalidConfig(format!("{} data source requires host", data_source.source_type))
    })?;
    let invalid = |what: &str| QueryError::InvalidConfig(format!("invalid {}", what));

    let mut url =
        Url::parse(&format!("{}://{}", scheme, host)).map_err(|_| invalid("host"))?;
    url.set_port(Some(data_source.port.unwrap_or(default_port)))
        .map_err(|_| invalid("port"))?;
    if let Some(username) = non_empty(&data_source.username) {
        url.set_username(username).map_err(|_| invalid("username"))?;
    }
    if let Some(password) = non_empty(&data_source.password) {
        url.set_password(Some(password))
            .map_err(|_| invalid("password"))?;
    }
    if let Some(database) = non_empty(&data_source.database) {
        url.set_path(database);
    }
    if let Some(params) = non_empty(&data_source.extra_params) {
        url.set_query(Some(params.trim_start_matches('?')));
    }

    Ok(url.to_string())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

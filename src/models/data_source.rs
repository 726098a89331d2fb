use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceType {
    PostgreSql,
    MySql,
    Csv,
    ClickHouse,
    Sqlite,
}

impl DataSourceType {
    pub const ALL: [DataSourceType; 5] = [
        DataSourceType::PostgreSql,
        DataSourceType::MySql,
        DataSourceType::Csv,
        DataSourceType::ClickHouse,
        DataSourceType::Sqlite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceType::PostgreSql => "postgresql",
            DataSourceType::MySql => "mysql",
            DataSourceType::Csv => "csv",
            DataSourceType::ClickHouse => "clickhouse",
            DataSourceType::Sqlite => "sqlite",
        }
    }

    /// File-backed sources are addressed by `file_path` rather than host/port.
    pub fn is_file_based(&self) -> bool {
        matches!(self, DataSourceType::Csv | DataSourceType::Sqlite)
    }
}

impl fmt::Display for DataSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataSourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unsupported data source type: {}", s))
    }
}

/// Connection configuration for an external system a report can query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: DataSourceType,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    pub database: Option<String>,
    pub file_path: Option<String>,
    /// Free-form connection parameters in query-string form, e.g. `sslmode=disable`
    pub extra_params: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DataSource {
    pub fn new(name: impl Into<String>, source_type: DataSourceType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            source_type,
            host: None,
            port: None,
            username: None,
            password: None,
            database: None,
            file_path: None,
            extra_params: None,
            description: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

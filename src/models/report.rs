use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved query plus its declared output columns, bound to one data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub data_source_id: Uuid,
    /// Interpreted by the connector for the data source's type
    pub query: String,
    /// Output column order; empty means "whatever the query returns"
    pub columns: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        data_source_id: Uuid,
        query: impl Into<String>,
        columns: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            data_source_id,
            query: query.into(),
            columns,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

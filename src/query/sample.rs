use async_trait::async_trait;
use chrono::NaiveDate;

use super::{ColumnSchema, EntitySchema, QueryExecutor};
use crate::errors::QueryResult;
use crate::models::{CellValue, DataSource, Report, Row};

/// Stand-in executor that ignores the data source and returns three fixed rows.
#[derive(Debug, Clone, Default)]
pub struct SampleQueryExecutor;

impl SampleQueryExecutor {
    pub fn rows() -> Vec<Row> {
        (1..=3)
            .map(|i: i64| {
                let mut row = Row::new();
                row.insert("id".to_string(), CellValue::Integer(i));
                row.insert("name".to_string(), CellValue::Text(format!("Sample {}", i)));
                row.insert("value".to_string(), CellValue::Integer(i * 100));
                row.insert(
                    "date".to_string(),
                    NaiveDate::from_ymd_opt(2023, 1, i as u32)
                        .map(CellValue::Date)
                        .unwrap_or(CellValue::Null),
                );
                row
            })
            .collect()
    }
}

#[async_trait]
impl QueryExecutor for SampleQueryExecutor {
    async fn execute(&self, _data_source: &DataSource, _report: &Report) -> QueryResult<Vec<Row>> {
        Ok(Self::rows())
    }

    async fn describe_schema(&self, _data_source: &DataSource) -> QueryResult<Vec<EntitySchema>> {
        let column = |name: &str, data_type: &str| ColumnSchema {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable: false,
        };
        Ok(vec![EntitySchema {
            name: "sample".to_string(),
            columns: vec![
                column("id", "integer"),
                column("name", "text"),
                column("value", "integer"),
                column("date", "date"),
            ],
        }])
    }
}

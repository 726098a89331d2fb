use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::models::Report;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub description: String,
    pub data_source_id: String,
    pub query: String,
    pub columns: String, // JSON array of column names
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::data_sources::Entity",
        from = "Column::DataSourceId",
        to = "super::data_sources::Column::Id"
    )]
    DataSources,
    #[sea_orm(has_many = "super::report_jobs::Entity")]
    ReportJobs,
}

impl Related<super::data_sources::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DataSources.def()
    }
}

impl Related<super::report_jobs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportJobs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parse the stored column list
    pub fn get_columns(&self) -> Result<Vec<String>, serde_json::Error> {
        serde_json::from_str(&self.columns)
    }
}

impl TryFrom<Model> for Report {
    type Error = StoreError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let columns = model
            .get_columns()
            .map_err(|e| StoreError::corrupt("report", &model.id, e.to_string()))?;
        let id = Uuid::parse_str(&model.id)
            .map_err(|e| StoreError::corrupt("report", &model.id, e.to_string()))?;
        let data_source_id = Uuid::parse_str(&model.data_source_id)
            .map_err(|e| StoreError::corrupt("report", &model.id, e.to_string()))?;

        Ok(Report {
            id,
            name: model.name,
            description: model.description,
            data_source_id,
            query: model.query,
            columns,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<&Report> for ActiveModel {
    fn from(report: &Report) -> Self {
        // Vec<String> always serializes
        let columns = serde_json::to_string(&report.columns).unwrap_or_else(|_| "[]".to_string());
        ActiveModel {
            id: Set(report.id.to_string()),
            name: Set(report.name.clone()),
            description: Set(report.description.clone()),
            data_source_id: Set(report.data_source_id.to_string()),
            query: Set(report.query.clone()),
            columns: Set(columns),
            created_at: Set(report.created_at),
            updated_at: Set(report.updated_at),
        }
    }
}

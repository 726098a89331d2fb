use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::models::{JobStatus, OutputFormat, ReportJob};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report_jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub report_id: String,
    pub format: String,
    pub status: String,
    pub file_path: Option<String>,
    pub error: Option<String>,
    pub started_at: Option<ChronoDateTimeUtc>,
    pub completed_at: Option<ChronoDateTimeUtc>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reports::Entity",
        from = "Column::ReportId",
        to = "super::reports::Column::Id"
    )]
    Reports,
}

impl Related<super::reports::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reports.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn get_status(&self) -> Result<JobStatus, String> {
        self.status.parse()
    }

    pub fn is_terminal(&self) -> bool {
        self.get_status().map(|s| s.is_terminal()).unwrap_or(false)
    }
}

impl TryFrom<Model> for ReportJob {
    type Error = StoreError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::corrupt("report job", &model.id, reason);

        let id = Uuid::parse_str(&model.id).map_err(|e| corrupt(e.to_string()))?;
        let report_id = Uuid::parse_str(&model.report_id).map_err(|e| corrupt(e.to_string()))?;
        let format = model.format.parse::<OutputFormat>().map_err(corrupt)?;
        let status = model.get_status().map_err(corrupt)?;

        Ok(ReportJob {
            id,
            report_id,
            format,
            status,
            file_path: model.file_path,
            error: model.error,
            started_at: model.started_at,
            completed_at: model.completed_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<&ReportJob> for ActiveModel {
    fn from(job: &ReportJob) -> Self {
        ActiveModel {
            id: Set(job.id.to_string()),
            report_id: Set(job.report_id.to_string()),
            format: Set(job.format.extension().to_string()),
            status: Set(job.status.into()),
            file_path: Set(job.file_path.clone()),
            error: Set(job.error.clone()),
            started_at: Set(job.started_at),
            completed_at: Set(job.completed_at),
            created_at: Set(job.created_at),
            updated_at: Set(job.updated_at),
        }
    }
}

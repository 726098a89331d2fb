use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::models::{DataSource, DataSourceType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "data_sources")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub source_type: String,
    pub host: Option<String>,
    pub port: Option<i32>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub file_path: Option<String>,
    pub extra_params: Option<String>,
    pub description: Option<String>,
    pub is_deleted: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reports::Entity")]
    Reports,
}

impl Related<super::reports::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reports.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for DataSource {
    type Error = StoreError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&model.id)
            .map_err(|e| StoreError::corrupt("data source", &model.id, e.to_string()))?;
        let source_type = model
            .source_type
            .parse::<DataSourceType>()
            .map_err(|e| StoreError::corrupt("data source", &model.id, e))?;
        let port = model
            .port
            .map(u16::try_from)
            .transpose()
            .map_err(|e| StoreError::corrupt("data source", &model.id, e.to_string()))?;

        Ok(DataSource {
            id,
            name: model.name,
            source_type,
            host: model.host,
            port,
            username: model.username,
            password: model.password,
            database: model.database,
            file_path: model.file_path,
            extra_params: model.extra_params,
            description: model.description,
            is_deleted: model.is_deleted,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<&DataSource> for ActiveModel {
    fn from(ds: &DataSource) -> Self {
        ActiveModel {
            id: Set(ds.id.to_string()),
            name: Set(ds.name.clone()),
            source_type: Set(ds.source_type.as_str().to_string()),
            host: Set(ds.host.clone()),
            port: Set(ds.port.map(i32::from)),
            username: Set(ds.username.clone()),
            password: Set(ds.password.clone()),
            database: Set(ds.database.clone()),
            file_path: Set(ds.file_path.clone()),
            extra_params: Set(ds.extra_params.clone()),
            description: Set(ds.description.clone()),
            is_deleted: Set(ds.is_deleted),
            created_at: Set(ds.created_at),
            updated_at: Set(ds.updated_at),
        }
    }
}

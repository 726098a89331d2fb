use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use super::parse_id;
use crate::models::DataSource;
use crate::query::EntitySchema;
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::services::{CreateDataSource, DataSourcePage, UpdateDataSource};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

pub async fn list_data_sources(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<DataSourcePage>, ApiError> {
    let Query(params) = params?;
    let page = state.data_sources.list(params.page, params.page_size).await?;
    Ok(Json(page))
}

pub async fn get_data_source(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataSource>, ApiError> {
    let id = parse_id(&id, "data source")?;
    Ok(Json(state.data_sources.get(id).await?))
}

pub async fn create_data_source(
    State(state): State<AppState>,
    payload: Result<Json<CreateDataSource>, JsonRejection>,
) -> Result<(StatusCode, Json<DataSource>), ApiError> {
    let Json(input) = payload?;
    let data_source = state.data_sources.create(input).await?;
    Ok((StatusCode::CREATED, Json(data_source)))
}

pub async fn update_data_source(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateDataSource>, JsonRejection>,
) -> Result<Json<DataSource>, ApiError> {
    let id = parse_id(&id, "data source")?;
    let Json(input) = payload?;
    Ok(Json(state.data_sources.update(id, input).await?))
}

pub async fn delete_data_source(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "data source")?;
    state.data_sources.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_schema(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<EntitySchema>>, ApiError> {
    let id = parse_id(&id, "data source")?;
    Ok(Json(state.data_sources.schema(id).await?))
}

pub async fn get_entity_schema(
    State(state): State<AppState>,
    Path((id, entity_name)): Path<(String, String)>,
) -> Result<Json<EntitySchema>, ApiError> {
    let id = parse_id(&id, "data source")?;
    Ok(Json(state.data_sources.entity_schema(id, &entity_name).await?))
}

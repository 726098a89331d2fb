use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};

use super::parse_id;
use crate::models::Report;
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::services::{CreateReport, UpdateReport};

pub async fn list_reports(State(state): State<AppState>) -> Result<Json<Vec<Report>>, ApiError> {
    Ok(Json(state.reports.list().await?))
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Report>, ApiError> {
    let id = parse_id(&id, "report")?;
    Ok(Json(state.reports.get(id).await?))
}

pub async fn create_report(
    State(state): State<AppState>,
    payload: Result<Json<CreateReport>, JsonRejection>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let Json(input) = payload?;
    let report = state.reports.create(input).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn update_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateReport>, JsonRejection>,
) -> Result<Json<Report>, ApiError> {
    let id = parse_id(&id, "report")?;
    let Json(input) = payload?;
    Ok(Json(state.reports.update(id, input).await?))
}

pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "report")?;
    state.reports.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

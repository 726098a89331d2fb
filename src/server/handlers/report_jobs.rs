use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::parse_id;
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    pub format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobQuery {
    pub job_id: Option<String>,
}

impl JobQuery {
    fn job_id(&self) -> Result<Option<Uuid>, ApiError> {
        match self.job_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_id(raw, "report job").map(Some),
        }
    }
}

/// Create a job and start generating it in the background. Responds with 202
/// before any query runs.
pub async fn generate_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let report_id = parse_id(&id, "report")?;
    // A malformed body is reported as a missing format, after the report lookup
    let format = payload.ok().and_then(|Json(request)| request.format);

    let job = state.reports.generate(report_id, format.as_deref()).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "job_id": job.id,
            "status": job.status,
        })),
    ))
}

pub async fn get_report_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<JobQuery>,
) -> Result<Response, ApiError> {
    let report_id = parse_id(&id, "report")?;
    let job_id = query.job_id()?;

    let response = match job_id {
        Some(job_id) => Json(state.reports.job(report_id, job_id).await?).into_response(),
        None => Json(state.reports.jobs(report_id).await?).into_response(),
    };
    Ok(response)
}

pub async fn download_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<JobQuery>,
) -> Result<Response, ApiError> {
    let report_id = parse_id(&id, "report")?;
    let job_id = query.job_id()?;

    let download = state.reports.download(report_id, job_id).await?;
    let body = tokio::fs::read(&download.path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ApiError::not_found("report file not found")
        } else {
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                format!("failed to read report file: {}", e),
            )
        }
    })?;

    let headers = [
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", download.job.download_name()),
        ),
        (
            header::CONTENT_TYPE,
            download.job.format.content_type().to_string(),
        ),
    ];
    Ok((headers, body).into_response())
}

pub mod data_sources;
pub mod health;
pub mod report_jobs;
pub mod reports;

use uuid::Uuid;

use super::error::ApiError;

/// Ids arrive as path or query strings; anything that is not a UUID cannot
/// name an existing entity.
pub(crate) fn parse_id(raw: &str, entity: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found(format!("{} {} not found", entity, raw)))
}

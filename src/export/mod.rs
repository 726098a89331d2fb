//! Report output files.
//!
//! [`FileSerializer`] turns a result set into a CSV or JSON file under the
//! configured output directory. Files appear atomically: content goes to a
//! `.part` sibling first and is renamed into place only once fully written.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;

use crate::errors::{ExportError, ExportResult};
use crate::models::{OutputFormat, Report, ReportJob, Row};

pub mod to_csv;
pub mod to_json;

/// Columns the output carries: the report's declared columns, or the union of
/// row keys in first-seen order when none are declared.
pub fn resolve_columns(report: &Report, rows: &[Row]) -> Vec<String> {
    if !report.columns.is_empty() {
        return report.columns.clone();
    }
    let mut seen = IndexSet::new();
    for row in rows {
        for key in row.keys() {
            if !seen.contains(key) {
                seen.insert(key.clone());
            }
        }
    }
    seen.into_iter().collect()
}

pub fn render(format: OutputFormat, columns: &[String], rows: &[Row]) -> ExportResult<Vec<u8>> {
    match format {
        OutputFormat::Csv => to_csv::render(columns, rows),
        OutputFormat::Json => to_json::render(columns, rows),
    }
}

#[derive(Debug, Clone)]
pub struct FileSerializer {
    output_dir: PathBuf,
}

impl FileSerializer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `{output_dir}/{report_id}_{job_id}.{ext}`
    pub fn path_for(&self, job: &ReportJob) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}.{}",
            job.report_id,
            job.id,
            job.format.extension()
        ))
    }

    /// Write the job's output file and return its path.
    pub async fn write(&self, job: &ReportJob, report: &Report, rows: &[Row]) -> ExportResult<PathBuf> {
        let columns = resolve_columns(report, rows);
        let content = render(job.format, &columns, rows)?;

        let path = self.path_for(job);
        let part = part_path(&path);

        tokio::fs::create_dir_all(&self.output_dir).await?;
        if let Err(e) = write_then_rename(&part, &path, &content).await {
            if let Err(cleanup) = tokio::fs::remove_file(&part).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove partial file {}: {}", part.display(), cleanup);
                }
            }
            return Err(e);
        }

        tracing::debug!(
            job_id = %job.id,
            rows = rows.len(),
            bytes = content.len(),
            "Wrote report file {}",
            path.display()
        );
        Ok(path)
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn write_then_rename(part: &Path, path: &Path, content: &[u8]) -> Result<(), ExportError> {
    tokio::fs::write(part, content).await?;
    tokio::fs::rename(part, path).await?;
    Ok(())
}

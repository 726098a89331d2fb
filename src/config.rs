//! Application configuration.
//!
//! Loaded from an optional TOML file; every field has a default, so an empty
//! or missing file yields a working in-memory setup. Command-line flags are
//! applied on top by the binary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub reports: ReportsConfig,
    pub jobs: JobsConfig,
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Allowed CORS origin; any origin when unset
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_origin: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database_path: "reporthub.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    pub output_dir: PathBuf,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    pub max_concurrent: usize,
    pub max_queued: usize,
    pub query_timeout_secs: u64,
    pub shutdown_grace_secs: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            max_queued: 64,
            query_timeout_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// Real per-type connectors
    Connector,
    /// Fixed sample rows, no external systems
    Sample,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub executor: ExecutorKind,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            executor: ExecutorKind::Connector,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Defaults when no file is given
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Create the output directory if needed and make the configured path
    /// absolute.
    pub fn prepare_output_dir(&mut self) -> Result<&Path> {
        let dir = &self.reports.output_dir;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        self.reports.output_dir = dir
            .canonicalize()
            .with_context(|| format!("resolving output directory {}", dir.display()))?;
        Ok(&self.reports.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.reports.output_dir, PathBuf::from("./output"));
        assert_eq!(config.jobs.max_concurrent, 4);
        assert_eq!(config.jobs.query_timeout_secs, 30);
        assert_eq!(config.query.executor, ExecutorKind::Connector);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [storage]
            backend = "sqlite"

            [jobs]
            max_queued = 2

            [query]
            executor = "sample"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.database_path, "reporthub.db");
        assert_eq!(config.jobs.max_queued, 2);
        assert_eq!(config.jobs.max_concurrent, 4);
        assert_eq!(config.query.executor, ExecutorKind::Sample);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(AppConfig::from_toml("[storage]\nbackend = \"redis\"\n").is_err());
    }

    #[test]
    fn test_prepare_output_dir_creates_absolute_path() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.reports.output_dir = dir.path().join("a").join("b");

        let resolved = config.prepare_output_dir().unwrap().to_path_buf();
        assert!(resolved.is_absolute());
        assert!(resolved.is_dir());
    }
}

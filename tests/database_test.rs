//! Database functionality tests
//!
//! Runs the SeaORM entity store against a migrated SQLite file.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reporthub::database::{establish_connection, get_database_url, setup_database};
use reporthub::errors::{ServiceError, StoreError};
use reporthub::models::{DataSource, DataSourceType, OutputFormat, Report, ReportJob};
use reporthub::query::SampleQueryExecutor;
use reporthub::services::{CreateDataSource, DataSourceService};
use reporthub::store::{EntityStore, SeaOrmStore};
use tokio::sync::Barrier;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Create a migrated store backed by a temporary SQLite file
async fn setup_test_store() -> Result<(SeaOrmStore, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let db_url = get_database_url(temp_file.path().to_str());

    let db = establish_connection(&db_url).await?;
    setup_database(&db).await?;

    Ok((SeaOrmStore::new(db), temp_file))
}

fn postgres_source(name: &str) -> DataSource {
    let mut ds = DataSource::new(name, DataSourceType::PostgreSql);
    ds.host = Some("db.internal".to_string());
    ds.port = Some(5432);
    ds.username = Some("reporter".to_string());
    ds.password = Some("secret".to_string());
    ds.database = Some("sales".to_string());
    ds.extra_params = Some("sslmode=disable".to_string());
    ds
}

#[tokio::test]
async fn test_migrations_are_idempotent() -> Result<()> {
    let (store, _temp_file) = setup_test_store().await?;
    setup_database(store.connection()).await?;

    let (items, total) = store.list_data_sources(0, 10).await?;
    assert!(items.is_empty());
    assert_eq!(total, 0);
    assert!(store.list_reports().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_data_source_crud_operations() -> Result<()> {
    let (store, _temp_file) = setup_test_store().await?;

    let ds = postgres_source("warehouse");
    store.save_data_source(&ds).await?;

    let loaded = store.get_data_source(ds.id).await?;
    assert_eq!(loaded.name, "warehouse");
    assert_eq!(loaded.source_type, DataSourceType::PostgreSql);
    assert_eq!(loaded.port, Some(5432));
    assert_eq!(loaded.password.as_deref(), Some("secret"));
    assert_eq!(loaded.extra_params.as_deref(), Some("sslmode=disable"));

    // Save again replaces the record
    let mut updated = loaded.clone();
    updated.description = Some("primary warehouse".to_string());
    updated.touch();
    store.save_data_source(&updated).await?;

    let reloaded = store.get_data_source(ds.id).await?;
    assert_eq!(reloaded.description.as_deref(), Some("primary warehouse"));

    let by_name = store.find_data_source_by_name("warehouse").await?;
    assert_eq!(by_name.map(|d| d.id), Some(ds.id));
    assert!(store.find_data_source_by_name("missing").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_data_source_soft_delete() -> Result<()> {
    let (store, _temp_file) = setup_test_store().await?;

    let ds = postgres_source("warehouse");
    store.save_data_source(&ds).await?;
    store.delete_data_source(ds.id).await?;

    assert!(store.get_data_source(ds.id).await.unwrap_err().is_not_found());
    assert!(store.find_data_source_by_name("warehouse").await?.is_none());
    let (_, total) = store.list_data_sources(0, 10).await?;
    assert_eq!(total, 0);

    // Deleting twice reports the record as gone
    assert!(store.delete_data_source(ds.id).await.unwrap_err().is_not_found());

    Ok(())
}

#[tokio::test]
async fn test_live_data_source_names_are_unique() -> Result<()> {
    let (store, _temp_file) = setup_test_store().await?;

    let first = postgres_source("warehouse");
    store.save_data_source(&first).await?;

    let err = store
        .save_data_source(&postgres_source("warehouse"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateName { .. }));

    // Renaming another source onto a taken name is rejected as well
    let mut other = postgres_source("archive");
    store.save_data_source(&other).await?;
    other.name = "warehouse".to_string();
    assert!(matches!(
        store.save_data_source(&other).await,
        Err(StoreError::DuplicateName { .. })
    ));

    // Soft-deleted rows release the name
    store.delete_data_source(first.id).await?;
    store.save_data_source(&other).await?;
    assert_eq!(
        store.find_data_source_by_name("warehouse").await?.map(|d| d.id),
        Some(other.id)
    );

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_with_same_name_admit_one() -> Result<()> {
    let (store, _temp_file) = setup_test_store().await?;
    let service = DataSourceService::new(Arc::new(store), Arc::new(SampleQueryExecutor));
    let barrier = Arc::new(Barrier::new(8));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                service
                    .create(CreateDataSource {
                        name: "dup".to_string(),
                        source_type: DataSourceType::Sqlite,
                        host: None,
                        port: None,
                        username: None,
                        password: None,
                        database: None,
                        file_path: Some("/data/dup.db".to_string()),
                        extra_params: None,
                        description: None,
                    })
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for task in tasks {
        match task.await? {
            Ok(_) => created += 1,
            Err(err) => assert!(matches!(err, ServiceError::Conflict(_)), "{}", err),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(service.list(None, None).await?.total, 1);

    Ok(())
}

#[tokio::test]
async fn test_data_source_pagination() -> Result<()> {
    let (store, _temp_file) = setup_test_store().await?;

    for i in 0..5 {
        let ds = DataSource::new(format!("source-{}", i), DataSourceType::Sqlite)
            .with_file_path(format!("/data/{}.db", i));
        store.save_data_source(&ds).await?;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let (first, total) = store.list_data_sources(0, 2).await?;
    assert_eq!(total, 5);
    assert_eq!(
        first.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
        vec!["source-0", "source-1"]
    );

    let (last, _) = store.list_data_sources(4, 2).await?;
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].name, "source-4");

    Ok(())
}

#[tokio::test]
async fn test_report_crud_operations() -> Result<()> {
    let (store, _temp_file) = setup_test_store().await?;
    let ds = postgres_source("warehouse");
    store.save_data_source(&ds).await?;

    let report = Report::new(
        "Sales",
        "Monthly sales",
        ds.id,
        "SELECT * FROM sales",
        vec!["id".to_string(), "total".to_string()],
    );
    store.save_report(&report).await?;

    let loaded = store.get_report(report.id).await?;
    assert_eq!(loaded.columns, vec!["id", "total"]);
    assert_eq!(loaded.data_source_id, ds.id);
    assert_eq!(store.list_reports().await?.len(), 1);

    store.delete_report(report.id).await?;
    assert!(store.get_report(report.id).await.unwrap_err().is_not_found());
    assert!(store.get_report(Uuid::new_v4()).await.unwrap_err().is_not_found());

    Ok(())
}

#[tokio::test]
async fn test_report_job_lifecycle_persistence() -> Result<()> {
    let (store, _temp_file) = setup_test_store().await?;
    let ds = postgres_source("warehouse");
    store.save_data_source(&ds).await?;
    let report = Report::new("Sales", "", ds.id, "SELECT 1", vec![]);
    store.save_report(&report).await?;

    let mut older = ReportJob::new(report.id, OutputFormat::Csv);
    store.save_job(&older).await?;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let newer = ReportJob::new(report.id, OutputFormat::Json);
    store.save_job(&newer).await?;

    older.start()?;
    store.save_job(&older).await?;
    older.complete("/tmp/out.csv")?;
    store.save_job(&older).await?;

    let loaded = store.get_job(older.id).await?;
    assert_eq!(loaded.status, older.status);
    assert_eq!(loaded.file_path.as_deref(), Some("/tmp/out.csv"));
    assert!(loaded.started_at.is_some());
    assert!(loaded.completed_at.is_some());
    assert!(loaded.error.is_none());

    let jobs = store.list_jobs_for_report(report.id).await?;
    assert_eq!(
        jobs.iter().map(|j| j.id).collect::<Vec<_>>(),
        vec![newer.id, older.id]
    );
    assert!(store.list_jobs_for_report(Uuid::new_v4()).await?.is_empty());

    Ok(())
}

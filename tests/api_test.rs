//! API integration tests
//!
//! Exercises the REST surface end to end: data source and report CRUD, job
//! generation, status polling and file download.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::http::{header, StatusCode};
use axum_test::TestServer;
use reporthub::config::AppConfig;
use reporthub::errors::QueryResult;
use reporthub::models::{DataSource, Report, Row};
use reporthub::query::{EntitySchema, QueryExecutor, SampleQueryExecutor};
use reporthub::server::app::{create_app, AppState};
use reporthub::store::MemoryStore;
use serde_json::{json, Value};
use tempfile::TempDir;
use uuid::Uuid;

struct TestApp {
    server: TestServer,
    state: AppState,
    output: TempDir,
}

/// Sample rows, delivered only after a delay
struct SlowExecutor(Duration);

#[async_trait]
impl QueryExecutor for SlowExecutor {
    async fn execute(&self, _data_source: &DataSource, _report: &Report) -> QueryResult<Vec<Row>> {
        tokio::time::sleep(self.0).await;
        Ok(SampleQueryExecutor::rows())
    }

    async fn describe_schema(&self, data_source: &DataSource) -> QueryResult<Vec<EntitySchema>> {
        SampleQueryExecutor.describe_schema(data_source).await
    }
}

/// Create a test server with an in-memory store and the sample executor
async fn setup_test_server() -> Result<TestApp> {
    setup_test_server_with(Arc::new(SampleQueryExecutor)).await
}

async fn setup_test_server_with(executor: Arc<dyn QueryExecutor>) -> Result<TestApp> {
    let output = TempDir::new()?;
    let mut config = AppConfig::default();
    config.reports.output_dir = output.path().to_path_buf();

    let state = AppState::new(Arc::new(MemoryStore::new()), executor, &config);
    let app = create_app(state.clone(), None)?;
    let server = TestServer::new(app)?;

    Ok(TestApp {
        server,
        state,
        output,
    })
}

async fn create_data_source(server: &TestServer, name: &str) -> Value {
    let response = server
        .post("/api/v1/datasources")
        .json(&json!({
            "name": name,
            "type": "sqlite",
            "file_path": "/data/sales.db",
            "password": "secret"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json()
}

async fn create_report(server: &TestServer, data_source_id: &str, columns: Value) -> Value {
    let response = server
        .post("/api/v1/reports")
        .json(&json!({
            "name": "Sales",
            "description": "Monthly sales",
            "data_source_id": data_source_id,
            "query": "SELECT id, name, value, date FROM sales",
            "columns": columns
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json()
}

async fn generate(app: &TestApp, report_id: &str, format: &str) -> String {
    let response = app
        .server
        .post(&format!("/api/v1/reports/{}/generate", report_id))
        .json(&json!({ "format": format }))
        .await;
    assert_eq!(response.status_code(), StatusCode::ACCEPTED);

    let body: Value = response.json();
    assert_eq!(body["status"], "pending");
    body["job_id"].as_str().unwrap().to_string()
}

async fn wait_for_job(app: &TestApp, job_id: &str) {
    let job_id = Uuid::parse_str(job_id).unwrap();
    tokio::time::timeout(Duration::from_secs(5), app.state.runner().wait_for(job_id))
        .await
        .expect("job did not finish in time")
        .expect("job unknown to runner");
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let app = setup_test_server().await?;

    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["service"], "reporthub");
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_data_sources_crud_api() -> Result<()> {
    let app = setup_test_server().await?;

    let created = create_data_source(&app.server, "warehouse").await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["type"], "sqlite");
    assert!(created.get("password").is_none());

    // Duplicate name
    let response = app
        .server
        .post("/api/v1/datasources")
        .json(&json!({ "name": "warehouse", "type": "csv" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"], "CONFLICT");

    // Partial update
    let response = app
        .server
        .put(&format!("/api/v1/datasources/{}", id))
        .json(&json!({ "description": "primary" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["description"], "primary");
    assert_eq!(body["file_path"], "/data/sales.db");

    // List
    let response = app
        .server
        .get("/api/v1/datasources")
        .add_query_param("page", 1)
        .add_query_param("page_size", 500)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["page_size"], 100);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Soft delete
    let response = app.server.delete(&format!("/api/v1/datasources/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = app.server.get(&format!("/api/v1/datasources/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_data_source_schema_api() -> Result<()> {
    let app = setup_test_server().await?;
    let created = create_data_source(&app.server, "warehouse").await;
    let id = created["id"].as_str().unwrap();

    let response = app.server.get(&format!("/api/v1/datasources/{}/schema", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body[0]["name"], "sample");

    let response = app
        .server
        .get(&format!("/api/v1/datasources/{}/schema/sample", id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = app
        .server
        .get(&format!("/api/v1/datasources/{}/schema/orders", id))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_reports_crud_api() -> Result<()> {
    let app = setup_test_server().await?;
    let ds = create_data_source(&app.server, "warehouse").await;
    let ds_id = ds["id"].as_str().unwrap();

    // Unknown data source is a validation error
    let response = app
        .server
        .post("/api/v1/reports")
        .json(&json!({
            "name": "Orphan",
            "data_source_id": Uuid::new_v4(),
            "query": "SELECT 1"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let report = create_report(&app.server, ds_id, json!(["id", "name"])).await;
    let report_id = report["id"].as_str().unwrap();

    let response = app.server.get("/api/v1/reports").await;
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);

    let response = app
        .server
        .put(&format!("/api/v1/reports/{}", report_id))
        .json(&json!({ "name": "Sales v2" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["name"], "Sales v2");
    assert_eq!(body["columns"], json!(["id", "name"]));

    let response = app.server.delete(&format!("/api/v1/reports/{}", report_id)).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = app.server.get(&format!("/api/v1/reports/{}", report_id)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_generate_csv_and_download() -> Result<()> {
    let app = setup_test_server().await?;
    let ds = create_data_source(&app.server, "warehouse").await;
    let report = create_report(
        &app.server,
        ds["id"].as_str().unwrap(),
        json!(["id", "name", "value", "date"]),
    )
    .await;
    let report_id = report["id"].as_str().unwrap();

    let job_id = generate(&app, report_id, "csv").await;
    wait_for_job(&app, &job_id).await;

    let response = app
        .server
        .get(&format!("/api/v1/reports/{}/status", report_id))
        .add_query_param("job_id", &job_id)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let job: Value = response.json();
    assert_eq!(job["status"], "completed");
    assert!(job.get("error").is_none());

    let response = app
        .server
        .get(&format!("/api/v1/reports/{}/download", report_id))
        .add_query_param("job_id", &job_id)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        format!("attachment; filename=report_{}.csv", job_id).as_str()
    );
    assert_eq!(response.header(header::CONTENT_TYPE), "text/csv");

    let text = response.text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "id,name,value,date");

    Ok(())
}

#[tokio::test]
async fn test_generate_json() -> Result<()> {
    let app = setup_test_server().await?;
    let ds = create_data_source(&app.server, "warehouse").await;
    let report = create_report(&app.server, ds["id"].as_str().unwrap(), json!([])).await;
    let report_id = report["id"].as_str().unwrap();

    let job_id = generate(&app, report_id, "JSON").await;
    wait_for_job(&app, &job_id).await;

    let response = app
        .server
        .get(&format!("/api/v1/reports/{}/download", report_id))
        .add_query_param("job_id", &job_id)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "application/json");

    let rows: Value = response.json();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["name"], "Sample 1");
    assert_eq!(rows[2]["date"], "2023-01-03");

    Ok(())
}

#[tokio::test]
async fn test_generate_validation() -> Result<()> {
    let app = setup_test_server().await?;
    let ds = create_data_source(&app.server, "warehouse").await;
    let report = create_report(&app.server, ds["id"].as_str().unwrap(), json!([])).await;
    let report_id = report["id"].as_str().unwrap();

    let response = app
        .server
        .post(&format!("/api/v1/reports/{}/generate", Uuid::new_v4()))
        .json(&json!({ "format": "csv" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = app
        .server
        .post(&format!("/api/v1/reports/{}/generate", report_id))
        .json(&json!({ "format": "xlsx" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .server
        .post(&format!("/api/v1/reports/{}/generate", report_id))
        .json(&json!({}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_deleted_data_source_fails_job() -> Result<()> {
    let app = setup_test_server().await?;
    let ds = create_data_source(&app.server, "warehouse").await;
    let ds_id = ds["id"].as_str().unwrap();
    let report = create_report(&app.server, ds_id, json!(["id"])).await;
    let report_id = report["id"].as_str().unwrap();

    app.server.delete(&format!("/api/v1/datasources/{}", ds_id)).await;

    let job_id = generate(&app, report_id, "csv").await;
    wait_for_job(&app, &job_id).await;

    let response = app
        .server
        .get(&format!("/api/v1/reports/{}/status", report_id))
        .add_query_param("job_id", &job_id)
        .await;
    let job: Value = response.json();
    assert_eq!(job["status"], "failed");
    assert!(job["error"].as_str().unwrap().contains("data source"));
    assert!(job.get("file_path").is_none());

    // A failed job cannot be downloaded
    let response = app
        .server
        .get(&format!("/api/v1/reports/{}/download", report_id))
        .add_query_param("job_id", &job_id)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_generations_produce_distinct_files() -> Result<()> {
    let app = setup_test_server().await?;
    let ds = create_data_source(&app.server, "warehouse").await;
    let report = create_report(&app.server, ds["id"].as_str().unwrap(), json!(["id"])).await;
    let report_id = report["id"].as_str().unwrap();

    let first = generate(&app, report_id, "csv").await;
    let second = generate(&app, report_id, "csv").await;
    assert_ne!(first, second);

    wait_for_job(&app, &first).await;
    wait_for_job(&app, &second).await;

    let response = app
        .server
        .get(&format!("/api/v1/reports/{}/status", report_id))
        .await;
    let jobs: Value = response.json();
    let jobs = jobs.as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    assert_ne!(jobs[0]["file_path"], jobs[1]["file_path"]);
    assert!(jobs.iter().all(|j| j["status"] == "completed"));

    Ok(())
}

#[tokio::test]
async fn test_download_errors() -> Result<()> {
    let app = setup_test_server().await?;
    let ds = create_data_source(&app.server, "warehouse").await;
    let report = create_report(&app.server, ds["id"].as_str().unwrap(), json!(["id"])).await;
    let report_id = report["id"].as_str().unwrap();

    // Missing job_id
    let response = app
        .server
        .get(&format!("/api/v1/reports/{}/download", report_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // Unknown job
    let response = app
        .server
        .get(&format!("/api/v1/reports/{}/download", report_id))
        .add_query_param("job_id", Uuid::new_v4())
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    // Job of another report
    let other = create_report(&app.server, ds["id"].as_str().unwrap(), json!(["id"])).await;
    let job_id = generate(&app, report_id, "csv").await;
    wait_for_job(&app, &job_id).await;
    let response = app
        .server
        .get(&format!(
            "/api/v1/reports/{}/download",
            other["id"].as_str().unwrap()
        ))
        .add_query_param("job_id", &job_id)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_download_before_completion_is_rejected() -> Result<()> {
    let app = setup_test_server_with(Arc::new(SlowExecutor(Duration::from_millis(500)))).await?;
    let ds = create_data_source(&app.server, "warehouse").await;
    let report = create_report(&app.server, ds["id"].as_str().unwrap(), json!(["id"])).await;
    let report_id = report["id"].as_str().unwrap();

    let job_id = generate(&app, report_id, "csv").await;

    let response = app
        .server
        .get(&format!("/api/v1/reports/{}/status", report_id))
        .add_query_param("job_id", &job_id)
        .await;
    let job: Value = response.json();
    assert!(job["status"] == "pending" || job["status"] == "running");

    let response = app
        .server
        .get(&format!("/api/v1/reports/{}/download", report_id))
        .add_query_param("job_id", &job_id)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "NOT_READY");

    // Nothing has been written yet, not even a partial file
    let mut entries = tokio::fs::read_dir(app.output.path()).await?;
    assert!(entries.next_entry().await?.is_none());

    // Once the job completes the same request succeeds
    wait_for_job(&app, &job_id).await;
    let response = app
        .server
        .get(&format!("/api/v1/reports/{}/download", report_id))
        .add_query_param("job_id", &job_id)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    Ok(())
}

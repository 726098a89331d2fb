use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use reporthub::config::{AppConfig, ExecutorKind, StorageBackend};
use reporthub::export::FileSerializer;
use reporthub::models::{DataSource, DataSourceType, JobStatus, OutputFormat, Report, ReportJob};
use reporthub::query::SampleQueryExecutor;
use reporthub::server;
use reporthub::services::{JobRunner, ReportGenerator};
use reporthub::store::{EntityStore, MemoryStore};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    /// TOML configuration file
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Serve {
        #[clap(short, long)]
        port: Option<u16>,
        /// Entity store backend: memory or sqlite
        #[clap(long)]
        storage: Option<String>,
        #[clap(short, long)]
        database: Option<String>,
        #[clap(long)]
        cors_origin: Option<String>,
        #[clap(long, env = "OUTPUT_DIR")]
        output_dir: Option<PathBuf>,
        /// Query executor: connector or sample
        #[clap(long)]
        executor: Option<String>,
    },
    Db {
        #[clap(subcommand)]
        command: DbCommands,
    },
    /// Run one report job against sample data and print the result
    Demo {
        #[clap(short, long, default_value = "csv")]
        format: String,
        #[clap(long, env = "OUTPUT_DIR")]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    Init {
        #[clap(short, long, default_value = "reporthub.db")]
        database: String,
    },
    Migrate {
        #[clap(subcommand)]
        direction: server::MigrateDirection,
        #[clap(short, long, default_value = "reporthub.db")]
        database: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match args.command {
        Commands::Serve {
            port,
            storage,
            database,
            cors_origin,
            output_dir,
            executor,
        } => {
            let mut config = AppConfig::load_or_default(args.config.as_deref())?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(storage) = storage {
                config.storage.backend = parse_storage(&storage)?;
            }
            if let Some(database) = database {
                config.storage.database_path = database;
            }
            if cors_origin.is_some() {
                config.server.cors_origin = cors_origin;
            }
            if let Some(output_dir) = output_dir {
                config.reports.output_dir = output_dir;
            }
            if let Some(executor) = executor {
                config.query.executor = parse_executor(&executor)?;
            }

            info!("Starting server on port {}", config.server.port);
            server::start_server(config).await?;
        }
        Commands::Db { command } => match command {
            DbCommands::Init { database } => {
                info!("Initializing database: {}", database);
                server::init_database(&database).await?;
            }
            DbCommands::Migrate {
                direction,
                database,
            } => {
                info!("Running database migration: {:?}", direction);
                server::migrate_database(&database, direction).await?;
            }
        },
        Commands::Demo { format, output_dir } => {
            let mut config = AppConfig::load_or_default(args.config.as_deref())?;
            if let Some(output_dir) = output_dir {
                config.reports.output_dir = output_dir;
            }
            run_demo(config, format.parse::<OutputFormat>().map_err(anyhow::Error::msg)?).await?;
        }
    }

    Ok(())
}

fn parse_storage(value: &str) -> Result<StorageBackend> {
    match value.to_lowercase().as_str() {
        "memory" => Ok(StorageBackend::Memory),
        "sqlite" => Ok(StorageBackend::Sqlite),
        other => bail!("unknown storage backend: {}", other),
    }
}

fn parse_executor(value: &str) -> Result<ExecutorKind> {
    match value.to_lowercase().as_str() {
        "connector" => Ok(ExecutorKind::Connector),
        "sample" => Ok(ExecutorKind::Sample),
        other => bail!("unknown query executor: {}", other),
    }
}

async fn run_demo(mut config: AppConfig, format: OutputFormat) -> Result<()> {
    let output_dir = config.prepare_output_dir()?.to_path_buf();
    let store = Arc::new(MemoryStore::new());

    let data_source = DataSource::new("Demo Database", DataSourceType::Sqlite)
        .with_file_path("demo.db");
    store.save_data_source(&data_source).await?;

    let report = Report::new(
        "Sales Report",
        "Monthly sales figures",
        data_source.id,
        "SELECT id, name, value, date FROM sales",
        vec!["id".into(), "name".into(), "value".into(), "date".into()],
    );
    store.save_report(&report).await?;

    let generator = ReportGenerator::new(
        store.clone(),
        Arc::new(SampleQueryExecutor),
        FileSerializer::new(&output_dir),
        Duration::from_secs(config.jobs.query_timeout_secs),
    );
    let runner = JobRunner::new(generator, 1, 1);

    let job = ReportJob::new(report.id, format);
    store.save_job(&job).await?;
    info!("Generating {} report {} (job {})", format, report.name, job.id);

    let handle = runner.submit(job).await?;
    let Some(job) = handle.wait().await else {
        bail!("report job did not finish");
    };
    runner.shutdown(Duration::from_secs(1)).await;

    match job.status {
        JobStatus::Completed => {
            let path = job.file_path.unwrap_or_default();
            println!("Report generated: {}", path);
            println!("{}", tokio::fs::read_to_string(&path).await?);
        }
        _ => {
            println!(
                "Report generation failed: {}",
                job.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
    }
    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "sqlx=warn,sea_orm_migration=warn,{}",
            log_level
        )))
        .init();
}

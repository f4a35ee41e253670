use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use omnicast_ingest::{
    config::Config,
    database::Database,
    ingestor::{scheduler::SchedulerService, IngestionRunner},
    jobs::QuarantineReprocessor,
    registry::Registry,
};

#[derive(Parser)]
#[command(name = "omnicast-ingest")]
#[command(version = "0.1.0")]
#[command(about = "Content ingestion and curation pipeline for streaming catalogs")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("omnicast_ingest={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Omnicast Ingest v{}", env!("CARGO_PKG_VERSION"));

    std::env::set_var("CONFIG_FILE", &cli.config);
    let mut config = Config::load()?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }

    info!("Using database: {}", config.database.url);

    let database = Database::new(&config.database).await?;
    database.migrate().await?;
    info!("Database connection established and migrations applied");

    let registry = Arc::new(Registry::bootstrap(&config));

    let runner = Arc::new(IngestionRunner::new(
        database.clone(),
        registry.clone(),
        &config,
    ));
    let reprocessor = Arc::new(QuarantineReprocessor::new(database, registry, &config));

    let scheduler = SchedulerService::new(runner, reprocessor, config);
    tokio::spawn(async move {
        if let Err(e) = scheduler.start().await {
            tracing::error!("Scheduler service failed: {}", e);
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}

//! Entry points shared by the operator binaries.
//!
//! Every job builds its settings once, logs whatever goes wrong and returns
//! normally, so the process always exits with status 0.

use chrono::Utc;
use secrecy::SecretString;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::db::postgres::postgres_service::PostgresService;
use crate::env_config::build_env::mask_database_url;
use crate::env_config::error::ConfigError;
use crate::env_config::models::{
    app_config::{AppConfig, PriceSourceConfig, SyncDirection},
    app_env::AppEnv,
    app_setting::AppSettings,
};
use crate::logger;
use crate::services::ingest::collector::Collector;
use crate::services::ingest::dataset::Dataset;
use crate::services::ingest::error::PipelineError;
use crate::services::ingest::fetcher::fred::FredSource;
use crate::services::ingest::fetcher::http::ApiClient;
use crate::services::ingest::fetcher::tiingo::{TiingoEndpoint, TiingoSource};
use crate::services::ingest::planner::StartPolicy;
use crate::services::ingest::writer::UpsertWriter;
use crate::services::loaders::metadata::{catalog_metadata, load_metadata_file};
use crate::services::loaders::series_files::{
    load_directory, macro_series_symbol, market_price_symbol,
};
use crate::services::status::reporter::StatusReporter;
use crate::services::sync::replicator::{Replicator, SyncEndpoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    CollectEtf,
    CollectForex,
    CollectFred,
    LoadMarketPrices,
    LoadMacroSeries,
    LoadMetadata,
    CheckDbStatus,
    SyncDb,
}

impl Job {
    pub fn name(self) -> &'static str {
        match self {
            Job::CollectEtf => "collect-etf",
            Job::CollectForex => "collect-forex",
            Job::CollectFred => "collect-fred",
            Job::LoadMarketPrices => "load-market-prices",
            Job::LoadMacroSeries => "load-macro-series",
            Job::LoadMetadata => "load-metadata",
            Job::CheckDbStatus => "check-db-status",
            Job::SyncDb => "sync-db",
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Loads environment and config, then installs the logger.
pub fn initialize_application(app_name: &str) -> Result<AppSettings, PipelineError> {
    let environment = AppEnv::new()?;
    let config = AppConfig::new(&environment.config_dir, environment.env)?;
    let app_settings = AppSettings {
        app_config: config,
        app_env: environment,
    };

    logger::init_logger(
        &app_settings.app_config.log.level,
        &app_settings.app_config.log.format,
        app_settings.app_env.is_local(),
    )?;

    info!("Starting {}...", app_name);
    info!("Current environment: {}", app_settings.app_env.env);
    match &app_settings.app_config.source_path {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => info!("No configuration file found, using built-in defaults"),
    }

    if app_settings.app_env.is_local() {
        debug!("Configuration details: {:#?}", app_settings);
    }

    Ok(app_settings)
}

/// Runs one job to completion. Never panics and never propagates errors.
pub async fn run_job(job: Job) {
    let settings = match initialize_application(job.name()) {
        Ok(settings) => settings,
        Err(e) => {
            // The configured logger may not exist yet.
            let _ = logger::init_logger("info", "plain", true);
            error!(job = job.name(), "Failed to initialize: {}", e);
            return;
        }
    };

    if let Err(e) = execute(job, &settings).await {
        error!(job = job.name(), "Job aborted: {}", e);
    }
}

async fn execute(job: Job, settings: &AppSettings) -> Result<(), PipelineError> {
    let config = &settings.app_config;

    match job {
        Job::CollectEtf => {
            collect_prices(job, settings, &config.tiingo_etf, TiingoEndpoint::Daily).await
        }
        Job::CollectForex => {
            collect_prices(job, settings, &config.tiingo_fx, TiingoEndpoint::Fx).await
        }
        Job::CollectFred => collect_fred(job, settings).await,
        Job::LoadMarketPrices => {
            let postgres = PostgresService::new(settings).await?;
            let summary = load_directory(
                job.name(),
                &config.loaders.market_price_dir,
                &Dataset::MarketPrice {
                    basis: config.tiingo_etf.price_basis,
                },
                market_price_symbol,
                &writer(&postgres),
            )
            .await?;
            summary.log_summary();
            Ok(())
        }
        Job::LoadMacroSeries => {
            let postgres = PostgresService::new(settings).await?;
            let summary = load_directory(
                job.name(),
                &config.loaders.macro_series_dir,
                &Dataset::MacroSeries { country: None },
                macro_series_symbol,
                &writer(&postgres),
            )
            .await?;
            summary.log_summary();
            Ok(())
        }
        Job::LoadMetadata => {
            let postgres = PostgresService::new(settings).await?;
            let written = load_metadata_file(
                &config.loaders.metadata_file,
                &config.loaders.metadata_dir,
                postgres.repository_indicator_metadata.as_ref(),
            )
            .await?;
            info!(job = job.name(), written, "Indicator metadata saved");
            Ok(())
        }
        Job::CheckDbStatus => {
            let postgres = PostgresService::new(settings).await?;
            let summary = StatusReporter::new(postgres.repository_status.clone())
                .report()
                .await?;
            info!("Database status\n{}", summary);
            Ok(())
        }
        Job::SyncDb => sync_databases(job, settings).await,
    }
}

async fn collect_prices(
    job: Job,
    settings: &AppSettings,
    source_config: &PriceSourceConfig,
    endpoint: TiingoEndpoint,
) -> Result<(), PipelineError> {
    let token = SecretString::from(settings.app_env.require_tiingo_key()?);
    let postgres = PostgresService::new(settings).await?;
    let client = Arc::new(ApiClient::new(&settings.app_config.fetch)?);

    let collector = Collector::new(
        job.name(),
        Arc::new(TiingoSource::new(client, &source_config.base_url, token, endpoint)),
        Dataset::MarketPrice {
            basis: source_config.price_basis,
        },
        writer(&postgres),
        StartPolicy::from_config(source_config.lookback_days, source_config.history_start),
        request_delay(settings),
    );

    let summary = collector
        .run(&source_config.symbols, Utc::now().date_naive())
        .await;
    summary.log_summary();
    Ok(())
}

async fn collect_fred(job: Job, settings: &AppSettings) -> Result<(), PipelineError> {
    let fred = &settings.app_config.fred;
    let api_key = SecretString::from(settings.app_env.require_fred_key()?);
    let postgres = PostgresService::new(settings).await?;
    let client = Arc::new(ApiClient::new(&settings.app_config.fetch)?);

    // Labels are a convenience for dashboards; the series load regardless.
    if let Err(e) = postgres
        .repository_indicator_metadata
        .upsert_many(&catalog_metadata(&fred.indicators, &fred.country))
        .await
    {
        warn!(job = job.name(), "Failed to save FRED catalog metadata: {}", e);
    }

    let symbols: Vec<String> = fred.indicators.iter().map(|entry| entry.id.clone()).collect();
    let collector = Collector::new(
        job.name(),
        Arc::new(FredSource::new(client, &fred.base_url, api_key)),
        Dataset::MacroSeries {
            country: Some(fred.country.clone()),
        },
        writer(&postgres),
        StartPolicy::from_config(fred.lookback_days, fred.history_start),
        request_delay(settings),
    );

    let summary = collector.run(&symbols, Utc::now().date_naive()).await;
    summary.log_summary();
    Ok(())
}

async fn sync_databases(job: Job, settings: &AppSettings) -> Result<(), PipelineError> {
    let sync = &settings.app_config.sync;
    let cloud = settings.app_env.require_cloud_database_url()?;
    let local = settings.app_env.local_database_url.as_str();
    let (source_url, destination_url) = match sync.direction {
        SyncDirection::CloudToLocal => (cloud, local),
        SyncDirection::LocalToCloud => (local, cloud),
    };
    if source_url == destination_url {
        return Err(ConfigError::SameSyncDatabase.into());
    }

    info!(
        job = job.name(),
        direction = ?sync.direction,
        source = %mask_database_url(source_url),
        destination = %mask_database_url(destination_url),
        "Syncing databases"
    );

    // The source is only read; its schema stays as found.
    let source = PostgresService::connect(source_url, &settings.app_config.postgres, false).await?;
    let destination =
        PostgresService::connect(destination_url, &settings.app_config.postgres, true).await?;

    let summary = Replicator::new(
        job.name(),
        SyncEndpoint::from(&source),
        SyncEndpoint::from(&destination),
        sync.chunk_size,
    )
    .run(&sync.tables)
    .await;
    summary.log_summary();
    Ok(())
}

fn writer(postgres: &PostgresService) -> UpsertWriter {
    UpsertWriter::new(
        postgres.repository_market_price.clone(),
        postgres.repository_macro_series.clone(),
    )
}

fn request_delay(settings: &AppSettings) -> Duration {
    Duration::from_millis(settings.app_config.fetch.request_delay_ms)
}

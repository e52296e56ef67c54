use crate::db::postgres::{
    connection::PostgresConnection,
    migrations,
    repository::{
        indicator_metadata_repository::{
            StructIndicatorMetadataRepository, TraitIndicatorMetadataRepository,
        },
        macro_series_repository::{StructMacroSeriesRepository, TraitMacroSeriesRepository},
        market_price_repository::{StructMarketPriceRepository, TraitMarketPriceRepository},
        status_repository::{StructStatusRepository, TraitStatusRepository},
    },
};
use crate::env_config::models::app_config::PostgresConfig;
use crate::env_config::models::app_setting::AppSettings;
use std::sync::Arc;
use tracing::{error, info};

pub struct PostgresService {
    pub connection: Arc<PostgresConnection>,

    pub repository_market_price: Arc<dyn TraitMarketPriceRepository + Send + Sync>,
    pub repository_macro_series: Arc<dyn TraitMacroSeriesRepository + Send + Sync>,
    pub repository_indicator_metadata: Arc<dyn TraitIndicatorMetadataRepository + Send + Sync>,
    pub repository_status: Arc<dyn TraitStatusRepository + Send + Sync>,
}

impl PostgresService {
    /// Connects, brings the schema up to date and wires the repositories.
    pub async fn new(settings: &AppSettings) -> Result<Self, sqlx::Error> {
        Self::connect(
            &settings.app_env.database_url,
            &settings.app_config.postgres,
            true,
        )
        .await
    }

    /// Connects to `url`. With `apply_migrations` unset the schema is left
    /// exactly as found, for databases that are only read from.
    pub async fn connect(
        url: &str,
        postgres: &PostgresConfig,
        apply_migrations: bool,
    ) -> Result<Self, sqlx::Error> {
        info!("Initializing PostgreSQL service components");

        let postgres_connection = match PostgresConnection::connect(url, postgres).await {
            Ok(conn) => Arc::new(conn),
            Err(e) => {
                error!("Failed to establish PostgreSQL connection: {}", e);
                return Err(e);
            }
        };

        if apply_migrations {
            migrations::run_migrations(postgres_connection.get_pool()).await?;
        }

        let service = Self::from_connection(postgres_connection);
        info!("PostgreSQL service initialized successfully");
        Ok(service)
    }

    pub fn from_connection(postgres_connection: Arc<PostgresConnection>) -> Self {
        let repository_market_price = Arc::new(StructMarketPriceRepository::new(
            postgres_connection.clone(),
        )) as Arc<dyn TraitMarketPriceRepository + Send + Sync>;

        let repository_macro_series = Arc::new(StructMacroSeriesRepository::new(
            postgres_connection.clone(),
        )) as Arc<dyn TraitMacroSeriesRepository + Send + Sync>;

        let repository_indicator_metadata = Arc::new(StructIndicatorMetadataRepository::new(
            postgres_connection.clone(),
        )) as Arc<dyn TraitIndicatorMetadataRepository + Send + Sync>;

        let repository_status = Arc::new(StructStatusRepository::new(postgres_connection.clone()))
            as Arc<dyn TraitStatusRepository + Send + Sync>;

        Self {
            connection: postgres_connection,
            repository_market_price,
            repository_macro_series,
            repository_indicator_metadata,
            repository_status,
        }
    }
}

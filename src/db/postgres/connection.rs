use crate::env_config::build_env::mask_database_url;
use crate::env_config::models::app_config::PostgresConfig;
use crate::env_config::models::app_setting::AppSettings;
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};
use std::time::Duration;
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct PostgresConnection {
    pool: Pool<Postgres>,
}

impl PostgresConnection {
    pub async fn new(settings: &AppSettings) -> Result<Self, sqlx::Error> {
        Self::connect(&settings.app_env.database_url, &settings.app_config.postgres).await
    }

    /// Opens a pool against an explicit URL with the configured limits.
    pub async fn connect(url: &str, postgres: &PostgresConfig) -> Result<Self, sqlx::Error> {
        info!(url = %mask_database_url(url), "Initializing PostgreSQL connection");

        let pool = PgPoolOptions::new()
            .max_connections(postgres.max_connections)
            .min_connections(postgres.min_connections)
            .max_lifetime(Duration::from_secs(postgres.max_lifetime))
            .idle_timeout(Duration::from_secs(postgres.idle_timeout))
            .acquire_timeout(Duration::from_secs(postgres.timeout))
            .connect(url)
            .await?;

        debug!("Executing test query on PostgreSQL");
        match sqlx::query("SELECT 1").execute(&pool).await {
            Ok(_) => info!("PostgreSQL connection successful"),
            Err(e) => {
                error!("Failed to connect to PostgreSQL: {}", e);
                return Err(e);
            }
        }

        Ok(Self { pool })
    }

    /// Pool that connects on first use; lets handlers be exercised without a server.
    #[cfg(test)]
    pub(crate) fn lazy(url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new().max_connections(1).connect_lazy(url)?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub(crate) fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn get_pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

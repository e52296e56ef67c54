use crate::db::postgres::connection::PostgresConnection;
use crate::db::postgres::models::status::{MacroTableSummary, NullCoverage, PriceTableSummary};
use async_trait::async_trait;
use sqlx::Error as SqlxError;
use std::sync::Arc;
use tracing::debug;

/// Read-only aggregate queries over the canonical tables.
///
/// Summaries come back as `None` when the underlying table does not exist.
#[async_trait]
pub trait TraitStatusRepository {
    async fn ping(&self) -> Result<bool, SqlxError>;
    /// Resolves `table` through the connection's search path.
    async fn table_exists(&self, table: &str) -> Result<bool, SqlxError>;
    async fn price_summary(&self) -> Result<Option<PriceTableSummary>, SqlxError>;
    async fn price_null_coverage(&self) -> Result<Vec<NullCoverage>, SqlxError>;
    async fn macro_summary(&self) -> Result<Option<MacroTableSummary>, SqlxError>;
    async fn metadata_count(&self) -> Result<Option<i64>, SqlxError>;
}

pub struct StructStatusRepository {
    connection: Arc<PostgresConnection>,
}

impl StructStatusRepository {
    pub fn new(connection: Arc<PostgresConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl TraitStatusRepository for StructStatusRepository {
    async fn ping(&self) -> Result<bool, SqlxError> {
        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.connection.get_pool())
            .await?;
        Ok(result == 1)
    }

    async fn table_exists(&self, table: &str) -> Result<bool, SqlxError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT to_regclass($1::text) IS NOT NULL")
            .bind(table)
            .fetch_one(self.connection.get_pool())
            .await?;
        debug!(table, exists, "Checked table presence");
        Ok(exists)
    }

    async fn price_summary(&self) -> Result<Option<PriceTableSummary>, SqlxError> {
        if !self.table_exists("market_price_daily").await? {
            return Ok(None);
        }

        sqlx::query_as::<_, PriceTableSummary>(
            "SELECT COUNT(*) AS total_rows,
                    MIN(trade_date)::date AS first_date,
                    MAX(trade_date)::date AS last_date,
                    COUNT(DISTINCT symbol) AS symbol_count
             FROM market_price_daily",
        )
        .fetch_one(self.connection.get_pool())
        .await
        .map(Some)
    }

    async fn price_null_coverage(&self) -> Result<Vec<NullCoverage>, SqlxError> {
        if !self.table_exists("market_price_daily").await? {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, NullCoverage>(
            "WITH tracked AS (
                SELECT symbol, bool_or(volume IS NOT NULL) AS volume_tracked
                FROM market_price_daily
                GROUP BY symbol
             )
             SELECT p.symbol::text AS symbol,
                    COUNT(*) AS total_rows,
                    COUNT(*) FILTER (
                        WHERE p.open_price IS NULL
                           OR p.high_price IS NULL
                           OR p.low_price IS NULL
                           OR p.close_price IS NULL
                           OR (t.volume_tracked AND p.volume IS NULL)
                    ) AS incomplete_rows,
                    COUNT(*) FILTER (WHERE p.volume IS NULL) AS missing_volume_rows,
                    t.volume_tracked
             FROM market_price_daily p
             JOIN tracked t ON t.symbol = p.symbol
             GROUP BY p.symbol, t.volume_tracked
             ORDER BY p.symbol",
        )
        .fetch_all(self.connection.get_pool())
        .await
    }

    async fn macro_summary(&self) -> Result<Option<MacroTableSummary>, SqlxError> {
        if !self.table_exists("macro_time_series").await? {
            return Ok(None);
        }

        sqlx::query_as::<_, MacroTableSummary>(
            "SELECT COUNT(*) AS total_rows,
                    MIN(date_time)::date AS first_date,
                    MAX(date_time)::date AS last_date,
                    COUNT(DISTINCT indicator_symbol) AS indicator_count
             FROM macro_time_series",
        )
        .fetch_one(self.connection.get_pool())
        .await
        .map(Some)
    }

    async fn metadata_count(&self) -> Result<Option<i64>, SqlxError> {
        if !self.table_exists("indicator_metadata").await? {
            return Ok(None);
        }

        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM indicator_metadata")
            .fetch_one(self.connection.get_pool())
            .await
            .map(Some)
    }
}

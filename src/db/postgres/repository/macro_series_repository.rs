use crate::db::postgres::connection::PostgresConnection;
use crate::db::postgres::models::macro_series::MacroPoint;
use crate::db::postgres::repository::STAGE_CHUNK_SIZE;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Error as SqlxError;
use std::sync::Arc;
use tracing::{debug, error};

#[async_trait]
pub trait TraitMacroSeriesRepository {
    async fn get_last_date(&self, indicator_symbol: &str) -> Result<Option<NaiveDate>, SqlxError>;

    /// Merges a batch into `macro_time_series` keyed on (indicator_symbol, date_time).
    async fn upsert_batch(&self, points: &[MacroPoint]) -> Result<u64, SqlxError>;

    /// Up to `limit` observations ordered by (indicator_symbol, date_time),
    /// strictly after `after`.
    async fn fetch_page(
        &self,
        after: Option<(String, NaiveDate)>,
        limit: i64,
    ) -> Result<Vec<MacroPoint>, SqlxError>;
}

pub struct StructMacroSeriesRepository {
    connection: Arc<PostgresConnection>,
}

impl StructMacroSeriesRepository {
    pub fn new(connection: Arc<PostgresConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl TraitMacroSeriesRepository for StructMacroSeriesRepository {
    async fn get_last_date(&self, indicator_symbol: &str) -> Result<Option<NaiveDate>, SqlxError> {
        let pool = self.connection.get_pool();

        let result = sqlx::query_scalar::<_, Option<NaiveDate>>(
            "SELECT MAX(date_time)::date FROM macro_time_series WHERE indicator_symbol = $1",
        )
        .bind(indicator_symbol)
        .fetch_one(pool)
        .await;

        if let Err(e) = &result {
            error!(indicator_symbol, "Error fetching indicator cursor: {}", e);
        }

        result
    }

    async fn upsert_batch(&self, points: &[MacroPoint]) -> Result<u64, SqlxError> {
        if points.is_empty() {
            return Ok(0);
        }

        let pool = self.connection.get_pool();
        let mut tx = pool.begin().await?;

        sqlx::query(
            "CREATE TEMP TABLE stage_macro_series (
                date_time DATE NOT NULL,
                indicator_symbol TEXT NOT NULL,
                value DOUBLE PRECISION,
                country TEXT
            ) ON COMMIT DROP",
        )
        .execute(&mut *tx)
        .await?;

        for chunk in points.chunks(STAGE_CHUNK_SIZE) {
            let dates: Vec<NaiveDate> = chunk.iter().map(|p| p.date_time).collect();
            let symbols: Vec<&str> = chunk.iter().map(|p| p.indicator_symbol.as_str()).collect();
            let values: Vec<f64> = chunk.iter().map(|p| p.value).collect();
            let countries: Vec<&str> = chunk.iter().map(|p| p.country.as_str()).collect();

            sqlx::query(
                "INSERT INTO stage_macro_series (date_time, indicator_symbol, value, country)
                 SELECT * FROM UNNEST($1::date[], $2::text[], $3::float8[], $4::text[])",
            )
            .bind(&dates)
            .bind(&symbols)
            .bind(&values)
            .bind(&countries)
            .execute(&mut *tx)
            .await?;
        }

        let merged = sqlx::query(
            "INSERT INTO macro_time_series (date_time, indicator_symbol, value, country)
             SELECT DISTINCT ON (indicator_symbol, date_time)
                date_time, indicator_symbol, value, country
             FROM stage_macro_series
             ORDER BY indicator_symbol, date_time
             ON CONFLICT (indicator_symbol, date_time) DO UPDATE SET
                value = EXCLUDED.value,
                country = EXCLUDED.country",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            rows = points.len(),
            affected = merged.rows_affected(),
            "Upserted macro series batch"
        );

        Ok(merged.rows_affected())
    }

    async fn fetch_page(
        &self,
        after: Option<(String, NaiveDate)>,
        limit: i64,
    ) -> Result<Vec<MacroPoint>, SqlxError> {
        let (after_symbol, after_date) = after.unzip();

        sqlx::query_as::<_, MacroPoint>(
            "SELECT date_time::date AS date_time,
                    indicator_symbol::text AS indicator_symbol,
                    value::float8 AS value,
                    COALESCE(country::text, '') AS country
             FROM macro_time_series
             WHERE indicator_symbol IS NOT NULL
               AND date_time IS NOT NULL
               AND value IS NOT NULL
               AND ($1::text IS NULL
                    OR (indicator_symbol::text, date_time::date) > ($1::text, $2::date))
             ORDER BY indicator_symbol::text, date_time::date
             LIMIT $3",
        )
        .bind(after_symbol)
        .bind(after_date)
        .bind(limit)
        .fetch_all(self.connection.get_pool())
        .await
    }
}

use crate::db::postgres::connection::PostgresConnection;
use crate::db::postgres::models::market_price::MarketPricePoint;
use crate::db::postgres::repository::STAGE_CHUNK_SIZE;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Error as SqlxError;
use std::sync::Arc;
use tracing::{debug, error};

#[async_trait]
pub trait TraitMarketPriceRepository {
    /// Latest persisted trade date for a symbol, if any.
    async fn get_last_trade_date(&self, symbol: &str) -> Result<Option<NaiveDate>, SqlxError>;

    /// Merges a batch into `market_price_daily` keyed on (symbol, trade_date).
    /// The batch commits as a whole or not at all.
    async fn upsert_batch(&self, points: &[MarketPricePoint]) -> Result<u64, SqlxError>;

    /// Up to `limit` rows ordered by (symbol, trade_date), strictly after `after`.
    async fn fetch_page(
        &self,
        after: Option<(String, NaiveDate)>,
        limit: i64,
    ) -> Result<Vec<MarketPricePoint>, SqlxError>;
}

pub struct StructMarketPriceRepository {
    connection: Arc<PostgresConnection>,
}

impl StructMarketPriceRepository {
    pub fn new(connection: Arc<PostgresConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl TraitMarketPriceRepository for StructMarketPriceRepository {
    async fn get_last_trade_date(&self, symbol: &str) -> Result<Option<NaiveDate>, SqlxError> {
        let pool = self.connection.get_pool();

        let result = sqlx::query_scalar::<_, Option<NaiveDate>>(
            "SELECT MAX(trade_date)::date FROM market_price_daily WHERE symbol = $1",
        )
        .bind(symbol)
        .fetch_one(pool)
        .await;

        match &result {
            Ok(last) => debug!(symbol, last_trade_date = ?last, "Fetched price cursor"),
            Err(e) => error!(symbol, "Error fetching price cursor: {}", e),
        }

        result
    }

    async fn upsert_batch(&self, points: &[MarketPricePoint]) -> Result<u64, SqlxError> {
        if points.is_empty() {
            return Ok(0);
        }

        let pool = self.connection.get_pool();
        let mut tx = pool.begin().await?;

        sqlx::query(
            "CREATE TEMP TABLE stage_market_price (
                trade_date DATE NOT NULL,
                symbol TEXT NOT NULL,
                open_price DOUBLE PRECISION,
                high_price DOUBLE PRECISION,
                low_price DOUBLE PRECISION,
                close_price DOUBLE PRECISION,
                volume BIGINT
            ) ON COMMIT DROP",
        )
        .execute(&mut *tx)
        .await?;

        for chunk in points.chunks(STAGE_CHUNK_SIZE) {
            let trade_dates: Vec<NaiveDate> = chunk.iter().map(|p| p.trade_date).collect();
            let symbols: Vec<&str> = chunk.iter().map(|p| p.symbol.as_str()).collect();
            let opens: Vec<Option<f64>> = chunk.iter().map(|p| p.open_price).collect();
            let highs: Vec<Option<f64>> = chunk.iter().map(|p| p.high_price).collect();
            let lows: Vec<Option<f64>> = chunk.iter().map(|p| p.low_price).collect();
            let closes: Vec<Option<f64>> = chunk.iter().map(|p| p.close_price).collect();
            let volumes: Vec<Option<i64>> = chunk.iter().map(|p| p.volume).collect();

            sqlx::query(
                "INSERT INTO stage_market_price
                    (trade_date, symbol, open_price, high_price, low_price, close_price, volume)
                 SELECT * FROM UNNEST(
                    $1::date[], $2::text[],
                    $3::float8[], $4::float8[], $5::float8[], $6::float8[],
                    $7::int8[]
                 )",
            )
            .bind(&trade_dates)
            .bind(&symbols)
            .bind(&opens)
            .bind(&highs)
            .bind(&lows)
            .bind(&closes)
            .bind(&volumes)
            .execute(&mut *tx)
            .await?;
        }

        let merged = sqlx::query(
            "INSERT INTO market_price_daily
                (trade_date, symbol, open_price, high_price, low_price, close_price, volume)
             SELECT DISTINCT ON (symbol, trade_date)
                trade_date, symbol, open_price, high_price, low_price, close_price, volume
             FROM stage_market_price
             ORDER BY symbol, trade_date
             ON CONFLICT (symbol, trade_date) DO UPDATE SET
                open_price = EXCLUDED.open_price,
                high_price = EXCLUDED.high_price,
                low_price = EXCLUDED.low_price,
                close_price = EXCLUDED.close_price,
                volume = EXCLUDED.volume",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            rows = points.len(),
            affected = merged.rows_affected(),
            "Upserted market price batch"
        );

        Ok(merged.rows_affected())
    }

    async fn fetch_page(
        &self,
        after: Option<(String, NaiveDate)>,
        limit: i64,
    ) -> Result<Vec<MarketPricePoint>, SqlxError> {
        let (after_symbol, after_date) = after.unzip();

        // Casts accept tables written by earlier tooling (timestamps, float volumes).
        sqlx::query_as::<_, MarketPricePoint>(
            "SELECT trade_date::date AS trade_date,
                    symbol::text AS symbol,
                    open_price::float8 AS open_price,
                    high_price::float8 AS high_price,
                    low_price::float8 AS low_price,
                    close_price::float8 AS close_price,
                    volume::int8 AS volume
             FROM market_price_daily
             WHERE symbol IS NOT NULL
               AND trade_date IS NOT NULL
               AND ($1::text IS NULL OR (symbol::text, trade_date::date) > ($1::text, $2::date))
             ORDER BY symbol::text, trade_date::date
             LIMIT $3",
        )
        .bind(after_symbol)
        .bind(after_date)
        .bind(limit)
        .fetch_all(self.connection.get_pool())
        .await
    }
}

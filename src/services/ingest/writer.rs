use chrono::NaiveDate;
use std::sync::Arc;
use tracing::error;

use super::dataset::Batch;
use super::normalizer::dedupe_keep_last;
use crate::db::postgres::models::macro_series::MacroPoint;
use crate::db::postgres::models::market_price::MarketPricePoint;
use crate::db::postgres::repository::macro_series_repository::TraitMacroSeriesRepository;
use crate::db::postgres::repository::market_price_repository::TraitMarketPriceRepository;

/// Front door to the canonical series tables: cursor lookups and
/// idempotent batch merges.
#[derive(Clone)]
pub struct UpsertWriter {
    market_price: Arc<dyn TraitMarketPriceRepository + Send + Sync>,
    macro_series: Arc<dyn TraitMacroSeriesRepository + Send + Sync>,
}

impl UpsertWriter {
    pub fn new(
        market_price: Arc<dyn TraitMarketPriceRepository + Send + Sync>,
        macro_series: Arc<dyn TraitMacroSeriesRepository + Send + Sync>,
    ) -> Self {
        Self {
            market_price,
            macro_series,
        }
    }

    pub async fn last_trade_date(&self, symbol: &str) -> Result<Option<NaiveDate>, sqlx::Error> {
        self.market_price.get_last_trade_date(symbol).await
    }

    pub async fn last_observation_date(
        &self,
        indicator_symbol: &str,
    ) -> Result<Option<NaiveDate>, sqlx::Error> {
        self.macro_series.get_last_date(indicator_symbol).await
    }

    pub async fn write(&self, batch: Batch) -> Result<u64, sqlx::Error> {
        match batch {
            Batch::Prices(points) => self.write_prices(points).await,
            Batch::Macro(points) => self.write_macro(points).await,
        }
    }

    /// Merges price rows; a key repeated in the batch keeps its last row.
    pub async fn write_prices(&self, points: Vec<MarketPricePoint>) -> Result<u64, sqlx::Error> {
        let points = dedupe_keep_last(points, |p| (p.symbol.clone(), p.trade_date));
        if points.is_empty() {
            return Ok(0);
        }

        self.market_price
            .upsert_batch(&points)
            .await
            .inspect_err(|e| {
                error!(
                    symbol = points[0].symbol.as_str(),
                    rows = points.len(),
                    "Price batch rolled back: {}",
                    e
                )
            })
    }

    pub async fn write_macro(&self, points: Vec<MacroPoint>) -> Result<u64, sqlx::Error> {
        let points = dedupe_keep_last(points, |p| (p.indicator_symbol.clone(), p.date_time));
        if points.is_empty() {
            return Ok(0);
        }

        self.macro_series
            .upsert_batch(&points)
            .await
            .inspect_err(|e| {
                error!(
                    indicator_symbol = points[0].indicator_symbol.as_str(),
                    rows = points.len(),
                    "Macro batch rolled back: {}",
                    e
                )
            })
    }
}

use chrono::NaiveDate;

use super::error::NormalizeError;
use super::normalizer::{RawTable, normalize_macro, normalize_prices};
use super::writer::UpsertWriter;
use crate::db::postgres::models::macro_series::MacroPoint;
use crate::db::postgres::models::market_price::MarketPricePoint;
use crate::env_config::models::app_config::PriceBasis;

/// Destination table of an ingestion path, with what the normalizer needs
/// to know about it.
#[derive(Debug, Clone)]
pub enum Dataset {
    MarketPrice { basis: PriceBasis },
    /// `country` overrides per-table inference when set.
    MacroSeries { country: Option<String> },
}

/// Normalized rows ready for one upsert.
#[derive(Debug, Clone, PartialEq)]
pub enum Batch {
    Prices(Vec<MarketPricePoint>),
    Macro(Vec<MacroPoint>),
}

impl Batch {
    pub fn len(&self) -> usize {
        match self {
            Batch::Prices(points) => points.len(),
            Batch::Macro(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Dataset {
    pub async fn cursor(
        &self,
        writer: &UpsertWriter,
        symbol: &str,
    ) -> Result<Option<NaiveDate>, sqlx::Error> {
        match self {
            Dataset::MarketPrice { .. } => writer.last_trade_date(symbol).await,
            Dataset::MacroSeries { .. } => writer.last_observation_date(symbol).await,
        }
    }

    pub fn normalize(&self, table: &RawTable, symbol: &str) -> Result<Batch, NormalizeError> {
        match self {
            Dataset::MarketPrice { basis } => {
                normalize_prices(table, symbol, *basis).map(Batch::Prices)
            }
            Dataset::MacroSeries { country } => {
                normalize_macro(table, symbol, country.as_deref()).map(Batch::Macro)
            }
        }
    }
}

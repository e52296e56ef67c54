use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of `market_price_daily`, unique per (symbol, trade_date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MarketPricePoint {
    pub trade_date: NaiveDate,
    pub symbol: String,
    pub open_price: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub close_price: Option<f64>,
    pub volume: Option<i64>,
}

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct PriceTableSummary {
    pub total_rows: i64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub symbol_count: i64,
}

/// Per-symbol NULL counts over the OHLCV columns.
///
/// `incomplete_rows` counts rows missing any of open/high/low/close, plus
/// rows missing volume when the symbol carries volume elsewhere. Symbols
/// whose source never reports volume (FX pairs) are not flagged for it.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct NullCoverage {
    pub symbol: String,
    pub total_rows: i64,
    pub incomplete_rows: i64,
    pub missing_volume_rows: i64,
    pub volume_tracked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct MacroTableSummary {
    pub total_rows: i64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub indicator_count: i64,
}

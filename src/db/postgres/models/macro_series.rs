use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One observation of `macro_time_series`, unique per (indicator_symbol, date_time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MacroPoint {
    pub date_time: NaiveDate,
    pub indicator_symbol: String,
    pub value: f64,
    pub country: String,
}

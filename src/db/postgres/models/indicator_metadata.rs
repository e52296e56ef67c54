use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Descriptive fields for an indicator, keyed by `indicator_symbol`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct IndicatorMetadata {
    pub indicator_symbol: String,
    pub title: Option<String>,
    pub country: Option<String>,
    pub unit: Option<String>,
    pub source: Option<String>,
    pub category: Option<String>,
    pub frequency: Option<String>,
}

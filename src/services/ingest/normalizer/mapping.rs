//! Column-name knowledge shared by every ingestion path.
//!
//! Each rule lists the accepted spellings for one canonical column, in
//! priority order. The canonical name itself always comes first so already
//! normalized input maps onto itself.

use crate::env_config::models::app_config::PriceBasis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    TradeDate,
    Close,
    Open,
    High,
    Low,
    Volume,
}

impl PriceField {
    pub fn canonical(self) -> &'static str {
        match self {
            PriceField::TradeDate => "trade_date",
            PriceField::Close => "close_price",
            PriceField::Open => "open_price",
            PriceField::High => "high_price",
            PriceField::Low => "low_price",
            PriceField::Volume => "volume",
        }
    }
}

pub struct ColumnRule {
    pub field: PriceField,
    pub aliases: &'static [&'static str],
    /// Consulted ahead of `aliases` when the source is configured for adjusted prices.
    pub adjusted_aliases: &'static [&'static str],
}

impl ColumnRule {
    pub fn candidates(&self, basis: PriceBasis) -> impl Iterator<Item = &'static str> {
        let adjusted: &'static [&'static str] = match basis {
            PriceBasis::Adjusted => self.adjusted_aliases,
            PriceBasis::Raw => &[],
        };
        adjusted.iter().chain(self.aliases.iter()).copied()
    }
}

/// Resolution order matters: a column claimed by an earlier rule is not
/// offered to later ones.
pub const PRICE_COLUMNS: &[ColumnRule] = &[
    ColumnRule {
        field: PriceField::TradeDate,
        aliases: &["trade_date", "date", "날짜", "datetime", "observation_date"],
        adjusted_aliases: &[],
    },
    ColumnRule {
        field: PriceField::Close,
        aliases: &["close_price", "close", "price", "종가", "last", "value"],
        adjusted_aliases: &["adjclose", "adj_close"],
    },
    ColumnRule {
        field: PriceField::Open,
        aliases: &["open_price", "open", "시가"],
        adjusted_aliases: &["adjopen", "adj_open"],
    },
    ColumnRule {
        field: PriceField::High,
        aliases: &["high_price", "high", "고가"],
        adjusted_aliases: &["adjhigh", "adj_high"],
    },
    ColumnRule {
        field: PriceField::Low,
        aliases: &["low_price", "low", "저가"],
        adjusted_aliases: &["adjlow", "adj_low"],
    },
    ColumnRule {
        field: PriceField::Volume,
        aliases: &["volume", "vol", "거래량"],
        adjusted_aliases: &["adjvolume", "adj_volume"],
    },
];

/// Substitutes for a missing close column, in order.
pub const CLOSE_FALLBACKS: &[PriceField] = &[PriceField::Open, PriceField::High, PriceField::Low];

pub const MACRO_DATE_CANDIDATES: &[&str] = &[
    "date_time",
    "date",
    "datetime",
    "time",
    "observation_date",
    "period",
];

/// The lowercased indicator symbol is tried after these.
pub const MACRO_VALUE_CANDIDATES: &[&str] = &["value", "actual", "close", "price", "last"];

/// Text columns containing any of these are never taken as the value.
pub const MACRO_EXCLUDED_KEYWORDS: &[&str] =
    &["country", "category", "freq", "symbol", "unit", "source"];

pub const COUNTRY_COLUMN: &str = "country";

/// Trims, strips a UTF-8 BOM, lowercases, turns spaces into underscores and
/// drops dots.
pub fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace('.', "")
}

pub fn clean_headers(headers: &[String]) -> Vec<String> {
    headers.iter().map(|h| clean_header(h)).collect()
}

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};

use crate::env_config::error::ConfigError;
use crate::env_config::models::app_env::Env;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log: LogConfig,
    pub postgres: PostgresConfig,
    pub fetch: FetchConfig,
    pub server: ServerConfig,
    #[serde(deserialize_with = "etf_source")]
    pub tiingo_etf: PriceSourceConfig,
    #[serde(deserialize_with = "fx_source")]
    pub tiingo_fx: PriceSourceConfig,
    pub fred: FredConfig,
    pub loaders: LoadersConfig,
    pub sync: SyncConfig,
    /// Set when the values came from a file rather than built-in defaults.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub timeout: u64,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: u64,
    pub idle_timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_seconds: u64,
    /// Pause between two consecutive API calls.
    pub request_delay_ms: u64,
    /// Wait applied after an HTTP 429 before the single retry.
    pub rate_limit_cooldown_seconds: u64,
    pub retry_on_rate_limit: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
}

/// Which Tiingo fields feed the canonical OHLCV columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceBasis {
    Raw,
    Adjusted,
}

/// One Tiingo collector. Keys left out of a `[tiingo_etf]` or `[tiingo_fx]`
/// section keep that source's own built-in value.
#[derive(Debug, Clone)]
pub struct PriceSourceConfig {
    pub base_url: String,
    pub symbols: Vec<String>,
    pub lookback_days: i64,
    /// Fixed first date for symbols without history; wins over `lookback_days`.
    pub history_start: Option<NaiveDate>,
    pub price_basis: PriceBasis,
}

/// Keys present in a price source section.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PriceSourceOverrides {
    base_url: Option<String>,
    symbols: Option<Vec<String>>,
    lookback_days: Option<i64>,
    history_start: Option<NaiveDate>,
    price_basis: Option<PriceBasis>,
}

impl PriceSourceOverrides {
    fn apply(self, base: PriceSourceConfig) -> PriceSourceConfig {
        PriceSourceConfig {
            base_url: self.base_url.unwrap_or(base.base_url),
            symbols: self.symbols.unwrap_or(base.symbols),
            lookback_days: self.lookback_days.unwrap_or(base.lookback_days),
            history_start: self.history_start.or(base.history_start),
            price_basis: self.price_basis.unwrap_or(base.price_basis),
        }
    }
}

fn etf_source<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PriceSourceConfig, D::Error> {
    PriceSourceOverrides::deserialize(deserializer).map(|o| o.apply(PriceSourceConfig::etf()))
}

fn fx_source<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PriceSourceConfig, D::Error> {
    PriceSourceOverrides::deserialize(deserializer).map(|o| o.apply(PriceSourceConfig::fx()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorCatalogEntry {
    pub id: String,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FredConfig {
    pub base_url: String,
    pub lookback_days: i64,
    pub history_start: Option<NaiveDate>,
    pub country: String,
    pub indicators: Vec<IndicatorCatalogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoadersConfig {
    pub market_price_dir: PathBuf,
    pub macro_series_dir: PathBuf,
    pub metadata_file: PathBuf,
    pub metadata_dir: PathBuf,
}

/// Which way `sync-db` copies the canonical tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    CloudToLocal,
    LocalToCloud,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub direction: SyncDirection,
    /// Rows read from the source per page.
    pub chunk_size: i64,
    pub tables: Vec<String>,
}

const TIINGO_BASE_URL: &str = "https://api.tiingo.com";
const FRED_BASE_URL: &str = "https://api.stlouisfed.org";

impl PriceSourceConfig {
    /// ETF closes, ten years back for symbols seen for the first time.
    pub fn etf() -> Self {
        Self {
            base_url: TIINGO_BASE_URL.to_string(),
            symbols: ["QQQ", "SPY", "GLD", "TLT"].map(String::from).to_vec(),
            lookback_days: 365 * 10,
            history_start: None,
            price_basis: PriceBasis::Raw,
        }
    }

    /// Major FX pairs from 2020 onward.
    pub fn fx() -> Self {
        Self {
            base_url: TIINGO_BASE_URL.to_string(),
            symbols: ["EURUSD", "GBPUSD", "USDJPY", "USDCHF", "AUDUSD", "USDCAD"]
                .map(String::from)
                .to_vec(),
            lookback_days: 365,
            history_start: NaiveDate::from_ymd_opt(2020, 1, 1),
            price_basis: PriceBasis::Raw,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            postgres: PostgresConfig::default(),
            fetch: FetchConfig::default(),
            server: ServerConfig::default(),
            tiingo_etf: PriceSourceConfig::etf(),
            tiingo_fx: PriceSourceConfig::fx(),
            fred: FredConfig::default(),
            loaders: LoadersConfig::default(),
            sync: SyncConfig::default(),
            source_path: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "plain".to_string(),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            max_connections: 1,
            min_connections: 1,
            max_lifetime: 1800,
            idle_timeout: 600,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            request_delay_ms: 1500,
            rate_limit_cooldown_seconds: 60,
            retry_on_rate_limit: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for FredConfig {
    fn default() -> Self {
        Self {
            base_url: FRED_BASE_URL.to_string(),
            lookback_days: 365,
            history_start: None,
            country: "United States".to_string(),
            indicators: default_fred_catalog(),
        }
    }
}

impl Default for LoadersConfig {
    fn default() -> Self {
        Self {
            market_price_dir: PathBuf::from("data/01_raw/market_price"),
            macro_series_dir: PathBuf::from("data/01_raw/macro_series"),
            metadata_file: PathBuf::from("data/01_raw/metadata/country_United_States.csv"),
            metadata_dir: PathBuf::from("data/01_raw/metadata"),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            direction: SyncDirection::CloudToLocal,
            chunk_size: 50_000,
            tables: ["indicator_metadata", "macro_time_series", "market_price_daily"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl AppConfig {
    /// Loads `{config_dir}/{env}.toml`. A missing file yields the built-in defaults.
    pub fn new(config_dir: &Path, env: Env) -> Result<Self, ConfigError> {
        let path = config_dir.join(format!("{}.toml", env));
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
            path: path.clone(),
            source,
        })?;
        let mut config = Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config.source_path = Some(path);
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

/// FRED series tracked by the indicator collector, grouped by theme.
fn default_fred_catalog() -> Vec<IndicatorCatalogEntry> {
    const CATALOG: &[(&str, &str, &str)] = &[
        ("macro", "GDP", "Nominal GDP"),
        ("macro", "GDPC1", "Real GDP"),
        ("macro", "CPIAUCSL", "Consumer Price Index"),
        ("macro", "CPILFESL", "Core Consumer Price Index"),
        ("macro", "PCEPI", "PCE Price Index"),
        ("macro", "FEDFUNDS", "Federal Funds Rate"),
        ("macro", "M2SL", "M2 Money Stock"),
        ("employment", "UNRATE", "Unemployment Rate"),
        ("employment", "PAYEMS", "Nonfarm Payrolls"),
        ("employment", "CIVPART", "Labor Force Participation Rate"),
        ("employment", "ICSA", "Initial Jobless Claims"),
        ("markets", "NASDAQCOM", "NASDAQ Composite Index"),
        ("markets", "DGS10", "10-Year Treasury Yield"),
        ("markets", "DGS2", "2-Year Treasury Yield"),
        ("markets", "T10Y2Y", "10Y-2Y Treasury Spread"),
        ("markets", "VIXCLS", "VIX Volatility Index"),
        ("real_estate", "HOUST", "Housing Starts"),
        ("real_estate", "PERMIT", "Building Permits"),
        ("real_estate", "MORTGAGE30US", "30-Year Mortgage Rate"),
        ("real_estate", "MSPUS", "Median Home Sales Price"),
        ("real_estate", "CSUSHPISA", "Case-Shiller Home Price Index"),
        ("commodities", "DCOILWTICO", "WTI Crude Oil Price"),
        ("commodities", "DCOILBRENTEU", "Brent Crude Oil Price"),
        ("commodities", "PCOPPUSDM", "Copper Price"),
        ("commodities", "GOLDPMGBD228NLBM", "Gold Price"),
        ("industrials", "INDPRO", "Industrial Production Index"),
        ("industrials", "NAPM", "ISM Manufacturing Index"),
        ("industrials", "NEWORDER", "Manufacturers' New Orders"),
        ("industrials", "CAPUTLB50001SQ", "Capacity Utilization"),
        ("consumer", "RSAFS", "Retail Sales"),
        ("consumer", "PCE", "Personal Consumption Expenditures"),
        ("consumer", "PSAVERT", "Personal Saving Rate"),
        ("consumer", "UMCSENT", "Consumer Sentiment"),
        ("international", "BOPGSTB", "Trade Balance"),
        ("international", "DEXUSEU", "USD/EUR Exchange Rate"),
        ("international", "DEXCHUS", "CNY/USD Exchange Rate"),
        ("international", "DTWEXBGS", "Broad Dollar Index"),
    ];

    CATALOG
        .iter()
        .map(|(category, id, name)| IndicatorCatalogEntry {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
        })
        .collect()
}

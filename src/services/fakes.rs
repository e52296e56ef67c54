//! In-memory repositories keyed the same way as the real tables.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Error as SqlxError;
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::{Arc, Mutex};

use crate::db::postgres::models::indicator_metadata::IndicatorMetadata;
use crate::db::postgres::models::macro_series::MacroPoint;
use crate::db::postgres::models::market_price::MarketPricePoint;
use crate::db::postgres::models::status::{MacroTableSummary, NullCoverage, PriceTableSummary};
use crate::db::postgres::repository::indicator_metadata_repository::TraitIndicatorMetadataRepository;
use crate::db::postgres::repository::macro_series_repository::TraitMacroSeriesRepository;
use crate::db::postgres::repository::market_price_repository::TraitMarketPriceRepository;
use crate::db::postgres::repository::status_repository::TraitStatusRepository;
use crate::services::ingest::writer::UpsertWriter;

#[derive(Default)]
pub struct FakeMarketPriceRepository {
    pub rows: Mutex<BTreeMap<(String, NaiveDate), MarketPricePoint>>,
    pub failing_symbols: HashSet<String>,
}

impl FakeMarketPriceRepository {
    pub fn failing(symbols: &[&str]) -> Self {
        Self {
            failing_symbols: symbols.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Vec<MarketPricePoint> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    pub fn seed(&self, point: MarketPricePoint) {
        self.rows
            .lock()
            .unwrap()
            .insert((point.symbol.clone(), point.trade_date), point);
    }
}

#[async_trait]
impl TraitMarketPriceRepository for FakeMarketPriceRepository {
    async fn get_last_trade_date(&self, symbol: &str) -> Result<Option<NaiveDate>, SqlxError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .keys()
            .filter(|(s, _)| s == symbol)
            .map(|(_, d)| *d)
            .max())
    }

    async fn upsert_batch(&self, points: &[MarketPricePoint]) -> Result<u64, SqlxError> {
        if points.iter().any(|p| self.failing_symbols.contains(&p.symbol)) {
            return Err(SqlxError::Protocol("simulated write failure".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        for p in points {
            rows.insert((p.symbol.clone(), p.trade_date), p.clone());
        }
        Ok(points.len() as u64)
    }

    async fn fetch_page(
        &self,
        after: Option<(String, NaiveDate)>,
        limit: i64,
    ) -> Result<Vec<MarketPricePoint>, SqlxError> {
        Ok(page(&self.rows.lock().unwrap(), after, limit))
    }
}

#[derive(Default)]
pub struct FakeMacroSeriesRepository {
    pub rows: Mutex<BTreeMap<(String, NaiveDate), MacroPoint>>,
}

impl FakeMacroSeriesRepository {
    pub fn snapshot(&self) -> Vec<MacroPoint> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    pub fn seed(&self, point: MacroPoint) {
        self.rows
            .lock()
            .unwrap()
            .insert((point.indicator_symbol.clone(), point.date_time), point);
    }
}

#[async_trait]
impl TraitMacroSeriesRepository for FakeMacroSeriesRepository {
    async fn get_last_date(&self, indicator_symbol: &str) -> Result<Option<NaiveDate>, SqlxError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .keys()
            .filter(|(s, _)| s == indicator_symbol)
            .map(|(_, d)| *d)
            .max())
    }

    async fn upsert_batch(&self, points: &[MacroPoint]) -> Result<u64, SqlxError> {
        let mut rows = self.rows.lock().unwrap();
        for p in points {
            rows.insert((p.indicator_symbol.clone(), p.date_time), p.clone());
        }
        Ok(points.len() as u64)
    }

    async fn fetch_page(
        &self,
        after: Option<(String, NaiveDate)>,
        limit: i64,
    ) -> Result<Vec<MacroPoint>, SqlxError> {
        Ok(page(&self.rows.lock().unwrap(), after, limit))
    }
}

#[derive(Default)]
pub struct FakeIndicatorMetadataRepository {
    pub rows: Mutex<BTreeMap<String, IndicatorMetadata>>,
}

impl FakeIndicatorMetadataRepository {
    pub fn snapshot(&self) -> Vec<IndicatorMetadata> {
        self.rows.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl TraitIndicatorMetadataRepository for FakeIndicatorMetadataRepository {
    async fn upsert_many(&self, records: &[IndicatorMetadata]) -> Result<u64, SqlxError> {
        let mut rows = self.rows.lock().unwrap();
        for r in records {
            let merged = match rows.get(&r.indicator_symbol) {
                Some(old) => IndicatorMetadata {
                    indicator_symbol: r.indicator_symbol.clone(),
                    title: r.title.clone().or_else(|| old.title.clone()),
                    country: r.country.clone().or_else(|| old.country.clone()),
                    unit: r.unit.clone().or_else(|| old.unit.clone()),
                    source: r.source.clone().or_else(|| old.source.clone()),
                    category: r.category.clone().or_else(|| old.category.clone()),
                    frequency: r.frequency.clone().or_else(|| old.frequency.clone()),
                },
                None => r.clone(),
            };
            rows.insert(r.indicator_symbol.clone(), merged);
        }
        Ok(records.len() as u64)
    }

    async fn fetch_page(
        &self,
        after: Option<String>,
        limit: i64,
    ) -> Result<Vec<IndicatorMetadata>, SqlxError> {
        Ok(page(&self.rows.lock().unwrap(), after, limit))
    }
}

/// Rows strictly after `after` in key order, as keyset pagination returns them.
fn page<K: Ord, V: Clone>(rows: &BTreeMap<K, V>, after: Option<K>, limit: i64) -> Vec<V> {
    let lower = match after {
        Some(key) => Bound::Excluded(key),
        None => Bound::Unbounded,
    };
    rows.range((lower, Bound::Unbounded))
        .take(usize::try_from(limit).unwrap_or(0))
        .map(|(_, v)| v.clone())
        .collect()
}

/// Fixed aggregates: two symbols, one with OHLCV gaps, no macro table.
#[derive(Default)]
pub struct FakeStatusRepository {
    pub tables_exist: bool,
    pub missing_tables: Vec<&'static str>,
}

impl FakeStatusRepository {
    pub fn with_tables() -> Self {
        Self {
            tables_exist: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl TraitStatusRepository for FakeStatusRepository {
    async fn ping(&self) -> Result<bool, SqlxError> {
        Ok(true)
    }

    async fn table_exists(&self, table: &str) -> Result<bool, SqlxError> {
        Ok(self.tables_exist && !self.missing_tables.iter().any(|missing| *missing == table))
    }

    async fn price_summary(&self) -> Result<Option<PriceTableSummary>, SqlxError> {
        Ok(self.tables_exist.then(|| PriceTableSummary {
            total_rows: 20,
            first_date: NaiveDate::from_ymd_opt(2015, 1, 2),
            last_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            symbol_count: 2,
        }))
    }

    async fn price_null_coverage(&self) -> Result<Vec<NullCoverage>, SqlxError> {
        if !self.tables_exist {
            return Ok(Vec::new());
        }
        Ok(vec![
            NullCoverage {
                symbol: "QQQ".into(),
                total_rows: 10,
                incomplete_rows: 0,
                missing_volume_rows: 0,
                volume_tracked: true,
            },
            NullCoverage {
                symbol: "SPY".into(),
                total_rows: 10,
                incomplete_rows: 4,
                missing_volume_rows: 4,
                volume_tracked: true,
            },
        ])
    }

    async fn macro_summary(&self) -> Result<Option<MacroTableSummary>, SqlxError> {
        Ok(None)
    }

    async fn metadata_count(&self) -> Result<Option<i64>, SqlxError> {
        Ok(self.tables_exist.then_some(7))
    }
}

pub fn writer(
    prices: &Arc<FakeMarketPriceRepository>,
    macros: &Arc<FakeMacroSeriesRepository>,
) -> UpsertWriter {
    UpsertWriter::new(prices.clone(), macros.clone())
}

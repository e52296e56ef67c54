use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::db::postgres::postgres_service::PostgresService;
use crate::db::postgres::repository::indicator_metadata_repository::TraitIndicatorMetadataRepository;
use crate::db::postgres::repository::macro_series_repository::TraitMacroSeriesRepository;
use crate::db::postgres::repository::market_price_repository::TraitMarketPriceRepository;
use crate::db::postgres::repository::status_repository::TraitStatusRepository;
use crate::services::ingest::outcome::{RunSummary, SkipReason, Stage, SymbolOutcome};
use crate::services::ingest::writer::UpsertWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTable {
    IndicatorMetadata,
    MacroSeries,
    MarketPrice,
}

impl SyncTable {
    pub fn name(self) -> &'static str {
        match self {
            SyncTable::IndicatorMetadata => "indicator_metadata",
            SyncTable::MacroSeries => "macro_time_series",
            SyncTable::MarketPrice => "market_price_daily",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            SyncTable::IndicatorMetadata,
            SyncTable::MacroSeries,
            SyncTable::MarketPrice,
        ]
        .into_iter()
        .find(|table| table.name() == name.trim())
    }
}

/// The repositories of one database taking part in a sync.
#[derive(Clone)]
pub struct SyncEndpoint {
    pub market_price: Arc<dyn TraitMarketPriceRepository + Send + Sync>,
    pub macro_series: Arc<dyn TraitMacroSeriesRepository + Send + Sync>,
    pub indicator_metadata: Arc<dyn TraitIndicatorMetadataRepository + Send + Sync>,
    pub status: Arc<dyn TraitStatusRepository + Send + Sync>,
}

impl From<&PostgresService> for SyncEndpoint {
    fn from(service: &PostgresService) -> Self {
        Self {
            market_price: service.repository_market_price.clone(),
            macro_series: service.repository_macro_series.clone(),
            indicator_metadata: service.repository_indicator_metadata.clone(),
            status: service.repository_status.clone(),
        }
    }
}

type CopyResult = Result<u64, (Stage, sqlx::Error)>;

/// Streams the canonical tables page by page from one database into another.
///
/// Rows are merged into the destination through the regular upserts, so rows
/// only the destination has survive and a rerun changes nothing. Each page
/// commits on its own.
pub struct Replicator {
    job: String,
    source: SyncEndpoint,
    destination: SyncEndpoint,
    writer: UpsertWriter,
    chunk_size: i64,
}

impl Replicator {
    pub fn new(
        job: &str,
        source: SyncEndpoint,
        destination: SyncEndpoint,
        chunk_size: i64,
    ) -> Self {
        let writer = UpsertWriter::new(
            destination.market_price.clone(),
            destination.macro_series.clone(),
        );
        Self {
            job: job.to_string(),
            source,
            destination,
            writer,
            chunk_size: chunk_size.max(1),
        }
    }

    pub async fn run(&self, tables: &[String]) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary::new(&self.job);

        for name in tables {
            let outcome = match SyncTable::from_name(name) {
                Some(table) => self.sync_table(table).await,
                None => SymbolOutcome::Failed {
                    stage: Stage::Plan,
                    reason: format!("unknown table '{}'", name),
                },
            };

            match &outcome {
                SymbolOutcome::Written { rows } => {
                    info!(job = self.job.as_str(), table = name.as_str(), rows, "Table synced")
                }
                SymbolOutcome::Skipped(reason) => {
                    info!(job = self.job.as_str(), table = name.as_str(), ?reason, "Table skipped")
                }
                SymbolOutcome::Failed { stage, reason } => warn!(
                    job = self.job.as_str(),
                    table = name.as_str(),
                    %stage,
                    "Table sync failed: {}",
                    reason
                ),
            }
            summary.record(name, outcome);
        }

        summary.elapsed = started.elapsed();
        summary
    }

    async fn sync_table(&self, table: SyncTable) -> SymbolOutcome {
        match self.source.status.table_exists(table.name()).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    job = self.job.as_str(),
                    table = table.name(),
                    "Table missing in source database"
                );
                return SymbolOutcome::Skipped(SkipReason::NoData);
            }
            Err(e) => {
                return SymbolOutcome::Failed {
                    stage: Stage::Read,
                    reason: e.to_string(),
                };
            }
        }

        let copied = match table {
            SyncTable::IndicatorMetadata => self.copy_metadata().await,
            SyncTable::MacroSeries => self.copy_macro_series().await,
            SyncTable::MarketPrice => self.copy_market_prices().await,
        };

        match copied {
            Ok(0) => SymbolOutcome::Skipped(SkipReason::NoData),
            Ok(rows) => SymbolOutcome::Written { rows },
            Err((stage, e)) => SymbolOutcome::Failed {
                stage,
                reason: e.to_string(),
            },
        }
    }

    async fn copy_market_prices(&self) -> CopyResult {
        let mut after = None;
        let mut copied = 0;
        loop {
            let page = self
                .source
                .market_price
                .fetch_page(after.clone(), self.chunk_size)
                .await
                .map_err(|e| (Stage::Read, e))?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some((last.symbol.clone(), last.trade_date));
            let is_last_page = (page.len() as i64) < self.chunk_size;

            copied += page.len() as u64;
            self.writer
                .write_prices(page)
                .await
                .map_err(|e| (Stage::Write, e))?;
            self.log_progress(SyncTable::MarketPrice, copied);

            if is_last_page {
                break;
            }
        }
        Ok(copied)
    }

    async fn copy_macro_series(&self) -> CopyResult {
        let mut after = None;
        let mut copied = 0;
        loop {
            let page = self
                .source
                .macro_series
                .fetch_page(after.clone(), self.chunk_size)
                .await
                .map_err(|e| (Stage::Read, e))?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some((last.indicator_symbol.clone(), last.date_time));
            let is_last_page = (page.len() as i64) < self.chunk_size;

            copied += page.len() as u64;
            self.writer
                .write_macro(page)
                .await
                .map_err(|e| (Stage::Write, e))?;
            self.log_progress(SyncTable::MacroSeries, copied);

            if is_last_page {
                break;
            }
        }
        Ok(copied)
    }

    async fn copy_metadata(&self) -> CopyResult {
        let mut after = None;
        let mut copied = 0;
        loop {
            let page = self
                .source
                .indicator_metadata
                .fetch_page(after.clone(), self.chunk_size)
                .await
                .map_err(|e| (Stage::Read, e))?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.indicator_symbol.clone());
            let is_last_page = (page.len() as i64) < self.chunk_size;

            copied += page.len() as u64;
            self.destination
                .indicator_metadata
                .upsert_many(&page)
                .await
                .map_err(|e| (Stage::Write, e))?;
            self.log_progress(SyncTable::IndicatorMetadata, copied);

            if is_last_page {
                break;
            }
        }
        Ok(copied)
    }

    fn log_progress(&self, table: SyncTable, copied: u64) {
        info!(job = self.job.as_str(), table = table.name(), copied, "Copied page");
    }
}

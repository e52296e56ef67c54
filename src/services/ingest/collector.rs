use chrono::NaiveDate;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::dataset::Dataset;
use super::fetcher::RemoteSource;
use super::outcome::{RunSummary, SkipReason, Stage, SymbolOutcome};
use super::planner::{FetchPlan, StartPolicy, plan};
use super::writer::UpsertWriter;

/// Walks a fixed symbol list: plan, fetch, normalize, write. Every symbol
/// ends in its own outcome; nothing one symbol does stops the next.
pub struct Collector {
    job: String,
    source: Arc<dyn RemoteSource>,
    dataset: Dataset,
    writer: UpsertWriter,
    policy: StartPolicy,
    request_delay: Duration,
}

impl Collector {
    pub fn new(
        job: &str,
        source: Arc<dyn RemoteSource>,
        dataset: Dataset,
        writer: UpsertWriter,
        policy: StartPolicy,
        request_delay: Duration,
    ) -> Self {
        Self {
            job: job.to_string(),
            source,
            dataset,
            writer,
            policy,
            request_delay,
        }
    }

    pub async fn run(&self, symbols: &[String], today: NaiveDate) -> RunSummary {
        info!(
            job = self.job.as_str(),
            source = self.source.name(),
            symbols = symbols.len(),
            %today,
            "Starting collection"
        );

        let started = Instant::now();
        let mut summary = RunSummary::new(&self.job);

        for (index, symbol) in symbols.iter().enumerate() {
            info!("Processing {}/{}: {}", index + 1, symbols.len(), symbol);

            let outcome = self.process_symbol(symbol, today).await;
            let requested = !matches!(
                outcome,
                SymbolOutcome::Skipped(SkipReason::UpToDate)
                    | SymbolOutcome::Failed {
                        stage: Stage::Plan,
                        ..
                    }
            );
            summary.record(symbol, outcome);

            if requested && index + 1 < symbols.len() && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        summary.elapsed = started.elapsed();
        summary
    }

    async fn process_symbol(&self, symbol: &str, today: NaiveDate) -> SymbolOutcome {
        let cursor = match self.dataset.cursor(&self.writer, symbol).await {
            Ok(cursor) => cursor,
            Err(e) => {
                error!(symbol, stage = %Stage::Plan, "Failed to read cursor: {}", e);
                return SymbolOutcome::Failed {
                    stage: Stage::Plan,
                    reason: e.to_string(),
                };
            }
        };

        let range = match plan(cursor, today, self.policy) {
            FetchPlan::UpToDate => {
                info!(symbol, last = ?cursor, "Already up to date");
                return SymbolOutcome::Skipped(SkipReason::UpToDate);
            }
            FetchPlan::Fetch(range) => range,
        };
        debug!(symbol, %range, last = ?cursor, "Planned fetch window");

        let table = match self.source.fetch(symbol, range).await {
            Ok(table) => table,
            Err(e) => {
                error!(symbol, stage = %Stage::Fetch, "Fetch failed: {}", e);
                return SymbolOutcome::Failed {
                    stage: Stage::Fetch,
                    reason: e.to_string(),
                };
            }
        };

        if table.is_empty() {
            warn!(symbol, %range, "No data returned");
            return SymbolOutcome::Skipped(SkipReason::NoData);
        }

        let batch = match self.dataset.normalize(&table, symbol) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(symbol, stage = %Stage::Normalize, "Skipping batch: {}", e);
                return SymbolOutcome::Skipped(SkipReason::UnrecognizedSchema);
            }
        };

        if batch.is_empty() {
            warn!(symbol, raw_rows = table.len(), "No usable rows after normalization");
            return SymbolOutcome::Skipped(SkipReason::NoData);
        }

        match self.writer.write(batch).await {
            Ok(rows) => {
                info!(symbol, rows, "Saved rows");
                SymbolOutcome::Written { rows }
            }
            Err(e) => SymbolOutcome::Failed {
                stage: Stage::Write,
                reason: e.to_string(),
            },
        }
    }
}

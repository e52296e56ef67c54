//! Read-only audit of what the pipeline has stored so far.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::db::postgres::models::status::{MacroTableSummary, NullCoverage, PriceTableSummary};
use crate::db::postgres::repository::status_repository::TraitStatusRepository;

/// Everything a dashboard needs to judge data freshness and completeness.
/// `None` fields mean the table does not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSummary {
    pub market_price: Option<PriceTableSummary>,
    pub incomplete_symbols: Vec<NullCoverage>,
    pub macro_series: Option<MacroTableSummary>,
    pub metadata_rows: Option<i64>,
}

impl StatusSummary {
    pub fn has_gaps(&self) -> bool {
        !self.incomplete_symbols.is_empty()
    }
}

pub struct StatusReporter {
    repository: Arc<dyn TraitStatusRepository + Send + Sync>,
}

impl StatusReporter {
    pub fn new(repository: Arc<dyn TraitStatusRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    pub async fn report(&self) -> Result<StatusSummary, sqlx::Error> {
        let market_price = self.repository.price_summary().await?;
        let incomplete_symbols = self
            .repository
            .price_null_coverage()
            .await?
            .into_iter()
            .filter(|coverage| coverage.incomplete_rows > 0)
            .collect();
        let macro_series = self.repository.macro_summary().await?;
        let metadata_rows = self.repository.metadata_count().await?;

        let summary = StatusSummary {
            market_price,
            incomplete_symbols,
            macro_series,
            metadata_rows,
        };
        info!(has_gaps = summary.has_gaps(), "Status report assembled");
        Ok(summary)
    }
}

fn date_span(first: Option<NaiveDate>, last: Option<NaiveDate>) -> String {
    match (first, last) {
        (Some(first), Some(last)) => format!("{} ~ {}", first, last),
        _ => "-".to_string(),
    }
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[market_price_daily]")?;
        match &self.market_price {
            Some(p) => {
                writeln!(f, "  rows:    {}", p.total_rows)?;
                writeln!(f, "  range:   {}", date_span(p.first_date, p.last_date))?;
                writeln!(f, "  symbols: {}", p.symbol_count)?;
            }
            None => writeln!(f, "  table missing")?,
        }

        if self.has_gaps() {
            writeln!(f, "  incomplete OHLCV rows:")?;
            for gap in &self.incomplete_symbols {
                write!(
                    f,
                    "    {}: {}/{} rows",
                    gap.symbol, gap.incomplete_rows, gap.total_rows
                )?;
                if gap.volume_tracked {
                    writeln!(f)?;
                } else {
                    writeln!(f, " (no volume reported by source)")?;
                }
            }
            writeln!(
                f,
                "  re-run collect-etf or collect-forex for these symbols to backfill the missing fields"
            )?;
        }

        writeln!(f, "[macro_time_series]")?;
        match &self.macro_series {
            Some(m) => {
                writeln!(f, "  rows:       {}", m.total_rows)?;
                writeln!(f, "  range:      {}", date_span(m.first_date, m.last_date))?;
                writeln!(f, "  indicators: {}", m.indicator_count)?;
            }
            None => writeln!(f, "  table missing")?,
        }

        writeln!(f, "[indicator_metadata]")?;
        match self.metadata_rows {
            Some(rows) => writeln!(f, "  rows: {}", rows),
            None => writeln!(f, "  table missing"),
        }
    }
}

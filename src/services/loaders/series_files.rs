use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

use super::error::LoadError;
use super::file_reader::{list_csv_files, read_csv_table};
use crate::services::ingest::dataset::Dataset;
use crate::services::ingest::outcome::{RunSummary, SkipReason, Stage, SymbolOutcome};
use crate::services::ingest::writer::UpsertWriter;

/// Symbol for a price export such as `MARKETS_HISTORICAL_KOSPI_IND.csv`.
pub fn market_price_symbol(path: &Path) -> String {
    let symbol = file_stem_upper(path);
    if !symbol.contains("MARKETS_HISTORICAL_") {
        return symbol;
    }
    symbol
        .replace("MARKETS_HISTORICAL_", "")
        .replace("_CUR", "")
        .replace("_IND", "")
        .replace("_COM", "")
}

/// Symbol for a macro export such as `HISTORICAL_COUNTRY_KOREA_INDICATOR_CPI_.csv`.
pub fn macro_series_symbol(path: &Path) -> String {
    let symbol = file_stem_upper(path);
    if !symbol.contains("HISTORICAL_COUNTRY_") {
        return symbol;
    }
    let symbol = symbol
        .replace("HISTORICAL_COUNTRY_", "")
        .replace("_INDICATOR_", "_");
    match symbol.strip_suffix('_') {
        Some(trimmed) => trimmed.to_string(),
        None => symbol,
    }
}

fn file_stem_upper(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_uppercase())
        .unwrap_or_default()
}

/// Loads every CSV in `dir` into the dataset's table. One file's failure is
/// recorded and the rest continue; only an unreadable directory aborts.
pub async fn load_directory(
    job: &str,
    dir: &Path,
    dataset: &Dataset,
    symbol_for: fn(&Path) -> String,
    writer: &UpsertWriter,
) -> Result<RunSummary, LoadError> {
    let started = Instant::now();
    let files = list_csv_files(dir).await?;
    info!(job, dir = %dir.display(), files = files.len(), "Loading files");

    let mut summary = RunSummary::new(job);
    for path in &files {
        let symbol = symbol_for(path);
        let outcome = load_file(path, &symbol, dataset, writer).await;
        summary.record(&symbol, outcome);
    }

    summary.elapsed = started.elapsed();
    info!(job, "Loaded {} of {} files", summary.written, summary.total);
    Ok(summary)
}

async fn load_file(
    path: &Path,
    symbol: &str,
    dataset: &Dataset,
    writer: &UpsertWriter,
) -> SymbolOutcome {
    let table = match read_csv_table(path).await {
        Ok(table) => table,
        Err(e) => {
            error!(symbol, stage = %Stage::Read, "{}", e);
            return SymbolOutcome::Failed {
                stage: Stage::Read,
                reason: e.to_string(),
            };
        }
    };

    let batch = match dataset.normalize(&table, symbol) {
        Ok(batch) => batch,
        Err(e) => {
            warn!(symbol, file = %path.display(), "Skipping file: {}", e);
            return SymbolOutcome::Skipped(SkipReason::UnrecognizedSchema);
        }
    };

    if batch.is_empty() {
        warn!(symbol, file = %path.display(), "No usable rows");
        return SymbolOutcome::Skipped(SkipReason::NoData);
    }

    match writer.write(batch).await {
        Ok(rows) => SymbolOutcome::Written { rows },
        Err(e) => SymbolOutcome::Failed {
            stage: Stage::Write,
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env_config::models::app_config::PriceBasis;
    use crate::services::fakes::{FakeMacroSeriesRepository, FakeMarketPriceRepository, writer};
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn price_file_names() {
        assert_eq!(
            market_price_symbol(&PathBuf::from("d/MARKETS_HISTORICAL_KOSPI_IND.csv")),
            "KOSPI"
        );
        assert_eq!(
            market_price_symbol(&PathBuf::from("markets_historical_usdkrw_cur.csv")),
            "USDKRW"
        );
        assert_eq!(market_price_symbol(&PathBuf::from("dgs10.csv")), "DGS10");
    }

    #[test]
    fn macro_file_names() {
        assert_eq!(
            macro_series_symbol(&PathBuf::from("HISTORICAL_COUNTRY_KOREA_INDICATOR_CPI_.csv")),
            "KOREA_CPI"
        );
        assert_eq!(macro_series_symbol(&PathBuf::from("unrate.csv")), "UNRATE");
    }

    #[tokio::test]
    async fn loads_prices_and_contains_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("MARKETS_HISTORICAL_KOSPI_IND.csv"),
            "Date,Price,Open,High,Low,Vol.\n\"Jan 02, 2024\",\"2,669.81\",\"2,650.00\",\"2,680.00\",\"2,640.00\",\"500,000\"\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.csv"), "date,comment\n2024-01-02,hi\n").unwrap();
        std::fs::write(dir.path().join("empty.csv"), "date,close\nnot-a-date,1\n").unwrap();

        let prices = Arc::new(FakeMarketPriceRepository::default());
        let macros = Arc::new(FakeMacroSeriesRepository::default());
        let summary = load_directory(
            "load-market-prices",
            dir.path(),
            &Dataset::MarketPrice {
                basis: PriceBasis::Raw,
            },
            market_price_symbol,
            &writer(&prices, &macros),
        )
        .await
        .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.written, 1);
        assert_eq!(summary.skipped, 2);

        let stored = prices.snapshot();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].symbol, "KOSPI");
        assert_eq!(stored[0].close_price, Some(2669.81));
        assert_eq!(stored[0].volume, Some(500_000));
    }

    #[tokio::test]
    async fn loads_macro_series_with_inferred_country() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("HISTORICAL_COUNTRY_SOUTH_KOREA_INDICATOR_CPI_.csv"),
            "\u{feff}Date,Actual\n2024-01-01,3.2\n2024-02-01,3.1\n",
        )
        .unwrap();

        let prices = Arc::new(FakeMarketPriceRepository::default());
        let macros = Arc::new(FakeMacroSeriesRepository::default());
        let summary = load_directory(
            "load-macro-series",
            dir.path(),
            &Dataset::MacroSeries { country: None },
            macro_series_symbol,
            &writer(&prices, &macros),
        )
        .await
        .unwrap();

        assert_eq!(summary.rows_written, 2);
        let stored = macros.snapshot();
        assert!(stored.iter().all(|p| p.indicator_symbol == "SOUTH_KOREA_CPI"));
        assert!(stored.iter().all(|p| p.country == "South Korea"));
    }
}

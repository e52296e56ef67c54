use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::error::LoadError;
use super::file_reader::{list_csv_files, read_csv_table};
use crate::db::postgres::models::indicator_metadata::IndicatorMetadata;
use crate::db::postgres::repository::indicator_metadata_repository::TraitIndicatorMetadataRepository;
use crate::env_config::models::app_config::IndicatorCatalogEntry;
use crate::services::ingest::normalizer::RawTable;
use crate::services::ingest::normalizer::mapping::clean_header;

const SYMBOL_COLUMN: &str = "historicaldatasymbol";
const FRED_SOURCE: &str = "FRED";

/// The configured file when it exists, else the first CSV in `dir`.
pub async fn resolve_metadata_file(file: &Path, dir: &Path) -> Result<PathBuf, LoadError> {
    if tokio::fs::try_exists(file).await.unwrap_or(false) {
        return Ok(file.to_path_buf());
    }

    warn!(file = %file.display(), "Metadata file not found, looking for another CSV");
    let candidates = match list_csv_files(dir).await {
        Ok(files) => files,
        Err(LoadError::ReadDir { .. }) => Vec::new(),
        Err(e) => return Err(e),
    };

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| LoadError::MissingMetadata {
            file: file.to_path_buf(),
            dir: dir.to_path_buf(),
        })
}

/// Reads `HistoricalDataSymbol, Title, Country, Unit, Source, Category,
/// Frequency` rows. Rows without a symbol are dropped; other columns are optional.
pub fn parse_metadata(table: &RawTable, path: &Path) -> Result<Vec<IndicatorMetadata>, LoadError> {
    let headers: Vec<String> = table.headers.iter().map(|h| clean_header(h)).collect();
    let find = |name: &str| headers.iter().position(|h| h == name);

    let symbol_col = find(SYMBOL_COLUMN).ok_or_else(|| LoadError::MissingColumn {
        path: path.to_path_buf(),
        column: "HistoricalDataSymbol",
    })?;
    let [title, country, unit, source, category, frequency] =
        ["title", "country", "unit", "source", "category", "frequency"].map(find);

    let text = |row: usize, col: Option<usize>| {
        col.and_then(|c| table.cell(row, c))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok((0..table.len())
        .filter_map(|row| {
            Some(IndicatorMetadata {
                indicator_symbol: text(row, Some(symbol_col))?,
                title: text(row, title),
                country: text(row, country),
                unit: text(row, unit),
                source: text(row, source),
                category: text(row, category),
                frequency: text(row, frequency),
            })
        })
        .collect())
}

pub async fn load_metadata_file(
    file: &Path,
    dir: &Path,
    repository: &(dyn TraitIndicatorMetadataRepository + Send + Sync),
) -> Result<u64, LoadError> {
    let path = resolve_metadata_file(file, dir).await?;
    let table = read_csv_table(&path).await?;
    let records = parse_metadata(&table, &path)?;

    info!(file = %path.display(), records = records.len(), "Loading indicator metadata");
    Ok(repository.upsert_many(&records).await?)
}

/// Describes every catalog series so dashboards can label FRED data.
pub fn catalog_metadata(catalog: &[IndicatorCatalogEntry], country: &str) -> Vec<IndicatorMetadata> {
    catalog
        .iter()
        .map(|entry| IndicatorMetadata {
            indicator_symbol: entry.id.clone(),
            title: Some(entry.name.clone()),
            country: Some(country.to_string()),
            unit: None,
            source: Some(FRED_SOURCE.to_string()),
            category: Some(entry.category.clone()),
            frequency: None,
        })
        .collect()
}

use tracing::debug;

use super::coerce::{is_numeric_column, parse_date, parse_number};
use super::dedupe_keep_last;
use super::mapping::{
    COUNTRY_COLUMN, MACRO_DATE_CANDIDATES, MACRO_EXCLUDED_KEYWORDS, MACRO_VALUE_CANDIDATES,
    clean_headers,
};
use super::table::RawTable;
use crate::db::postgres::models::macro_series::MacroPoint;
use crate::services::ingest::error::NormalizeError;

const DEFAULT_COUNTRY: &str = "United States";

/// Maps a raw `(date, value)` style table onto `macro_time_series` rows.
///
/// `country` overrides inference when the caller knows it. Rows missing
/// either a date or a value are dropped.
pub fn normalize_macro(
    table: &RawTable,
    indicator_symbol: &str,
    country: Option<&str>,
) -> Result<Vec<MacroPoint>, NormalizeError> {
    let headers = clean_headers(&table.headers);
    let no_value = || NormalizeError::NoValueColumn {
        symbol: indicator_symbol.to_string(),
        columns: headers.clone(),
    };

    if headers.is_empty() {
        return Err(no_value());
    }

    let date_col = MACRO_DATE_CANDIDATES
        .iter()
        .find_map(|cand| headers.iter().position(|h| h == cand))
        .unwrap_or(0);
    let value_col =
        find_value_column(table, &headers, date_col, indicator_symbol).ok_or_else(no_value)?;

    let country = match country {
        Some(c) => c.to_string(),
        None => infer_country(table, &headers, indicator_symbol),
    };

    debug!(
        indicator_symbol,
        date_column = headers[date_col].as_str(),
        value_column = headers[value_col].as_str(),
        country = country.as_str(),
        "Resolved macro columns"
    );

    let points = (0..table.len())
        .filter_map(|row| {
            let date_time = table.cell(row, date_col).and_then(parse_date)?;
            let value = table.cell(row, value_col).and_then(parse_number)?;
            Some(MacroPoint {
                date_time,
                indicator_symbol: indicator_symbol.to_string(),
                value,
                country: country.clone(),
            })
        })
        .collect();

    Ok(dedupe_keep_last(points, |p| p.date_time))
}

fn find_value_column(
    table: &RawTable,
    headers: &[String],
    date_col: usize,
    indicator_symbol: &str,
) -> Option<usize> {
    let symbol_lower = indicator_symbol.to_lowercase();
    let by_name = MACRO_VALUE_CANDIDATES
        .iter()
        .copied()
        .chain(std::iter::once(symbol_lower.as_str()))
        .find_map(|cand| {
            headers
                .iter()
                .position(|h| h == cand)
                .filter(|idx| *idx != date_col)
        });
    if by_name.is_some() {
        return by_name;
    }

    let by_type =
        (0..headers.len()).find(|idx| *idx != date_col && is_numeric_column(table.column(*idx)));
    if by_type.is_some() {
        return by_type;
    }

    (0..headers.len()).find(|idx| {
        *idx != date_col
            && !MACRO_EXCLUDED_KEYWORDS
                .iter()
                .any(|kw| headers[*idx].contains(kw))
    })
}

/// A `country` column's first value, else a guess from the symbol.
fn infer_country(table: &RawTable, headers: &[String], indicator_symbol: &str) -> String {
    let from_column = headers
        .iter()
        .position(|h| h == COUNTRY_COLUMN)
        .and_then(|col| table.column(col).flatten().next())
        .map(str::to_string);

    from_column.unwrap_or_else(|| {
        if indicator_symbol.to_uppercase().contains("KOREA") {
            "South Korea".to_string()
        } else {
            DEFAULT_COUNTRY.to_string()
        }
    })
}

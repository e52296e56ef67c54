use std::collections::HashMap;
use tracing::debug;

use super::coerce::{is_numeric_column, parse_date, parse_number, parse_volume};
use super::dedupe_keep_last;
use super::mapping::{CLOSE_FALLBACKS, PRICE_COLUMNS, PriceField, clean_headers};
use super::table::RawTable;
use crate::db::postgres::models::market_price::MarketPricePoint;
use crate::env_config::models::app_config::PriceBasis;
use crate::services::ingest::error::NormalizeError;

/// Maps a raw OHLCV table onto `market_price_daily` rows for `symbol`.
///
/// Rows whose date cannot be parsed are dropped; unparseable numbers become
/// NULL. Repeated dates keep the last row.
pub fn normalize_prices(
    table: &RawTable,
    symbol: &str,
    basis: PriceBasis,
) -> Result<Vec<MarketPricePoint>, NormalizeError> {
    let headers = clean_headers(&table.headers);
    let columns = resolve_columns(table, &headers, basis).ok_or_else(|| {
        NormalizeError::NoValueColumn {
            symbol: symbol.to_string(),
            columns: headers.clone(),
        }
    })?;

    debug!(
        symbol,
        columns = ?columns
            .iter()
            .map(|(field, idx)| (field.canonical(), headers[*idx].as_str()))
            .collect::<Vec<_>>(),
        "Resolved price columns"
    );

    let date_col = columns[&PriceField::TradeDate];
    let number = |row: usize, field: PriceField| {
        columns
            .get(&field)
            .and_then(|&col| table.cell(row, col))
            .and_then(parse_number)
    };

    let mut points = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let Some(trade_date) = table.cell(row, date_col).and_then(parse_date) else {
            continue;
        };

        points.push(MarketPricePoint {
            trade_date,
            symbol: symbol.to_string(),
            open_price: number(row, PriceField::Open),
            high_price: number(row, PriceField::High),
            low_price: number(row, PriceField::Low),
            close_price: number(row, PriceField::Close),
            volume: columns
                .get(&PriceField::Volume)
                .and_then(|&col| table.cell(row, col))
                .and_then(parse_volume),
        });
    }

    Ok(dedupe_keep_last(points, |p| p.trade_date))
}

/// Column index per canonical field. `None` when no close can be derived.
fn resolve_columns(
    table: &RawTable,
    headers: &[String],
    basis: PriceBasis,
) -> Option<HashMap<PriceField, usize>> {
    if headers.is_empty() {
        return None;
    }

    let mut columns: HashMap<PriceField, usize> = HashMap::new();
    for rule in PRICE_COLUMNS {
        let found = rule.candidates(basis).find_map(|alias| {
            headers
                .iter()
                .position(|h| h == alias)
                .filter(|idx| !columns.values().any(|claimed| claimed == idx))
        });
        if let Some(idx) = found {
            columns.insert(rule.field, idx);
        }
    }

    if !columns.contains_key(&PriceField::TradeDate) {
        columns.retain(|_, idx| *idx != 0);
        columns.insert(PriceField::TradeDate, 0);
    }

    if !columns.contains_key(&PriceField::Close) {
        let substitute = CLOSE_FALLBACKS
            .iter()
            .find_map(|field| columns.get(field).copied())
            .or_else(|| {
                (0..headers.len()).find(|idx| {
                    !columns.values().any(|claimed| claimed == idx)
                        && is_numeric_column(table.column(*idx))
                })
            })?;
        columns.insert(PriceField::Close, substitute);
    }

    Some(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn csv(content: &str) -> RawTable {
        RawTable::from_csv_str(content).unwrap()
    }

    #[test]
    fn tiingo_record_becomes_one_point() {
        let table = RawTable::from_json_records(&[json!({
            "date": "2024-01-02", "open": 100, "high": 101, "low": 99,
            "close": 100.5, "volume": 1000
        })]);

        let points = normalize_prices(&table, "QQQ", PriceBasis::Raw).unwrap();

        assert_eq!(
            points,
            vec![MarketPricePoint {
                trade_date: d(2024, 1, 2),
                symbol: "QQQ".to_string(),
                open_price: Some(100.0),
                high_price: Some(101.0),
                low_price: Some(99.0),
                close_price: Some(100.5),
                volume: Some(1000),
            }]
        );
    }

    #[test]
    fn display_headers_match_canonical_headers() {
        let display = csv("Date,Open,High,Low,Close,Volume\n2024-01-02,1,2,0.5,1.5,10\n");
        let canonical = csv(
            "trade_date,open_price,high_price,low_price,close_price,volume\n\
             2024-01-02,1,2,0.5,1.5,10\n",
        );

        assert_eq!(
            normalize_prices(&display, "SPY", PriceBasis::Raw).unwrap(),
            normalize_prices(&canonical, "SPY", PriceBasis::Raw).unwrap()
        );
    }

    #[test]
    fn adjusted_basis_prefers_adjusted_fields() {
        let table = RawTable::from_json_records(&[json!({
            "date": "2024-01-02T00:00:00.000Z", "close": 100.0, "adjClose": 95.0,
            "volume": 10, "adjVolume": 12
        })]);

        let raw = normalize_prices(&table, "SPY", PriceBasis::Raw).unwrap();
        let adjusted = normalize_prices(&table, "SPY", PriceBasis::Adjusted).unwrap();

        assert_eq!(raw[0].close_price, Some(100.0));
        assert_eq!(adjusted[0].close_price, Some(95.0));
        assert_eq!(adjusted[0].volume, Some(12));
    }

    #[test]
    fn missing_date_header_uses_first_column() {
        let table = csv("When,Close\n01/02/2024,3\n");
        let points = normalize_prices(&table, "X", PriceBasis::Raw).unwrap();
        assert_eq!(points[0].trade_date, d(2024, 1, 2));
        assert_eq!(points[0].close_price, Some(3.0));
    }

    #[test]
    fn missing_close_falls_back_to_open() {
        let table = csv("date,open,high\n2024-01-02,5,6\n");
        let points = normalize_prices(&table, "X", PriceBasis::Raw).unwrap();
        assert_eq!(points[0].close_price, Some(5.0));
        assert_eq!(points[0].open_price, Some(5.0));
    }

    #[test]
    fn self_named_series_uses_first_numeric_column() {
        let table = csv("observation_date,note,DGS10\n2024-01-02,x,4.01\n2024-01-03,y,4.02\n");
        let points = normalize_prices(&table, "DGS10", PriceBasis::Raw).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].close_price, Some(4.01));
        assert_eq!(points[1].close_price, Some(4.02));
    }

    #[test]
    fn thousands_separators_and_bad_cells() {
        let table = csv("Date,Price,Vol.\n\"Jan 02, 2024\",\"1,234.50\",n/a\nbad-date,1,1\n");
        let points = normalize_prices(&table, "KOSPI", PriceBasis::Raw).unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].close_price, Some(1234.5));
        assert_eq!(points[0].volume, None);
    }

    #[test]
    fn duplicate_dates_keep_last_row() {
        let table = csv("date,close\n2024-01-02,1\n2024-01-02,2\n");
        let points = normalize_prices(&table, "X", PriceBasis::Raw).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].close_price, Some(2.0));
    }

    #[test]
    fn no_value_column_is_reported() {
        let table = csv("date,comment\n2024-01-02,hello\n");
        let err = normalize_prices(&table, "X", PriceBasis::Raw).unwrap_err();
        assert!(matches!(err, NormalizeError::NoValueColumn { ref symbol, .. } if symbol == "X"));
    }
}

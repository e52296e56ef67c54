use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%b %d, %Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const ZONED_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

/// Parses the date part of a cell. Zoned timestamps keep their local date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.date_naive());
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parses a numeric cell, ignoring thousands separators. Anything that is not
/// a finite number is treated as missing.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_volume(raw: &str) -> Option<i64> {
    parse_number(raw).map(|v| v.round() as i64)
}

/// True when every non-empty cell parses as a number and at least one does.
pub fn is_numeric_column<'a>(cells: impl IntoIterator<Item = Option<&'a str>>) -> bool {
    let mut seen = false;
    for cell in cells.into_iter().flatten() {
        if parse_number(cell).is_none() {
            return false;
        }
        seen = true;
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_supported_date_shapes() {
        assert_eq!(parse_date("2024-01-02"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("2024-01-02T00:00:00.000Z"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("2024-01-02T00:00:00+00:00"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("2024-01-02 15:30:00"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("2024/01/02"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("01/02/2024"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("Jan 02, 2024"), Some(d(2024, 1, 2)));
    }

    #[test]
    fn rejects_garbage_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2024-13-45"), None);
    }

    #[test]
    fn numbers_drop_separators_and_missing_markers() {
        assert_eq!(parse_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_volume("1,000"), Some(1000));
    }

    #[test]
    fn numeric_column_detection() {
        assert!(is_numeric_column([Some("1"), None, Some("2,000")]));
        assert!(!is_numeric_column([Some("1"), Some("abc")]));
        assert!(!is_numeric_column([None, None]));
    }
}

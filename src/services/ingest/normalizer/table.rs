use serde_json::Value;

/// Untyped rows as delivered by a source, before any column is interpreted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { headers, rows }
    }

    /// Builds a table from a JSON array of flat objects. Headers are the
    /// union of keys in first-seen order.
    pub fn from_json_records(records: &[Value]) -> Self {
        let mut headers: Vec<String> = Vec::new();
        for record in records {
            if let Value::Object(map) = record {
                for key in map.keys() {
                    if !headers.iter().any(|h| h == key) {
                        headers.push(key.clone());
                    }
                }
            }
        }

        let rows = records
            .iter()
            .filter_map(|record| record.as_object())
            .map(|map| {
                headers
                    .iter()
                    .map(|h| map.get(h).and_then(json_cell))
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    pub fn from_csv_str(content: &str) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            rows.push(
                record
                    .iter()
                    .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                    .collect(),
            );
        }

        Ok(Self { headers, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        (0..self.rows.len()).map(move |row| self.cell(row, col))
    }
}

fn json_cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

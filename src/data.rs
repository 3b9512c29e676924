use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Markers read as missing values, matching the common CSV readers' defaults.
const NULL_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single table value. The type is inferred when the table is read, not declared.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Infer a cell from raw CSV text. Empty text, NA markers and non-finite
    /// numbers become Null; finite numbers become Number.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || NULL_MARKERS.contains(&trimmed) {
            return Cell::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Cell::Number(n),
            Ok(_) => Cell::Null,
            Err(_) => Cell::Text(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric coercion. Text that does not parse becomes None (excluded downstream).
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if !n.is_finite() => None,
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Cell::Null => None,
        }
    }

    /// String coercion. Numbers print without a trailing `.0` when integral.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Text(s) => Some(s.clone()),
            Cell::Null => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Number(n) => number_to_json(*n),
            Cell::Text(s) => Value::String(s.clone()),
        }
    }

    fn from_json(value: &Value, header: &str) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Cell::infer(s)),
            Value::Number(n) => Ok(n.as_f64().map(Cell::Number).unwrap_or(Cell::Null)),
            Value::Bool(b) => Ok(Cell::Text(b.to_string())),
            Value::Null => Ok(Cell::Null),
            _ => Err(anyhow!("Unsupported value type for field '{}'", header)),
        }
    }
}

/// Integral values become JSON integers so axis labels read `2010`, not `2010.0`.
pub fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

/// Ordered rows with named columns. Column names are trimmed on load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let headers = headers.into_iter().map(|h| h.trim().to_string()).collect();
        Self { headers, rows }
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        Self::from_csv_reader(file).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (line, record) in csv_reader.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read CSV record {}", line + 1))?;
            // Short records are padded so every row lines up with the headers
            let row = (0..headers.len())
                .map(|i| record.get(i).map(Cell::infer).unwrap_or(Cell::Null))
                .collect();
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Create a table from a JSON array of objects. Columns are the union of
    /// keys in order of first appearance.
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        let mut headers: Vec<String> = Vec::new();
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;
            for key in obj.keys() {
                let key = key.trim();
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.to_string());
                }
            }
        }

        let mut rows = Vec::with_capacity(array.len());
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;
            let mut row = vec![Cell::Null; headers.len()];
            for (key, val) in obj {
                if let Some(idx) = headers.iter().position(|h| h == key.trim()) {
                    row[idx] = Cell::from_json(val, key)?;
                }
            }
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Return a new table holding only the rows for which `keep` is true.
    pub fn filter_rows<F>(&self, keep: F) -> RawTable
    where
        F: Fn(&[Cell]) -> bool,
    {
        RawTable {
            headers: self.headers.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_infer_cells() {
        assert_eq!(Cell::infer("2010"), Cell::Number(2010.0));
        assert_eq!(Cell::infer(" 3.5 "), Cell::Number(3.5));
        assert_eq!(Cell::infer(""), Cell::Null);
        assert_eq!(Cell::infer("NaN"), Cell::Null);
        assert_eq!(Cell::infer("Goiânia"), Cell::Text("Goiânia".to_string()));
    }

    #[test]
    fn test_na_markers_and_non_finite_are_null() {
        for raw in ["NA", "null", "N/A", "None", " NULL ", "<NA>", "nan"] {
            assert_eq!(Cell::infer(raw), Cell::Null, "{}", raw);
        }
        for raw in ["inf", "-inf", "infinity", "Infinity"] {
            assert_eq!(Cell::infer(raw), Cell::Null, "{}", raw);
        }
        assert_eq!(Cell::infer("n/d"), Cell::Text("n/d".to_string()));
        assert_eq!(Cell::Number(f64::INFINITY).as_number(), None);
        assert_eq!(Cell::Text("inf".to_string()).as_number(), None);
    }

    #[test]
    fn test_csv_null_markers() {
        let csv = "nome,tx\nCityA,5\nNA,7\nnull,3\nCityB,inf\n";
        let table = RawTable::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.rows[1][0], Cell::Null);
        assert_eq!(table.rows[2][0], Cell::Null);
        assert_eq!(table.rows[3][1], Cell::Null);
    }

    #[test]
    fn test_text_coercion_of_integral_numbers() {
        assert_eq!(Cell::Number(2010.0).as_text(), Some("2010".to_string()));
        assert_eq!(Cell::Number(2.5).as_text(), Some("2.5".to_string()));
        assert_eq!(Cell::Null.as_text(), None);
        assert_eq!(number_to_json(2010.0), json!(2010));
    }

    #[test]
    fn test_csv_headers_are_trimmed() {
        let csv = "ano ,  faixa,val \n2010,0-4,10\n2011,5-9\n";
        let table = RawTable::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["ano", "faixa", "val"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][2], Cell::Number(10.0));
        // short record padded with Null
        assert_eq!(table.rows[1][2], Cell::Null);
    }

    #[test]
    fn test_from_json_union_of_keys() {
        let value = json!([
            {"ano": 2010, "val": "10"},
            {"ano": 2011, "faixa": "0-4", "val": null}
        ]);
        let table = RawTable::from_json(&value).unwrap();
        assert_eq!(table.headers, vec!["ano", "val", "faixa"]);
        assert_eq!(table.rows[0][2], Cell::Null);
        assert_eq!(table.rows[1][1], Cell::Null);
        assert_eq!(table.rows[0][1], Cell::Number(10.0));
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        assert!(RawTable::from_json(&json!({"ano": 2010})).is_err());
    }

    #[test]
    fn test_filter_rows_returns_new_table() {
        let table = RawTable::from_json(&json!([{"a": 1}, {"a": 2}])).unwrap();
        let filtered = table.filter_rows(|row| row[0] == Cell::Number(2.0));
        assert_eq!(filtered.len(), 1);
        assert_eq!(table.len(), 2);
    }
}

//! Dataset ingestion: CSV and JSON
//!
//! Both paths collect raw string values per column, infer each column's
//! type from the full column, then coerce (numbers parsed, dates
//! standardized). Parsing builds a fresh dataset; a failed parse never
//! touches existing data, so callers can replace atomically on success.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{ChartError, ChartResult};
use crate::infer::{infer_column_type, standardize_date};
use crate::types::{ColumnDef, ColumnType, Dataset, Row, Value};

/// Parse CSV text: first line is headers (trimmed, blank headers dropped
/// along with their value positions), subsequent lines align positionally.
/// Rows with zero populated fields are dropped.
pub fn parse_csv(text: &str) -> ChartResult<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    // (position in the record, header name) for non-blank headers
    let kept: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.trim().is_empty())
        .map(|(pos, name)| (pos, name.trim().to_string()))
        .collect();

    if kept.is_empty() {
        return Err(ChartError::InvalidFileFormat(
            "CSV is missing a header row".to_string(),
        ));
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        let raw: Vec<String> = kept
            .iter()
            .map(|(pos, _)| record.get(*pos).unwrap_or("").trim().to_string())
            .collect();
        if raw.iter().any(|v| !v.is_empty()) {
            raw_rows.push(raw);
        }
    }

    let header_names: Vec<String> = kept.into_iter().map(|(_, name)| name).collect();
    let dataset = build_dataset(header_names, raw_rows);
    debug!(
        columns = dataset.columns.len(),
        rows = dataset.rows.len(),
        "ingested CSV"
    );
    Ok(dataset)
}

/// Parse JSON text: a top-level array of flat objects. Columns are the
/// keys of the first object, in object order; types are inferred from the
/// full column across all rows.
pub fn parse_json(text: &str) -> ChartResult<Dataset> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| ChartError::InvalidFileFormat(format!("invalid JSON: {}", e)))?;

    let array = value.as_array().ok_or_else(|| {
        ChartError::InvalidFileFormat("expected a top-level JSON array of objects".to_string())
    })?;

    let Some(first) = array.first() else {
        return Ok(Dataset::default());
    };
    let first = first.as_object().ok_or_else(|| {
        ChartError::InvalidFileFormat("expected an array of JSON objects".to_string())
    })?;
    let header_names: Vec<String> = first.keys().cloned().collect();

    let mut raw_rows: Vec<Vec<String>> = Vec::with_capacity(array.len());
    for item in array {
        let obj = item.as_object().ok_or_else(|| {
            ChartError::InvalidFileFormat("expected an array of JSON objects".to_string())
        })?;
        let raw: Vec<String> = header_names
            .iter()
            .map(|name| scalar_string(obj.get(name)))
            .collect::<ChartResult<_>>()?;
        raw_rows.push(raw);
    }

    let dataset = build_dataset(header_names, raw_rows);
    debug!(
        columns = dataset.columns.len(),
        rows = dataset.rows.len(),
        "ingested JSON"
    );
    Ok(dataset)
}

/// Stringify one scalar JSON value for type inference. Nested arrays and
/// objects are rejected: rows must be flat.
fn scalar_string(value: Option<&serde_json::Value>) -> ChartResult<String> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(String::new()),
        Some(serde_json::Value::Bool(b)) => Ok(b.to_string()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ChartError::InvalidFileFormat(format!(
            "expected flat objects, found nested value: {}",
            other
        ))),
    }
}

/// Infer each column's type from its full raw column, then coerce values
fn build_dataset(header_names: Vec<String>, raw_rows: Vec<Vec<String>>) -> Dataset {
    let mut columns = Vec::with_capacity(header_names.len());
    for (index, name) in header_names.iter().enumerate() {
        let column: Vec<&str> = raw_rows.iter().map(|row| row[index].as_str()).collect();
        let column_type = infer_column_type(&column);
        columns.push(ColumnDef::new(name.clone(), column_type));
    }

    let rows: Vec<Row> = raw_rows
        .into_iter()
        .map(|raw| {
            columns
                .iter()
                .zip(raw)
                .map(|(col, value)| (col.key.clone(), coerce(&value, col.column_type)))
                .collect()
        })
        .collect();

    Dataset::new(columns, rows)
}

/// Coerce a raw string into the column's inferred type. Values that do not
/// fit the column type are kept as they are (text), never dropped.
fn coerce(raw: &str, column_type: ColumnType) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Empty;
    }
    match column_type {
        ColumnType::Number => trimmed
            .parse::<f64>()
            .map(Value::Number)
            .unwrap_or_else(|_| Value::Text(trimmed.to_string())),
        // standardize_date keeps unparseable input unchanged
        ColumnType::Date => Value::Date(standardize_date(trimmed)),
        ColumnType::Text => Value::Text(trimmed.to_string()),
    }
}

/// Read a dataset from a .csv or .json file
pub fn read_dataset(path: &Path) -> ChartResult<Dataset> {
    let text = fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => parse_csv(&text),
        Some("json") => parse_json(&text),
        other => Err(ChartError::InvalidFileFormat(format!(
            "unsupported file extension: {:?} (expected .csv or .json)",
            other.unwrap_or("none")
        ))),
    }
}

/// Serialize a dataset as a JSON array of row objects, in column order.
/// Non-finite numbers (a division by zero in a formula column) serialize
/// as null.
pub fn dataset_to_json(dataset: &Dataset) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = dataset
        .rows
        .iter()
        .map(|row| {
            let mut obj = serde_json::Map::new();
            for col in &dataset.columns {
                let value = match row.get(&col.key).unwrap_or(&Value::Empty) {
                    Value::Number(n) => serde_json::Number::from_f64(*n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null),
                    Value::Text(s) => serde_json::Value::String(s.clone()),
                    Value::Date(s) => serde_json::Value::String(s.clone()),
                    Value::Empty => serde_json::Value::Null,
                };
                obj.insert(col.key.clone(), value);
            }
            serde_json::Value::Object(obj)
        })
        .collect();
    serde_json::Value::Array(rows)
}

/// Write a dataset to disk as pretty-printed JSON rows
pub fn write_dataset_json(dataset: &Dataset, path: &Path) -> ChartResult<()> {
    let json = serde_json::to_string_pretty(&dataset_to_json(dataset))?;
    fs::write(path, json)?;
    Ok(())
}

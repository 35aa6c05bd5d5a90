//! Group-by aggregation and axis sorting
//!
//! Buckets rows by a chosen column (optionally date-bucketed), reduces
//! each numeric column per bucket, and optionally orders the result by the
//! axis column. Grouping is a full recompute over the current rows; it is
//! not incrementally maintained.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::error::{ChartError, ChartResult};
use crate::infer::parse_flexible_date;
use crate::types::{
    Aggregation, ColumnDef, ColumnType, Dataset, DateGranularity, GroupByConfig, Row, SortMode,
    Value,
};

impl Aggregation {
    /// Reduce a bucket of numeric values. An empty bucket reduces to 0,
    /// including for count (count is of valid numeric values, not rows).
    pub fn reduce(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        match self {
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Average => values.iter().sum::<f64>() / values.len() as f64,
            Aggregation::Count => values.len() as f64,
            Aggregation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Compute a row's group key. Date bucketing uses the shared date parser;
/// values that do not parse fall back to the raw stringified value.
fn group_key(value: Option<&Value>, granularity: DateGranularity) -> String {
    let raw = value.map(Value::to_display_string).unwrap_or_default();
    if granularity == DateGranularity::None {
        return raw;
    }
    match parse_flexible_date(&raw) {
        Some(date) => {
            use chrono::Datelike;
            match granularity {
                DateGranularity::Year => format!("{:04}", date.year()),
                DateGranularity::Month => format!("{:04}-{:02}", date.year(), date.month()),
                DateGranularity::Day => date.format("%Y-%m-%d").to_string(),
                DateGranularity::Quarter => {
                    format!("{:04}-Q{}", date.year(), date.month0() / 3 + 1)
                }
                DateGranularity::None => raw,
            }
        }
        None => raw,
    }
}

/// Group rows by the configured column and reduce every numeric column
/// (other than the grouping column) with the configured aggregation.
/// Buckets preserve first-seen order of distinct keys; the output has one
/// row per distinct key.
pub fn group_rows(
    rows: &[Row],
    config: &GroupByConfig,
    columns: &[ColumnDef],
) -> ChartResult<Vec<Row>> {
    if !columns.iter().any(|c| c.key == config.column) {
        return Err(ChartError::UnknownColumn(config.column.clone()));
    }

    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<&Row>> = HashMap::new();

    for row in rows {
        let key = group_key(row.get(&config.column), config.date_format);
        if !buckets.contains_key(&key) {
            order.push(key.clone());
        }
        buckets.entry(key).or_default().push(row);
    }

    let numeric_columns: Vec<&ColumnDef> = columns
        .iter()
        .filter(|c| c.column_type == ColumnType::Number && c.key != config.column)
        .collect();

    let mut result = Vec::with_capacity(order.len());
    for key in order {
        let bucket = &buckets[&key];
        let mut out = Row::new();
        out.insert(config.column.clone(), Value::Text(key));

        for col in &numeric_columns {
            let numbers: Vec<f64> = bucket
                .iter()
                .filter_map(|row| row.get(&col.key).and_then(Value::as_number))
                .collect();
            out.insert(
                col.key.clone(),
                Value::Number(config.aggregation.reduce(&numbers)),
            );
        }

        result.push(out);
    }

    debug!(
        column = %config.column,
        buckets = result.len(),
        input_rows = rows.len(),
        "grouped rows"
    );
    Ok(result)
}

/// Column metadata for the grouped result: the grouping column (now
/// holding text group keys) followed by the reduced numeric columns.
pub fn grouped_columns(config: &GroupByConfig, columns: &[ColumnDef]) -> Vec<ColumnDef> {
    let mut result = Vec::new();
    for col in columns {
        if col.key == config.column {
            let mut def = col.clone();
            def.column_type = ColumnType::Text;
            result.push(def);
        } else if col.column_type == ColumnType::Number {
            result.push(col.clone());
        }
    }
    result
}

/// Order rows by the axis column.
///
/// Asc/desc compare numerically when both cells hold numbers, otherwise
/// lexicographically. Chronological parses both sides as dates and leaves
/// a pair unordered when either side fails to parse.
pub fn sort_rows(rows: &mut [Row], axis_key: &str, mode: SortMode) {
    if mode == SortMode::None {
        return;
    }

    rows.sort_by(|a, b| {
        let left = a.get(axis_key).unwrap_or(&Value::Empty);
        let right = b.get(axis_key).unwrap_or(&Value::Empty);
        match mode {
            SortMode::Asc => compare_values(left, right),
            SortMode::Desc => compare_values(left, right).reverse(),
            SortMode::Chronological => compare_chronological(left, right),
            SortMode::None => Ordering::Equal,
        }
    });
}

fn compare_values(left: &Value, right: &Value) -> Ordering {
    if let (Value::Number(l), Value::Number(r)) = (left, right) {
        return l.partial_cmp(r).unwrap_or(Ordering::Equal);
    }
    left.to_display_string().cmp(&right.to_display_string())
}

fn compare_chronological(left: &Value, right: &Value) -> Ordering {
    match (
        parse_flexible_date(&left.to_display_string()),
        parse_flexible_date(&right.to_display_string()),
    ) {
        (Some(l), Some(r)) => l.cmp(&r),
        // Unparseable on either side: treat the pair as unordered
        _ => Ordering::Equal,
    }
}

/// Group an entire dataset and sort the result by its axis column,
/// producing a new dataset (the input is left untouched).
pub fn group_dataset(
    dataset: &Dataset,
    config: &GroupByConfig,
    sort: SortMode,
) -> ChartResult<Dataset> {
    let rows = group_rows(&dataset.rows, config, &dataset.columns)?;
    let columns = grouped_columns(config, &dataset.columns);
    let mut grouped = Dataset::new(columns, rows);
    if let Some(axis) = grouped.axis_column().map(|c| c.key.clone()) {
        sort_rows(&mut grouped.rows, &axis, sort);
    }
    Ok(grouped)
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ChartError, ChartResult};

//==============================================================================
// Cell values
//==============================================================================

/// A single cell value. Dates are kept as `YYYY-MM-DD` strings after
/// standardization so datasets round-trip through JSON unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A numeric value
    Number(f64),
    /// A text value
    Text(String),
    /// An ISO date string (YYYY-MM-DD)
    Date(String),
    /// Missing/empty cell (serializes as JSON null)
    Empty,
}

impl Value {
    /// Coerce to f64. Text is parsed; everything non-numeric is None.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Stringify for display and group keys. Whole numbers print without
    /// a trailing ".0" so group keys look like the original input.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Value::Text(s) => s.clone(),
            Value::Date(s) => s.clone(),
            Value::Empty => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }
}

/// One row of a dataset: column key -> value
pub type Row = HashMap<String, Value>;

//==============================================================================
// Column metadata
//==============================================================================

/// Column value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Number,
    Date,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Text => write!(f, "text"),
            ColumnType::Number => write!(f, "number"),
            ColumnType::Date => write!(f, "date"),
        }
    }
}

/// Column definition. `key` addresses cells in rows, `label` is what the
/// chart shows. At most one column should carry `is_axis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub key: String,
    pub label: String,
    pub column_type: ColumnType,
    #[serde(default)]
    pub is_axis: bool,
}

impl ColumnDef {
    pub fn new(key: impl Into<String>, column_type: ColumnType) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            column_type,
            is_axis: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn as_axis(mut self) -> Self {
        self.is_axis = true;
        self
    }
}

//==============================================================================
// Grouping and sorting configuration
//==============================================================================

/// How to reduce a bucket of numeric values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Average,
    Count,
    Min,
    Max,
}

/// Date bucketing granularity for group keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DateGranularity {
    None,
    Year,
    Quarter,
    Month,
    Day,
}

impl Default for DateGranularity {
    fn default() -> Self {
        DateGranularity::None
    }
}

/// Group-by configuration. Valid only when `column` names an existing
/// column of the dataset being grouped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupByConfig {
    pub column: String,
    pub aggregation: Aggregation,
    #[serde(default)]
    pub date_format: DateGranularity,
}

impl GroupByConfig {
    pub fn new(column: impl Into<String>, aggregation: Aggregation) -> Self {
        Self {
            column: column.into(),
            aggregation,
            date_format: DateGranularity::None,
        }
    }

    pub fn with_date_format(mut self, granularity: DateGranularity) -> Self {
        self.date_format = granularity;
        self
    }
}

/// Ordering applied to the axis column after grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    None,
    Asc,
    Desc,
    Chronological,
}

impl Default for SortMode {
    fn default() -> Self {
        SortMode::None
    }
}

//==============================================================================
// Dataset
//==============================================================================

/// An in-memory table: ordered column metadata plus an ordered row sequence.
/// Row order matters (it drives the chart axis), column order matters for
/// the axis-by-convention rule and for export.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Row>,
    /// Formula strings applied to whole columns, kept so a column rename
    /// can rewrite references (a stale reference would silently read as 0).
    column_formulas: HashMap<String, String>,
}

impl Dataset {
    pub fn new(columns: Vec<ColumnDef>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            column_formulas: HashMap::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column(&self, key: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// The axis column: the one marked `is_axis`, else the first column.
    pub fn axis_column(&self) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.is_axis)
            .or_else(|| self.columns.first())
    }

    pub fn add_column(&mut self, def: ColumnDef) {
        for row in &mut self.rows {
            row.entry(def.key.clone()).or_insert(Value::Empty);
        }
        self.columns.push(def);
    }

    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn delete_row(&mut self, index: usize) -> ChartResult<()> {
        if index >= self.rows.len() {
            return Err(ChartError::RowIndexOutOfRange(index));
        }
        self.rows.remove(index);
        Ok(())
    }

    pub fn delete_column(&mut self, key: &str) -> ChartResult<()> {
        if self.column(key).is_none() {
            return Err(ChartError::UnknownColumn(key.to_string()));
        }
        self.columns.retain(|c| c.key != key);
        self.column_formulas.remove(key);
        for row in &mut self.rows {
            row.remove(key);
        }
        Ok(())
    }

    pub fn set_cell(&mut self, row: usize, key: &str, value: Value) -> ChartResult<()> {
        if self.column(key).is_none() {
            return Err(ChartError::UnknownColumn(key.to_string()));
        }
        let row_map = self
            .rows
            .get_mut(row)
            .ok_or(ChartError::RowIndexOutOfRange(row))?;
        row_map.insert(key.to_string(), value);
        Ok(())
    }

    pub fn cell(&self, row: usize, key: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(key))
    }

    /// Rename a column. Rewrites the key in every row and every stored
    /// column formula that references the old key.
    pub fn rename_column(&mut self, old_key: &str, new_key: &str) -> ChartResult<()> {
        if self.column(old_key).is_none() {
            return Err(ChartError::UnknownColumn(old_key.to_string()));
        }
        for col in &mut self.columns {
            if col.key == old_key {
                col.key = new_key.to_string();
            }
        }
        for row in &mut self.rows {
            if let Some(value) = row.remove(old_key) {
                row.insert(new_key.to_string(), value);
            }
        }
        let rewritten: HashMap<String, String> = self
            .column_formulas
            .drain()
            .map(|(col, formula)| {
                let col = if col == old_key {
                    new_key.to_string()
                } else {
                    col
                };
                (col, crate::formula::rewrite_references(&formula, old_key, new_key))
            })
            .collect();
        self.column_formulas = rewritten;
        Ok(())
    }

    /// All values of one column, in row order
    pub fn column_values(&self, key: &str) -> Vec<&Value> {
        self.rows
            .iter()
            .map(|row| row.get(key).unwrap_or(&Value::Empty))
            .collect()
    }

    pub fn set_column_formula(&mut self, key: &str, formula: impl Into<String>) {
        self.column_formulas.insert(key.to_string(), formula.into());
    }

    pub fn column_formula(&self, key: &str) -> Option<&str> {
        self.column_formulas.get(key).map(String::as_str)
    }

    pub fn clear_column_formula(&mut self, key: &str) {
        self.column_formulas.remove(key);
    }

    /// Drop all rows, columns and formulas (full dataset replacement)
    pub fn clear(&mut self) {
        self.columns.clear();
        self.rows.clear();
        self.column_formulas.clear();
    }
}

//! Restricted formula language for chart datasets
//!
//! Formulas reference columns as `[name]`, call SUM/AVG/MIN/MAX over a
//! column, and combine them with `+ - * / ( )` and numeric literals.
//! Evaluation is a one-shot transformation: formulas are re-run on demand,
//! never tracked reactively.
//!
//! The public entry points follow a best-effort spreadsheet-cell policy:
//! [`evaluate`] never fails and returns 0 for any malformed input, while
//! [`try_evaluate`] surfaces the underlying error so a caller can show a
//! "formula error" to the user.

pub mod evaluator;
pub mod parser;
pub mod tokenizer;

use tracing::debug;

use crate::error::{ChartError, ChartResult};
use crate::types::{ColumnType, Dataset, Row, Value};
use evaluator::Evaluator;
use parser::Expr;

/// Parse a formula string into an AST
fn compile(formula: &str) -> ChartResult<Expr> {
    let tokens = tokenizer::tokenize(formula)
        .map_err(|e| ChartError::FormulaEvaluationFailed(e.to_string()))?;
    parser::parse(tokens).map_err(|e| ChartError::FormulaEvaluationFailed(e.to_string()))
}

/// Evaluate a formula against one row, with aggregates computed over the
/// full dataset. Returns an error for malformed formulas; the arithmetic
/// itself is total (missing columns read as 0, division by zero yields
/// infinity).
pub fn try_evaluate(formula: &str, current: &Row, rows: &[Row]) -> ChartResult<f64> {
    let ast = compile(formula)?;
    Ok(Evaluator::new(rows).evaluate(&ast, current))
}

/// Evaluate a formula, returning 0 on any malformed input. This is the
/// spreadsheet-cell contract: the caller never sees a failure here; use
/// [`try_evaluate`] when the error should reach the user.
pub fn evaluate(formula: &str, current: &Row, rows: &[Row]) -> f64 {
    match try_evaluate(formula, current, rows) {
        Ok(value) => value,
        Err(e) => {
            debug!(formula, error = %e, "formula evaluation failed, returning 0");
            0.0
        }
    }
}

/// Apply a formula to every row of a column, writing numeric results back
/// into the dataset and recording the formula on the column for rename
/// rewriting. Aggregates see the dataset as it was before the first write
/// (results are computed for all rows, then stored).
pub fn apply_column_formula(dataset: &mut Dataset, key: &str, formula: &str) -> ChartResult<()> {
    if dataset.column(key).is_none() {
        return Err(ChartError::UnknownColumn(key.to_string()));
    }
    let ast = compile(formula)?;

    let results: Vec<f64> = {
        let mut evaluator = Evaluator::new(&dataset.rows);
        dataset
            .rows
            .iter()
            .map(|row| evaluator.evaluate(&ast, row))
            .collect()
    };

    for (row, result) in dataset.rows.iter_mut().zip(results) {
        row.insert(key.to_string(), Value::Number(result));
    }
    for col in &mut dataset.columns {
        if col.key == key {
            col.column_type = ColumnType::Number;
        }
    }
    dataset.set_column_formula(key, formula);
    debug!(column = key, formula, "applied column formula");
    Ok(())
}

/// Apply a formula to a single cell, returning the computed value
pub fn apply_cell_formula(
    dataset: &mut Dataset,
    row: usize,
    key: &str,
    formula: &str,
) -> ChartResult<f64> {
    let ast = compile(formula)?;
    let value = {
        let current = dataset
            .rows
            .get(row)
            .ok_or(ChartError::RowIndexOutOfRange(row))?;
        Evaluator::new(&dataset.rows).evaluate(&ast, current)
    };
    dataset.set_cell(row, key, Value::Number(value))?;
    Ok(value)
}

/// Rewrite every `[old_key]` reference in a formula to `[new_key]`.
/// Used by column rename so stored formulas do not silently start reading
/// a missing column (which evaluates to 0).
pub fn rewrite_references(formula: &str, old_key: &str, new_key: &str) -> String {
    let mut result = String::with_capacity(formula.len());
    let mut chars = formula.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '[' {
            result.push(c);
            continue;
        }
        let mut inner = String::new();
        let mut terminated = false;
        for c in chars.by_ref() {
            if c == ']' {
                terminated = true;
                break;
            }
            inner.push(c);
        }
        if !terminated {
            // Malformed reference, keep the text as-is
            result.push('[');
            result.push_str(&inner);
            break;
        }
        if inner.trim() == old_key {
            result.push_str(&format!("[{}]", new_key));
        } else {
            result.push_str(&format!("[{}]", inner));
        }
    }

    result
}

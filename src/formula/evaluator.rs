//! Formula evaluator
//!
//! Evaluates a parsed AST against a current row and the full dataset.
//! Evaluation is total: missing or non-numeric column references read as 0,
//! and division by zero follows IEEE float semantics (infinity). All
//! failure modes live in tokenization/parsing.

use std::collections::HashMap;

use super::parser::{AggregateFn, BinOp, Expr};
use crate::types::{Row, Value};

/// Evaluator bound to one dataset. Aggregates are computed lazily and
/// cached, so each distinct (function, column) pair is reduced once even
/// when referenced multiple times or evaluated across every row.
pub struct Evaluator<'a> {
    rows: &'a [Row],
    aggregate_cache: HashMap<(AggregateFn, String), f64>,
}

impl<'a> Evaluator<'a> {
    pub fn new(rows: &'a [Row]) -> Self {
        Self {
            rows,
            aggregate_cache: HashMap::new(),
        }
    }

    /// Evaluate an expression against the current row
    pub fn evaluate(&mut self, expr: &Expr, current: &Row) -> f64 {
        match expr {
            Expr::Number(n) => *n,
            Expr::ColumnRef(column) => cell_number(current, column),
            Expr::Aggregate { func, column } => self.aggregate(*func, column),
            Expr::BinaryOp { op, left, right } => {
                let l = self.evaluate(left, current);
                let r = self.evaluate(right, current);
                match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => l / r,
                }
            }
            Expr::Negate(operand) => -self.evaluate(operand, current),
        }
    }

    /// Aggregate a column over the entire dataset, discarding non-numeric
    /// entries. An empty or fully non-numeric column reduces to 0.
    fn aggregate(&mut self, func: AggregateFn, column: &str) -> f64 {
        if let Some(&cached) = self.aggregate_cache.get(&(func, column.to_string())) {
            return cached;
        }

        let numbers: Vec<f64> = self
            .rows
            .iter()
            .filter_map(|row| row.get(column).and_then(Value::as_number))
            .collect();

        let result = if numbers.is_empty() {
            0.0
        } else {
            match func {
                AggregateFn::Sum => numbers.iter().sum(),
                AggregateFn::Avg => numbers.iter().sum::<f64>() / numbers.len() as f64,
                AggregateFn::Min => numbers.iter().copied().fold(f64::INFINITY, f64::min),
                AggregateFn::Max => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            }
        };

        self.aggregate_cache
            .insert((func, column.to_string()), result);
        result
    }
}

/// The current row's value for a column, coerced to a number.
/// Missing columns and non-numeric values read as 0.
fn cell_number(row: &Row, column: &str) -> f64 {
    row.get(column).and_then(Value::as_number).unwrap_or(0.0)
}

//! Formula language integration tests
//!
//! Covers the end-to-end evaluate path: tokenize, parse, evaluate against
//! rows, plus the total-function contract (malformed input reads as 0).

use pretty_assertions::assert_eq;

use chartable::error::ChartError;
use chartable::formula;
use chartable::types::{ColumnDef, ColumnType, Dataset, Row, Value};

fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn value_rows() -> Vec<Row> {
    vec![
        row(&[("value", Value::Number(5.0))]),
        row(&[("value", Value::Number(-2.0))]),
        row(&[("value", Value::Number(3.0))]),
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
// ROW-LEVEL EVALUATION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_column_reference_reads_current_row() {
    let rows = value_rows();
    assert_eq!(formula::evaluate("[value]", &rows[0], &rows), 5.0);
    assert_eq!(formula::evaluate("[value]", &rows[1], &rows), -2.0);
}

#[test]
fn test_arithmetic_on_reference() {
    let rows = value_rows();
    assert_eq!(formula::evaluate("[value] * 2", &rows[0], &rows), 10.0);
    assert_eq!(formula::evaluate("[value] + 1.5", &rows[2], &rows), 4.5);
}

#[test]
fn test_operator_precedence() {
    let rows = value_rows();
    assert_eq!(formula::evaluate("2 + 3 * 4", &rows[0], &rows), 14.0);
    assert_eq!(formula::evaluate("(2 + 3) * 4", &rows[0], &rows), 20.0);
    assert_eq!(formula::evaluate("10 - 4 - 3", &rows[0], &rows), 3.0);
}

#[test]
fn test_unary_negation() {
    let rows = value_rows();
    assert_eq!(formula::evaluate("-[value]", &rows[0], &rows), -5.0);
    assert_eq!(formula::evaluate("-(2 + 3)", &rows[0], &rows), -5.0);
}

#[test]
fn test_missing_column_reads_as_zero() {
    let rows = value_rows();
    assert_eq!(formula::evaluate("[missing] * 2", &rows[0], &rows), 0.0);
    assert_eq!(formula::evaluate("[value] + [missing]", &rows[0], &rows), 5.0);
}

#[test]
fn test_text_cell_coerces_when_numeric() {
    let rows = vec![row(&[("amount", Value::Text(" 42 ".to_string()))])];
    assert_eq!(formula::evaluate("[amount] + 1", &rows[0], &rows), 43.0);
}

#[test]
fn test_non_numeric_text_reads_as_zero() {
    let rows = vec![row(&[("amount", Value::Text("n/a".to_string()))])];
    assert_eq!(formula::evaluate("[amount] + 1", &rows[0], &rows), 1.0);
}

#[test]
fn test_division_by_zero_yields_infinity() {
    let rows = value_rows();
    let result = formula::evaluate("[value] / 0", &rows[0], &rows);
    assert!(result.is_infinite());
    assert!(result > 0.0);

    let negative = formula::evaluate("-[value] / 0", &rows[0], &rows);
    assert!(negative.is_infinite());
    assert!(negative < 0.0);
}

// ═══════════════════════════════════════════════════════════════════════════
// AGGREGATES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_sum_over_whole_dataset() {
    let rows = value_rows();
    // Aggregates ignore the current row: same result from any row
    assert_eq!(formula::evaluate("SUM([value])", &rows[0], &rows), 6.0);
    assert_eq!(formula::evaluate("SUM([value])", &rows[2], &rows), 6.0);
}

#[test]
fn test_avg_min_max() {
    let rows = value_rows();
    assert_eq!(formula::evaluate("AVG([value])", &rows[0], &rows), 2.0);
    assert_eq!(formula::evaluate("MIN([value])", &rows[0], &rows), -2.0);
    assert_eq!(formula::evaluate("MAX([value])", &rows[0], &rows), 5.0);
}

#[test]
fn test_aggregate_names_case_insensitive() {
    let rows = value_rows();
    assert_eq!(formula::evaluate("sum([value])", &rows[0], &rows), 6.0);
    assert_eq!(formula::evaluate("Avg([value])", &rows[0], &rows), 2.0);
}

#[test]
fn test_aggregate_skips_non_numeric_cells() {
    let rows = vec![
        row(&[("v", Value::Number(10.0))]),
        row(&[("v", Value::Text("oops".to_string()))]),
        row(&[("v", Value::Number(20.0))]),
    ];
    assert_eq!(formula::evaluate("SUM([v])", &rows[0], &rows), 30.0);
    assert_eq!(formula::evaluate("AVG([v])", &rows[0], &rows), 15.0);
}

#[test]
fn test_aggregate_over_empty_column_is_zero() {
    let rows = vec![row(&[("other", Value::Number(1.0))])];
    assert_eq!(formula::evaluate("SUM([v])", &rows[0], &rows), 0.0);
    assert_eq!(formula::evaluate("MIN([v])", &rows[0], &rows), 0.0);
    assert_eq!(formula::evaluate("MAX([v])", &rows[0], &rows), 0.0);
}

#[test]
fn test_aggregate_combined_with_arithmetic() {
    let rows = value_rows();
    assert_eq!(formula::evaluate("SUM([value]) / 3", &rows[0], &rows), 2.0);
    assert_eq!(
        formula::evaluate("[value] / SUM([value])", &rows[0], &rows),
        5.0 / 6.0
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// MALFORMED INPUT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_evaluate_returns_zero_for_malformed_input() {
    let rows = value_rows();
    assert_eq!(formula::evaluate("", &rows[0], &rows), 0.0);
    assert_eq!(formula::evaluate("[value] +", &rows[0], &rows), 0.0);
    assert_eq!(formula::evaluate("((1)", &rows[0], &rows), 0.0);
    assert_eq!(formula::evaluate("[unterminated", &rows[0], &rows), 0.0);
}

#[test]
fn test_code_injection_is_a_parse_error_not_code() {
    let rows = value_rows();
    // Unknown identifiers never reach any host evaluation
    assert_eq!(formula::evaluate("1 + alert(1)", &rows[0], &rows), 0.0);
    assert_eq!(
        formula::evaluate("process.exit(); [value]", &rows[0], &rows),
        0.0
    );
}

#[test]
fn test_try_evaluate_surfaces_the_error() {
    let rows = value_rows();
    let err = formula::try_evaluate("1 +", &rows[0], &rows).unwrap_err();
    assert!(matches!(err, ChartError::FormulaEvaluationFailed(_)));

    let err = formula::try_evaluate("COUNT([value])", &rows[0], &rows).unwrap_err();
    assert!(err.to_string().contains("Formula evaluation failed"));
}

#[test]
fn test_try_evaluate_ok_on_valid_input() {
    let rows = value_rows();
    assert_eq!(formula::try_evaluate("[value] * 2", &rows[0], &rows).unwrap(), 10.0);
}

// ═══════════════════════════════════════════════════════════════════════════
// COLUMN APPLICATION
// ═══════════════════════════════════════════════════════════════════════════

fn sales_dataset() -> Dataset {
    let columns = vec![
        ColumnDef::new("price", ColumnType::Number),
        ColumnDef::new("quantity", ColumnType::Number),
        ColumnDef::new("total", ColumnType::Text),
    ];
    let rows = vec![
        row(&[
            ("price", Value::Number(10.0)),
            ("quantity", Value::Number(3.0)),
            ("total", Value::Empty),
        ]),
        row(&[
            ("price", Value::Number(4.0)),
            ("quantity", Value::Number(5.0)),
            ("total", Value::Empty),
        ]),
    ];
    Dataset::new(columns, rows)
}

#[test]
fn test_apply_column_formula_writes_every_row() {
    let mut dataset = sales_dataset();
    formula::apply_column_formula(&mut dataset, "total", "[price] * [quantity]").unwrap();

    assert_eq!(dataset.cell(0, "total"), Some(&Value::Number(30.0)));
    assert_eq!(dataset.cell(1, "total"), Some(&Value::Number(20.0)));
    assert_eq!(dataset.column("total").unwrap().column_type, ColumnType::Number);
    assert_eq!(dataset.column_formula("total"), Some("[price] * [quantity]"));
}

#[test]
fn test_apply_column_formula_aggregates_see_prior_state() {
    let mut dataset = sales_dataset();
    // If results were written row by row, the second row's SUM would see
    // the first row's new value
    formula::apply_column_formula(&mut dataset, "price", "SUM([price])").unwrap();
    assert_eq!(dataset.cell(0, "price"), Some(&Value::Number(14.0)));
    assert_eq!(dataset.cell(1, "price"), Some(&Value::Number(14.0)));
}

#[test]
fn test_apply_column_formula_unknown_column() {
    let mut dataset = sales_dataset();
    let err = formula::apply_column_formula(&mut dataset, "nope", "[price]").unwrap_err();
    assert!(matches!(err, ChartError::UnknownColumn(_)));
}

#[test]
fn test_apply_column_formula_rejects_malformed_formula() {
    let mut dataset = sales_dataset();
    let err = formula::apply_column_formula(&mut dataset, "total", "[price] *").unwrap_err();
    assert!(matches!(err, ChartError::FormulaEvaluationFailed(_)));
    // Nothing written on failure
    assert_eq!(dataset.cell(0, "total"), Some(&Value::Empty));
}

#[test]
fn test_apply_cell_formula() {
    let mut dataset = sales_dataset();
    let value = formula::apply_cell_formula(&mut dataset, 1, "total", "AVG([price])").unwrap();
    assert_eq!(value, 7.0);
    assert_eq!(dataset.cell(1, "total"), Some(&Value::Number(7.0)));
    // One-shot: cell formulas are not recorded on the column
    assert_eq!(dataset.column_formula("total"), None);
}

#[test]
fn test_apply_cell_formula_row_out_of_range() {
    let mut dataset = sales_dataset();
    let err = formula::apply_cell_formula(&mut dataset, 99, "total", "1").unwrap_err();
    assert!(matches!(err, ChartError::RowIndexOutOfRange(99)));
}

// ═══════════════════════════════════════════════════════════════════════════
// REFERENCE REWRITING
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_rewrite_references() {
    assert_eq!(
        formula::rewrite_references("[price] * [quantity]", "price", "unit_price"),
        "[unit_price] * [quantity]"
    );
    assert_eq!(
        formula::rewrite_references("SUM([price]) / [price]", "price", "p"),
        "SUM([p]) / [p]"
    );
}

#[test]
fn test_rewrite_references_leaves_other_columns_alone() {
    assert_eq!(
        formula::rewrite_references("[prices] + [price]", "price", "p"),
        "[prices] + [p]"
    );
}

#[test]
fn test_rename_column_rewrites_stored_formulas() {
    let mut dataset = sales_dataset();
    formula::apply_column_formula(&mut dataset, "total", "[price] * [quantity]").unwrap();

    dataset.rename_column("price", "unit_price").unwrap();

    assert_eq!(
        dataset.column_formula("total"),
        Some("[unit_price] * [quantity]")
    );
    assert_eq!(dataset.cell(0, "unit_price"), Some(&Value::Number(10.0)));
    assert_eq!(dataset.cell(0, "price"), None);
}

//! Undo snapshot tests
//!
//! Expiry tests shrink the window instead of sleeping 30 seconds.

use pretty_assertions::assert_eq;
use std::thread::sleep;
use std::time::Duration;

use chartable::error::ChartError;
use chartable::formula;
use chartable::types::{ColumnDef, ColumnType, Dataset, Row, Value};
use chartable::undo::{UndoSnapshot, UNDO_WINDOW};

fn dataset() -> Dataset {
    let columns = vec![
        ColumnDef::new("price", ColumnType::Number),
        ColumnDef::new("quantity", ColumnType::Number),
    ];
    let rows = vec![
        Row::from([
            ("price".to_string(), Value::Number(10.0)),
            ("quantity".to_string(), Value::Number(3.0)),
        ]),
        Row::from([
            ("price".to_string(), Value::Number(4.0)),
            ("quantity".to_string(), Value::Number(5.0)),
        ]),
    ];
    Dataset::new(columns, rows)
}

#[test]
fn test_default_window_is_thirty_seconds() {
    assert_eq!(UNDO_WINDOW, Duration::from_secs(30));
}

#[test]
fn test_restore_column_within_window() {
    let mut dataset = dataset();
    let snapshot = UndoSnapshot::capture_column(&dataset, "price").unwrap();

    formula::apply_column_formula(&mut dataset, "price", "[price] * 2").unwrap();
    assert_eq!(dataset.cell(0, "price"), Some(&Value::Number(20.0)));

    snapshot.restore(&mut dataset).unwrap();
    assert_eq!(dataset.cell(0, "price"), Some(&Value::Number(10.0)));
    assert_eq!(dataset.cell(1, "price"), Some(&Value::Number(4.0)));
}

#[test]
fn test_restore_clears_formula_applied_after_capture() {
    let mut dataset = dataset();
    let snapshot = UndoSnapshot::capture_column(&dataset, "price").unwrap();

    formula::apply_column_formula(&mut dataset, "price", "[quantity] * 100").unwrap();
    assert_eq!(dataset.column_formula("price"), Some("[quantity] * 100"));

    snapshot.restore(&mut dataset).unwrap();
    // No formula existed at capture time, so none survives the restore
    assert_eq!(dataset.column_formula("price"), None);
}

#[test]
fn test_restore_reinstates_prior_formula() {
    let mut dataset = dataset();
    formula::apply_column_formula(&mut dataset, "price", "[quantity] + 1").unwrap();

    let snapshot = UndoSnapshot::capture_column(&dataset, "price").unwrap();
    formula::apply_column_formula(&mut dataset, "price", "[quantity] * 2").unwrap();

    snapshot.restore(&mut dataset).unwrap();
    assert_eq!(dataset.column_formula("price"), Some("[quantity] + 1"));
    assert_eq!(dataset.cell(0, "price"), Some(&Value::Number(4.0)));
}

#[test]
fn test_restore_column_type() {
    let columns = vec![ColumnDef::new("label", ColumnType::Text)];
    let rows = vec![Row::from([(
        "label".to_string(),
        Value::Text("alpha".to_string()),
    )])];
    let mut dataset = Dataset::new(columns, rows);

    let snapshot = UndoSnapshot::capture_column(&dataset, "label").unwrap();
    formula::apply_column_formula(&mut dataset, "label", "1 + 1").unwrap();
    assert_eq!(dataset.column("label").unwrap().column_type, ColumnType::Number);

    snapshot.restore(&mut dataset).unwrap();
    assert_eq!(dataset.column("label").unwrap().column_type, ColumnType::Text);
    assert_eq!(
        dataset.cell(0, "label"),
        Some(&Value::Text("alpha".to_string()))
    );
}

#[test]
fn test_restore_single_cell() {
    let mut dataset = dataset();
    let snapshot = UndoSnapshot::capture_cell(&dataset, 1, "quantity").unwrap();

    dataset.set_cell(1, "quantity", Value::Number(99.0)).unwrap();
    snapshot.restore(&mut dataset).unwrap();

    assert_eq!(dataset.cell(1, "quantity"), Some(&Value::Number(5.0)));
    // Other cells untouched
    assert_eq!(dataset.cell(0, "quantity"), Some(&Value::Number(3.0)));
}

#[test]
fn test_expired_snapshot_is_refused() {
    let mut dataset = dataset();
    let snapshot = UndoSnapshot::capture_column(&dataset, "price")
        .unwrap()
        .with_window(Duration::ZERO);

    formula::apply_column_formula(&mut dataset, "price", "[price] * 2").unwrap();
    sleep(Duration::from_millis(5));

    let err = snapshot.restore(&mut dataset).unwrap_err();
    assert!(matches!(err, ChartError::UndoExpired { .. }));
    assert!(err.to_string().contains("Undo expired"));

    // Refusal means the dataset keeps its new values
    assert_eq!(dataset.cell(0, "price"), Some(&Value::Number(20.0)));
}

#[test]
fn test_is_expired() {
    let dataset = dataset();

    let fresh = UndoSnapshot::capture_column(&dataset, "price").unwrap();
    assert!(!fresh.is_expired());

    let expired = UndoSnapshot::capture_column(&dataset, "price")
        .unwrap()
        .with_window(Duration::ZERO);
    sleep(Duration::from_millis(5));
    assert!(expired.is_expired());
}

#[test]
fn test_capture_unknown_column() {
    let dataset = dataset();
    let err = UndoSnapshot::capture_column(&dataset, "nope").unwrap_err();
    assert!(matches!(err, ChartError::UnknownColumn(_)));
}

#[test]
fn test_capture_cell_out_of_range() {
    let dataset = dataset();
    let err = UndoSnapshot::capture_cell(&dataset, 42, "price").unwrap_err();
    assert!(matches!(err, ChartError::RowIndexOutOfRange(42)));
}

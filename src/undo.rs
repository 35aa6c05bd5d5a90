//! Undo snapshots for formula application
//!
//! Callers snapshot a cell's or a column's prior state before applying a
//! formula and may restore it within a fixed 30-second window. After the
//! window the snapshot is expired and restoration is refused with
//! [`ChartError::UndoExpired`] - never a silent no-op. The window is a
//! wall-clock check, not a scheduled task.

use std::time::{Duration, Instant};

use crate::error::{ChartError, ChartResult};
use crate::types::{ColumnType, Dataset, Value};

/// How long a snapshot stays restorable
pub const UNDO_WINDOW: Duration = Duration::from_secs(30);

/// Prior metadata of a column whose values were snapshotted
#[derive(Debug, Clone)]
struct ColumnMeta {
    key: String,
    column_type: ColumnType,
    formula: Option<String>,
}

/// A point-in-time copy of cell values (and, for column snapshots, the
/// column's type and stored formula), restorable within the undo window.
#[derive(Debug, Clone)]
pub struct UndoSnapshot {
    cells: Vec<(usize, String, Value)>,
    column_meta: Option<ColumnMeta>,
    taken_at: Instant,
    window: Duration,
}

impl UndoSnapshot {
    /// Snapshot every cell of one column, plus its type and formula
    pub fn capture_column(dataset: &Dataset, key: &str) -> ChartResult<Self> {
        let col = dataset
            .column(key)
            .ok_or_else(|| ChartError::UnknownColumn(key.to_string()))?;
        let column_meta = Some(ColumnMeta {
            key: key.to_string(),
            column_type: col.column_type,
            formula: dataset.column_formula(key).map(String::from),
        });
        let cells = dataset
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                (
                    index,
                    key.to_string(),
                    row.get(key).cloned().unwrap_or(Value::Empty),
                )
            })
            .collect();
        Ok(Self {
            cells,
            column_meta,
            taken_at: Instant::now(),
            window: UNDO_WINDOW,
        })
    }

    /// Snapshot a single cell
    pub fn capture_cell(dataset: &Dataset, row: usize, key: &str) -> ChartResult<Self> {
        if dataset.column(key).is_none() {
            return Err(ChartError::UnknownColumn(key.to_string()));
        }
        let value = dataset
            .rows
            .get(row)
            .ok_or(ChartError::RowIndexOutOfRange(row))?
            .get(key)
            .cloned()
            .unwrap_or(Value::Empty);
        Ok(Self {
            cells: vec![(row, key.to_string(), value)],
            column_meta: None,
            taken_at: Instant::now(),
            window: UNDO_WINDOW,
        })
    }

    /// Override the expiry window (tests shrink it instead of waiting 30s)
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.taken_at.elapsed()
    }

    pub fn is_expired(&self) -> bool {
        self.taken_at.elapsed() > self.window
    }

    /// Restore the snapshotted values into the dataset. Refused with
    /// [`ChartError::UndoExpired`] once the window has passed.
    pub fn restore(&self, dataset: &mut Dataset) -> ChartResult<()> {
        if self.is_expired() {
            return Err(ChartError::UndoExpired {
                elapsed_secs: self.elapsed().as_secs(),
                window_secs: self.window.as_secs(),
            });
        }

        for (row, key, value) in &self.cells {
            dataset.set_cell(*row, key, value.clone())?;
        }

        if let Some(meta) = &self.column_meta {
            for col in &mut dataset.columns {
                if col.key == meta.key {
                    col.column_type = meta.column_type;
                }
            }
            match &meta.formula {
                Some(formula) => dataset.set_column_formula(&meta.key, formula.clone()),
                None => dataset.clear_column_formula(&meta.key),
            }
        }

        Ok(())
    }
}

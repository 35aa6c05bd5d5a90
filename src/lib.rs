//! Chartable - tabular data engine for chart building
//!
//! This library ingests tabular data (CSV or JSON), infers per-column
//! types, evaluates restricted spreadsheet-style formulas, and groups and
//! aggregates rows for a chart axis.
//!
//! # Features
//!
//! - Column type inference (text, number, date) with date standardization
//! - Restricted formula language: `[column]` references, SUM/AVG/MIN/MAX
//!   aggregates, `+ - * / ( )` arithmetic (parsed, never host-evaluated)
//! - Group-by aggregation with date bucketing (year/quarter/month/day)
//! - Axis sorting (numeric, lexicographic, chronological)
//! - Time-limited undo snapshots for formula application
//! - Versioned, file-backed saved-chart store with change notification
//!
//! # Example
//!
//! ```
//! use chartable::{formula, group, ingest};
//! use chartable::types::{Aggregation, GroupByConfig, SortMode};
//!
//! let dataset = ingest::parse_csv("month,revenue\n2024-01-05,100\n2024-02-10,250")?;
//!
//! let doubled = formula::evaluate("[revenue] * 2", &dataset.rows[0], &dataset.rows);
//! assert_eq!(doubled, 200.0);
//!
//! let config = GroupByConfig::new("month", Aggregation::Sum);
//! let grouped = group::group_dataset(&dataset, &config, SortMode::Chronological)?;
//! assert_eq!(grouped.rows.len(), 2);
//! # Ok::<(), chartable::ChartError>(())
//! ```

pub mod cli;
pub mod error;
pub mod formula;
pub mod group;
pub mod infer;
pub mod ingest;
pub mod store;
pub mod types;
pub mod undo;

// Re-export commonly used types
pub use error::{ChartError, ChartResult};
pub use types::{
    Aggregation, ColumnDef, ColumnType, Dataset, DateGranularity, GroupByConfig, Row, SortMode,
    Value,
};

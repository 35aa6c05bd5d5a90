//! Column type inference and date standardization
//!
//! Decides per-column whether raw values are text, numbers or dates, and
//! normalizes date strings to `YYYY-MM-DD`. Inference is best-effort and
//! never fails: anything ambiguous falls back to text.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

use crate::types::ColumnType;

/// Fraction of valid values that must look like dates for a column to be
/// classified as a date column. Deliberately low: date columns often carry
/// a minority of malformed entries.
const DATE_FRACTION: f64 = 0.3;

/// Fraction of valid values that must parse as numbers for a column to be
/// classified as numeric.
const NUMBER_FRACTION: f64 = 0.7;

/// Recognized date shapes paired with their chrono format. The shape regex
/// gates the parse (chrono alone would accept "01-02-03" as `%d-%m-%Y` with
/// year 3), and the parse gates the shape ("13.13.99" matches the European
/// pattern but is not a date). Order matters: ISO first, then US, then
/// European, matching the standardization precedence.
const DATE_SHAPES: &[(&str, &str)] = &[
    (r"^\d{4}-\d{1,2}-\d{1,2}$", "%Y-%m-%d"),   // ISO YYYY-MM-DD
    (r"^\d{4}/\d{1,2}/\d{1,2}$", "%Y/%m/%d"),   // YYYY/MM/DD
    (r"^\d{4}\.\d{1,2}\.\d{1,2}$", "%Y.%m.%d"), // YYYY.MM.DD
    (r"^\d{1,2}/\d{1,2}/\d{4}$", "%m/%d/%Y"),   // US MM/DD/YYYY
    (r"^\d{1,2}/\d{1,2}/\d{2}$", "%m/%d/%y"),   // US MM/DD/YY
    (r"^\d{1,2}\.\d{1,2}\.\d{4}$", "%d.%m.%Y"), // European DD.MM.YYYY
    (r"^\d{1,2}\.\d{1,2}\.\d{2}$", "%d.%m.%y"), // European DD.MM.YY
    (r"^\d{1,2}-\d{1,2}-\d{4}$", "%d-%m-%Y"),   // European DD-MM-YYYY (4-digit year required)
];

fn compiled_shapes() -> &'static [(Regex, &'static str)] {
    static SHAPES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    SHAPES.get_or_init(|| {
        // Fixed literal patterns; one failing to compile is skipped rather
        // than failing inference.
        DATE_SHAPES
            .iter()
            .filter_map(|(pattern, format)| Regex::new(pattern).ok().map(|re| (re, *format)))
            .collect()
    })
}

/// Parse a date string against the recognized shapes, first match wins.
/// This is the single date-detection routine used by inference, group-by
/// bucketing and chronological sorting.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    compiled_shapes().iter().find_map(|(shape, format)| {
        if shape.is_match(s) {
            NaiveDate::parse_from_str(s, format).ok()
        } else {
            None
        }
    })
}

fn is_numeric_value(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok()
}

/// Infer the type of one column from its raw values.
///
/// Dates are checked before numbers so numeric-looking date fragments
/// cannot drag a date column into being numeric. Thresholds tolerate a
/// minority of malformed or missing entries.
pub fn infer_column_type<S: AsRef<str>>(values: &[S]) -> ColumnType {
    let valid: Vec<&str> = values
        .iter()
        .map(|v| v.as_ref().trim())
        .filter(|v| !v.is_empty())
        .collect();

    if valid.is_empty() {
        return ColumnType::Text;
    }

    let total = valid.len() as f64;

    let date_count = valid
        .iter()
        .filter(|v| parse_flexible_date(v).is_some())
        .count();
    if date_count as f64 / total > DATE_FRACTION {
        return ColumnType::Date;
    }

    let number_count = valid.iter().filter(|v| is_numeric_value(v)).count();
    if number_count as f64 / total > NUMBER_FRACTION {
        return ColumnType::Number;
    }

    ColumnType::Text
}

/// Normalize a date string to `YYYY-MM-DD`: ISO parsing first, then
/// explicit US order, then European order, first success wins. If nothing
/// parses the input is returned unchanged (no error raised). Idempotent:
/// a standardized date re-parses as ISO and formats back to itself.
pub fn standardize_date(raw: &str) -> String {
    match parse_flexible_date(raw) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    }
}

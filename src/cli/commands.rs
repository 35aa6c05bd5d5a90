use colored::Colorize;
use std::path::PathBuf;

use crate::error::{ChartError, ChartResult};
use crate::store::{ChartSpec, ChartStore, ChartType};
use crate::types::{Aggregation, Dataset, DateGranularity, GroupByConfig, SortMode};
use crate::{formula, group, ingest};

/// Format a number for display, removing unnecessary decimal places
fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return format!("{}", n);
    }
    let rounded = (n * 1e6).round() / 1e6;
    format!("{:.6}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Print up to `limit` rows of a dataset as a plain table
fn print_dataset(dataset: &Dataset, limit: usize) {
    let header: Vec<String> = dataset
        .columns
        .iter()
        .map(|c| {
            if c.is_axis {
                format!("{}*", c.label)
            } else {
                c.label.clone()
            }
        })
        .collect();
    println!("   {}", header.join(" | ").bold());

    for row in dataset.rows.iter().take(limit) {
        let cells: Vec<String> = dataset
            .columns
            .iter()
            .map(|c| {
                row.get(&c.key)
                    .map(|v| v.to_display_string())
                    .unwrap_or_default()
            })
            .collect();
        println!("   {}", cells.join(" | "));
    }
    if dataset.rows.len() > limit {
        println!("   ... {} more rows", dataset.rows.len() - limit);
    }
}

/// Execute the inspect command
pub fn inspect(file: PathBuf, verbose: bool) -> ChartResult<()> {
    println!("{}", "📊 Chartable - Dataset inspection".bold().green());
    println!("   File: {}\n", file.display());

    let dataset = ingest::read_dataset(&file)?;

    println!(
        "   {} columns, {} rows",
        dataset.columns.len(),
        dataset.rows.len()
    );
    for col in &dataset.columns {
        let axis = if Some(col.key.as_str()) == dataset.axis_column().map(|c| c.key.as_str()) {
            " (axis)".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "      {} [{}]{}",
            col.key.cyan(),
            col.column_type.to_string().bright_blue(),
            axis
        );
    }

    if verbose && !dataset.rows.is_empty() {
        println!("\n{}", "   Sample:".bold());
        print_dataset(&dataset, 5);
    }

    Ok(())
}

/// Execute the eval command: evaluate a formula against one row
pub fn eval(file: PathBuf, formula_str: String, row: usize) -> ChartResult<()> {
    println!("{}", "🧮 Chartable - Formula evaluation".bold().green());
    println!("   File: {}", file.display());
    println!("   Formula: {}\n", formula_str.bright_blue());

    let dataset = ingest::read_dataset(&file)?;
    let current = dataset
        .rows
        .get(row)
        .ok_or(ChartError::RowIndexOutOfRange(row))?;

    // try_evaluate so a malformed formula reaches the user instead of
    // silently reading as 0
    let value = formula::try_evaluate(&formula_str, current, &dataset.rows)?;

    println!(
        "   Row {} = {}",
        row,
        format_number(value).bold().bright_green()
    );
    Ok(())
}

/// Execute the apply command: apply a formula to a whole column
pub fn apply(
    file: PathBuf,
    column: String,
    formula_str: String,
    output: Option<PathBuf>,
) -> ChartResult<()> {
    println!("{}", "🧮 Chartable - Applying column formula".bold().green());
    println!("   File: {}", file.display());
    println!(
        "   Column: {}  Formula: {}\n",
        column.cyan(),
        formula_str.bright_blue()
    );

    let mut dataset = ingest::read_dataset(&file)?;
    formula::apply_column_formula(&mut dataset, &column, &formula_str)?;

    match output {
        Some(path) => {
            ingest::write_dataset_json(&dataset, &path)?;
            println!("{} {}", "✅ Written to".green(), path.display());
        }
        None => print_dataset(&dataset, 20),
    }
    Ok(())
}

/// Execute the group command: group, aggregate and sort a dataset
pub fn group_cmd(
    file: PathBuf,
    by: String,
    aggregation: Aggregation,
    date_format: DateGranularity,
    sort: SortMode,
    output: Option<PathBuf>,
) -> ChartResult<()> {
    println!("{}", "📊 Chartable - Grouping".bold().green());
    println!("   File: {}", file.display());
    println!("   Group by: {}\n", by.cyan());

    let dataset = ingest::read_dataset(&file)?;
    let config = GroupByConfig::new(by, aggregation).with_date_format(date_format);
    let grouped = group::group_dataset(&dataset, &config, sort)?;

    match output {
        Some(path) => {
            ingest::write_dataset_json(&grouped, &path)?;
            println!("{} {}", "✅ Written to".green(), path.display());
        }
        None => {
            println!("   {} groups:", grouped.rows.len());
            print_dataset(&grouped, 50);
        }
    }
    Ok(())
}

/// Save (or replace) a chart definition in the store
#[allow(clippy::too_many_arguments)]
pub fn chart_save(
    store_path: PathBuf,
    name: String,
    chart_type: ChartType,
    group_by: Option<String>,
    aggregation: Aggregation,
    date_format: DateGranularity,
    sort: SortMode,
) -> ChartResult<()> {
    let mut store = ChartStore::open(store_path)?;

    let group_by = group_by.map(|column| {
        GroupByConfig::new(column, aggregation).with_date_format(date_format)
    });
    let spec = ChartSpec {
        name: name.clone(),
        chart_type,
        group_by,
        sort,
    };
    store.save_chart(spec)?;

    println!("{} {}", "✅ Saved chart".green(), name.bold());
    Ok(())
}

/// List saved charts
pub fn chart_list(store_path: PathBuf) -> ChartResult<()> {
    let store = ChartStore::open(store_path)?;

    if store.charts().is_empty() {
        println!("{}", "No saved charts".yellow());
        return Ok(());
    }

    println!("{}", "📊 Saved charts:".bold().green());
    for chart in store.charts() {
        let grouping = chart
            .group_by
            .as_ref()
            .map(|g| format!(" grouped by {}", g.column))
            .unwrap_or_default();
        println!("   {} ({:?}){}", chart.name.cyan(), chart.chart_type, grouping);
    }
    Ok(())
}

/// Delete a saved chart by name
pub fn chart_delete(store_path: PathBuf, name: String) -> ChartResult<()> {
    let mut store = ChartStore::open(store_path)?;

    if store.delete_chart(&name)? {
        println!("{} {}", "✅ Deleted chart".green(), name.bold());
    } else {
        println!("{} {}", "⚠️  No such chart:".yellow(), name);
    }
    Ok(())
}

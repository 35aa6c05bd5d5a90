use clap::{Parser, Subcommand};
use std::path::PathBuf;

use chartable::cli;
use chartable::error::ChartResult;
use chartable::store::ChartType;
use chartable::types::{Aggregation, DateGranularity, SortMode};

#[derive(Parser)]
#[command(name = "chartable")]
#[command(about = "Chart-builder data engine: ingest tables, evaluate formulas, group for charts.")]
#[command(long_about = "Chartable - tabular data engine for chart building

COMMANDS:
  inspect  - Ingest a CSV/JSON file and show the inferred schema
  eval     - Evaluate a formula against one row of a dataset
  apply    - Apply a formula to a whole column
  group    - Group, aggregate and sort a dataset for a chart axis
  chart    - Manage the saved-chart store

FORMULAS:
  Column references in brackets, aggregates over the whole dataset:
    [revenue] * 1.1
    SUM([revenue]) / 12
    ([actual] - [budget]) / [budget]

EXAMPLES:
  chartable inspect sales.csv
  chartable eval sales.csv --formula 'AVG([revenue])'
  chartable group sales.csv --by month --agg sum --date-format quarter
  chartable chart save q2-revenue --chart-type bar --group-by month")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a CSV/JSON file and show the inferred schema
    Inspect {
        /// Path to a .csv or .json dataset
        file: PathBuf,

        /// Show sample rows
        #[arg(short, long)]
        verbose: bool,
    },

    /// Evaluate a formula against one row of a dataset
    Eval {
        /// Path to a .csv or .json dataset
        file: PathBuf,

        /// Formula, e.g. "SUM([revenue]) / 12"
        #[arg(short, long)]
        formula: String,

        /// Row index to evaluate against (aggregates always use all rows)
        #[arg(short, long, default_value_t = 0)]
        row: usize,
    },

    /// Apply a formula to a whole column and print or write the result
    Apply {
        /// Path to a .csv or .json dataset
        file: PathBuf,

        /// Column key to overwrite with the formula results
        #[arg(short, long)]
        column: String,

        /// Formula, e.g. "[price] * [quantity]"
        #[arg(short, long)]
        formula: String,

        /// Write the transformed dataset as JSON instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Group, aggregate and sort a dataset for a chart axis
    Group {
        /// Path to a .csv or .json dataset
        file: PathBuf,

        /// Column to group by
        #[arg(short, long)]
        by: String,

        /// Aggregation applied to each numeric column
        #[arg(short, long, value_enum, default_value = "sum")]
        agg: Aggregation,

        /// Date bucketing granularity for the group key
        #[arg(long, value_enum, default_value = "none")]
        date_format: DateGranularity,

        /// Ordering of the axis column
        #[arg(long, value_enum, default_value = "none")]
        sort: SortMode,

        /// Write the grouped dataset as JSON instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage the saved-chart store
    Chart {
        #[command(subcommand)]
        action: ChartCommands,
    },
}

#[derive(Subcommand)]
enum ChartCommands {
    /// Save (or replace) a chart definition
    Save {
        /// Chart name (unique within the store)
        name: String,

        /// Chart rendering type
        #[arg(short = 't', long, value_enum)]
        chart_type: ChartType,

        /// Column to group by before rendering
        #[arg(long)]
        group_by: Option<String>,

        /// Aggregation for grouped numeric columns
        #[arg(long, value_enum, default_value = "sum")]
        agg: Aggregation,

        /// Date bucketing granularity for the group key
        #[arg(long, value_enum, default_value = "none")]
        date_format: DateGranularity,

        /// Ordering of the axis column
        #[arg(long, value_enum, default_value = "none")]
        sort: SortMode,

        /// Path to the chart store file
        #[arg(long, default_value = "charts.json")]
        store: PathBuf,
    },

    /// List saved charts
    List {
        /// Path to the chart store file
        #[arg(long, default_value = "charts.json")]
        store: PathBuf,
    },

    /// Delete a saved chart by name
    Delete {
        /// Chart name
        name: String,

        /// Path to the chart store file
        #[arg(long, default_value = "charts.json")]
        store: PathBuf,
    },
}

fn main() -> ChartResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { file, verbose } => cli::inspect(file, verbose),

        Commands::Eval { file, formula, row } => cli::eval(file, formula, row),

        Commands::Apply {
            file,
            column,
            formula,
            output,
        } => cli::apply(file, column, formula, output),

        Commands::Group {
            file,
            by,
            agg,
            date_format,
            sort,
            output,
        } => cli::group_cmd(file, by, agg, date_format, sort, output),

        Commands::Chart { action } => match action {
            ChartCommands::Save {
                name,
                chart_type,
                group_by,
                agg,
                date_format,
                sort,
                store,
            } => cli::chart_save(store, name, chart_type, group_by, agg, date_format, sort),

            ChartCommands::List { store } => cli::chart_list(store),

            ChartCommands::Delete { name, store } => cli::chart_delete(store, name),
        },
    }
}

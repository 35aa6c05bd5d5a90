//! CLI command handlers

pub mod commands;

pub use commands::{apply, chart_delete, chart_list, chart_save, eval, group_cmd, inspect};

use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Formula evaluation failed: {0}")]
    FormulaEvaluationFailed(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Row index {0} out of range")]
    RowIndexOutOfRange(usize),

    #[error("Undo expired: snapshot is {elapsed_secs}s old, window is {window_secs}s")]
    UndoExpired { elapsed_secs: u64, window_secs: u64 },
}

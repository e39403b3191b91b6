use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading the housing table. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: cannot parse '{value}' as an observation date")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: '{value}' in column '{column}' is not a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: {column} is {found} but observation_date says {expected}")]
    CalendarMismatch {
        row: usize,
        column: &'static str,
        expected: i64,
        found: i64,
    },

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedColumnType { column: String, data_type: String },

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
}

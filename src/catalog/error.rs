use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Required column '{0}' not found")]
    MissingColumn(String),

    #[error("Column '{column}' could not be read as {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
        #[source]
        source: PolarsError,
    },

    #[error("Failed to read city file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to write catalog file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse CSV file '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Failed to encode catalog CSV for '{0}'")]
    CsvWrite(PathBuf, #[source] PolarsError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("City '{0}' is not in the catalog")]
    UnknownCity(String),
}

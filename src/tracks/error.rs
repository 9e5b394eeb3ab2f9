use crate::geometry::error::BoundaryError;
use crate::output::CsvOutputError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("Could not find input CSV at '{0}'")]
    InputNotFound(PathBuf),

    #[error("I/O error reading track data from '{0}'")]
    ReadIo(PathBuf, #[source] std::io::Error),

    #[error("Failed to decompress track data from '{0}'")]
    Decompress(PathBuf, #[source] std::io::Error),

    #[error("Parsing error processing CSV data from '{path}'")]
    CsvRead {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Missing required columns {missing:?}, available columns include {available:?} (total {total})")]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
        total: usize,
    },

    #[error("Required column '{0}' not found in DataFrame")]
    ColumnNotFound(String, #[source] PolarsError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Retention by {0} requires a {0} boundary, none was configured")]
    MissingBoundary(&'static str),

    #[error(transparent)]
    Boundary(#[from] BoundaryError),

    #[error(transparent)]
    Output(#[from] CsvOutputError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

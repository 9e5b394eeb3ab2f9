use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Dataset not found at '{0}'")]
    FileNotFound(PathBuf),

    #[error("Failed to read CSV '{path}'")]
    CsvRead {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Dataset '{path}' is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Dataset '{path}' needs one of the columns {candidates:?}")]
    MissingAnyColumn {
        path: PathBuf,
        candidates: Vec<&'static str>,
    },

    #[error("Dataset '{0}' is empty")]
    EmptyDataset(PathBuf),

    #[error("Unknown climate index '{0}'")]
    UnknownIndex(String),

    #[error("Failed processing dashboard DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Background load task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

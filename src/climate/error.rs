use crate::output::CsvOutputError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClimateError {
    #[error("Could not find climate JSON at '{0}'")]
    FileNotFound(PathBuf),

    #[error("I/O error reading climate JSON '{0}'")]
    ReadIo(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse climate JSON '{0}'")]
    JsonParse(PathBuf, #[source] serde_json::Error),

    #[error("Series '{series}' has no data for country '{country}'")]
    MissingCountry { series: String, country: String },

    #[error("Series '{series}' has a period key '{key}' without a leading year")]
    InvalidPeriodKey { series: String, key: String },

    #[error("Series '{series}' has more than one value for year {year}")]
    DuplicateYear { series: String, year: i32 },

    #[error("Series '{0}' appears in more than one document")]
    DuplicateSeries(String),

    #[error("No climate documents to merge")]
    NoDocuments,

    #[error("Missing columns after merge: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("Failed processing climate DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error(transparent)]
    Output(#[from] CsvOutputError),
}

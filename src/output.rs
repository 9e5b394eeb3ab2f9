//! CSV output shared by the cleaning and merge stages.

use crate::utils::ensure_parent_dir_exists;
use log::debug;
use polars::prelude::*;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::task;

#[derive(Debug, Error)]
pub enum CsvOutputError {
    #[error("Failed to create output directory for '{0}'")]
    DirCreation(PathBuf, #[source] io::Error),

    #[error("I/O error writing CSV file '{0}'")]
    Io(PathBuf, #[source] io::Error),

    #[error("Encoding error writing CSV file '{0}'")]
    Encode(PathBuf, #[source] PolarsError),

    #[error("CSV writer task failed to complete")]
    TaskJoin(#[from] task::JoinError),
}

/// Writes `df` to `path` with a header row, creating missing parent
/// directories. An existing file is overwritten.
pub async fn write_csv(mut df: DataFrame, path: &Path) -> Result<(), CsvOutputError> {
    ensure_parent_dir_exists(path)
        .await
        .map_err(|e| CsvOutputError::DirCreation(path.to_path_buf(), e))?;

    let path = path.to_path_buf();
    task::spawn_blocking(move || {
        let mut file = File::create(&path).map_err(|e| CsvOutputError::Io(path.clone(), e))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| CsvOutputError::Encode(path.clone(), e))?;
        debug!("Wrote {} rows to {:?}", df.height(), path);
        Ok(())
    })
    .await?
}

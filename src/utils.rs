use polars::prelude::*;
use std::io;
use std::path::{Path, PathBuf};

/// Creates the parent directory of an output file if it does not exist yet.
pub async fn ensure_parent_dir_exists(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => match tokio::fs::metadata(parent).await {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Output path exists but is not a directory: {}", parent.display()),
            )),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tokio::fs::create_dir_all(parent).await
            }
            Err(e) => Err(e),
        },
        _ => Ok(()),
    }
}

/// Reads a CSV file with every column as text. Numeric coercion happens
/// afterwards with non-strict casts, so unparseable cells become null instead
/// of failing the read.
///
/// Blocking; call from `spawn_blocking` in async contexts.
pub(crate) fn read_text_csv(path: PathBuf) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path))?
        .finish()
}

/// Names of all columns of a DataFrame, in order.
pub(crate) fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Parses the boolean spellings found in processed CSVs.
pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

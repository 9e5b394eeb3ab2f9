use crate::constants::{COL_ISO_TIME, COL_LAT, COL_LON, COL_NATURE, COL_SID};
use crate::tracks::error::TrackError;
use crate::utils::{column_names, read_text_csv};
use async_compression::tokio::bufread::GzipDecoder;
use log::{info, warn};
use polars::frame::DataFrame;
use polars::prelude::*;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::{fs, task};

/// Number of available column names reported when required columns are missing.
const REPORTED_COLUMNS: usize = 30;

/// Reads raw IBTrACS track CSVs (plain or gzip-compressed) into a text-typed
/// DataFrame restricted to the columns the cleaning pipeline needs.
pub struct TrackLoader {
    wind_column: String,
}

impl TrackLoader {
    pub fn new(wind_column: &str) -> TrackLoader {
        TrackLoader {
            wind_column: wind_column.to_string(),
        }
    }

    /// Columns that must be present in the raw file, in output order.
    pub fn required_columns(&self) -> Vec<&str> {
        vec![
            COL_SID,
            COL_ISO_TIME,
            COL_LAT,
            COL_LON,
            COL_NATURE,
            self.wind_column.as_str(),
        ]
    }

    /// Loads the file at `path`, validates its header and selects the required
    /// columns. Every column is returned as text.
    pub async fn load(&self, path: &Path) -> Result<DataFrame, TrackError> {
        if fs::metadata(path).await.is_err() {
            return Err(TrackError::InputNotFound(path.to_path_buf()));
        }

        let df = if is_gzip(path) {
            let raw_bytes = Self::decompress(path).await?;
            Self::csv_bytes_to_dataframe(raw_bytes, path).await?
        } else {
            let path_buf = path.to_path_buf();
            task::spawn_blocking(move || {
                read_text_csv(path_buf.clone()).map_err(|e| TrackError::CsvRead {
                    path: path_buf,
                    source: e,
                })
            })
            .await??
        };

        self.validate_schema(&df)?;
        let df = df.select(self.required_columns())?;
        info!("Loaded {} raw track rows from {:?}", df.height(), path);
        Ok(df)
    }

    /// Fails fast when a required column is absent, reporting what is there.
    pub fn validate_schema(&self, df: &DataFrame) -> Result<(), TrackError> {
        let available = column_names(df);
        let missing: Vec<String> = self
            .required_columns()
            .into_iter()
            .filter(|required| !available.iter().any(|name| name == required))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            return Ok(());
        }
        warn!("Track CSV is missing required columns {:?}", missing);
        Err(TrackError::MissingColumns {
            missing,
            total: available.len(),
            available: available.into_iter().take(REPORTED_COLUMNS).collect(),
        })
    }

    async fn decompress(path: &Path) -> Result<Vec<u8>, TrackError> {
        let file = fs::File::open(path)
            .await
            .map_err(|e| TrackError::ReadIo(path.to_path_buf(), e))?;
        let mut decoder = GzipDecoder::new(BufReader::new(file));
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .await
            .map_err(|e| TrackError::Decompress(path.to_path_buf(), e))?;
        info!(
            "Decompressed {} bytes of track data from {:?}",
            decompressed.len(),
            path
        );
        Ok(decompressed)
    }

    /// Parses decompressed CSV bytes into a text-typed DataFrame on a blocking
    /// task, staging them through a temporary file.
    async fn csv_bytes_to_dataframe(
        bytes: Vec<u8>,
        source: &Path,
    ) -> Result<DataFrame, TrackError> {
        let source = source.to_path_buf();

        task::spawn_blocking(move || {
            let mut temp_file =
                NamedTempFile::new().map_err(|e| TrackError::ReadIo(source.clone(), e))?;
            temp_file
                .write_all(&bytes)
                .map_err(|e| TrackError::ReadIo(source.clone(), e))?;
            temp_file
                .flush()
                .map_err(|e| TrackError::ReadIo(source.clone(), e))?;

            read_text_csv(temp_file.path().to_path_buf()).map_err(|e| TrackError::CsvRead {
                path: source,
                source: e,
            })
        })
        .await?
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

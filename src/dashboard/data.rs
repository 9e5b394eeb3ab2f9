//! Loading of the processed CSV artifacts consumed by the dashboard pages.

use crate::constants::*;
use crate::dashboard::cache::{CacheKey, FrameCache};
use crate::dashboard::error::DashboardError;
use crate::tracks::extractor::parse_track_time;
use crate::types::intensity::IntensityClass;
use crate::utils::{column_names, parse_flag, read_text_csv};
use bon::Builder;
use chrono::{Datelike, NaiveDateTime};
use log::{info, warn};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;

/// The nine ERA5 indices the climate pages know about, in display order.
pub const CLIMATE_INDICES: [&str; 9] = [
    "cdd",
    "r50mm",
    "r95ptot",
    "cwd",
    "rx1day",
    "rx5day",
    "pr",
    "prpercent",
    "r20mm",
];

/// Locations of the processed datasets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Builder)]
pub struct DataSources {
    #[builder(into, default = PathBuf::from(PAR_STORMS_PATH))]
    pub par_storms: PathBuf,
    #[builder(into, default = PathBuf::from(LANDFALL_STORMS_PATH))]
    pub landfall_storms: PathBuf,
    #[builder(into, default = PathBuf::from(LANDFALL_TRACKS_PATH))]
    pub landfall_tracks: PathBuf,
    #[builder(into, default = PathBuf::from(ERA5_OUTPUT_CSV_PATH))]
    pub climate: PathBuf,
}

impl Default for DataSources {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// One storm summary row as the dashboard sees it. Labels are normalised;
/// anything that is not a known class is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct StormRecord {
    pub sid: String,
    pub start_year: Option<i32>,
    pub max_wind: Option<f64>,
    pub n_track_points: Option<u32>,
    pub peak_intensity: Option<IntensityClass>,
    pub par_max_wind: Option<f64>,
    pub par_peak_intensity: Option<IntensityClass>,
    /// `None` when the file has no `any_landfall` column.
    pub any_landfall: Option<bool>,
    /// First-landfall label, or the lifetime label when the file has no
    /// `landfall_intensity` column.
    pub landfall_intensity: Option<IntensityClass>,
}

impl StormRecord {
    /// Whether the row counts as a landfall storm. Rows from files without an
    /// `any_landfall` column always do.
    pub fn made_landfall(&self) -> bool {
        self.any_landfall != Some(false)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StormTable {
    pub records: Vec<StormRecord>,
    /// Whether the file carries the in-PAR label column at all.
    pub has_par_intensity: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    pub sid: String,
    pub time: Option<NaiveDateTime>,
    pub lat: f64,
    /// `LON_180` when present in the file, else `LON`.
    pub lon: f64,
    pub on_land: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackTable {
    pub records: Vec<TrackRecord>,
}

/// Annual climate indices: one entry per year, one series per index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClimateTable {
    pub years: Vec<i32>,
    /// Known indices present in the file, in [`CLIMATE_INDICES`] order.
    pub series: Vec<(String, Vec<Option<f64>>)>,
}

impl ClimateTable {
    pub fn index(&self, name: &str) -> Option<&[Option<f64>]> {
        self.series
            .iter()
            .find(|(series, _)| series == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn index_names(&self) -> Vec<&str> {
        self.series.iter().map(|(name, _)| name.as_str()).collect()
    }
}

async fn read_csv(path: &Path) -> Result<DataFrame, DashboardError> {
    if tokio::fs::metadata(path).await.is_err() {
        return Err(DashboardError::FileNotFound(path.to_path_buf()));
    }
    let path_buf = path.to_path_buf();
    let df = task::spawn_blocking(move || {
        read_text_csv(path_buf.clone()).map_err(|e| DashboardError::CsvRead {
            path: path_buf,
            source: e,
        })
    })
    .await??;
    info!("Loaded {} rows from {:?}", df.height(), path);
    Ok(df)
}

fn require(df: &DataFrame, path: &Path, columns: &[&str]) -> Result<(), DashboardError> {
    let available = column_names(df);
    match columns
        .iter()
        .find(|column| !available.iter().any(|name| name == *column))
    {
        Some(column) => Err(DashboardError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        }),
        None => Ok(()),
    }
}

/// Casts the listed columns to `Float64` where present. Unparseable cells
/// become null.
fn cast_numeric(df: DataFrame, columns: &[&str]) -> PolarsResult<DataFrame> {
    let present: Vec<Expr> = columns
        .iter()
        .filter(|name| df.get_column_index(name).is_some())
        .map(|name| col(*name).cast(DataType::Float64))
        .collect();
    if present.is_empty() {
        return Ok(df);
    }
    df.lazy().with_columns(present).collect()
}

fn str_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    match df.column(name) {
        Ok(column) => Ok(column
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()),
        Err(_) => Ok(vec![None; df.height()]),
    }
}

fn f64_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    match df.column(name) {
        Ok(column) => Ok(column.f64()?.into_iter().collect()),
        Err(_) => Ok(vec![None; df.height()]),
    }
}

fn labels(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<IntensityClass>>> {
    Ok(str_values(df, name)?
        .into_iter()
        .map(|v| v.and_then(|label| label.parse().ok()))
        .collect())
}

fn whole(value: Option<f64>) -> Option<i64> {
    value.filter(|v| v.is_finite()).map(|v| v.round() as i64)
}

fn storm_table(df: DataFrame, landfall_column: &str) -> PolarsResult<StormTable> {
    let df = cast_numeric(
        df,
        &[
            COL_START_YEAR,
            COL_MAX_WIND,
            COL_N_TRACK_POINTS,
            COL_PAR_MAX_WIND,
        ],
    )?;
    let has_any_landfall = df.get_column_index(COL_ANY_LANDFALL).is_some();
    let has_par_intensity = df.get_column_index(COL_PAR_PEAK_INTENSITY).is_some();

    let sids = str_values(&df, COL_SID)?;
    let start_years = f64_values(&df, COL_START_YEAR)?;
    let max_winds = f64_values(&df, COL_MAX_WIND)?;
    let n_points = f64_values(&df, COL_N_TRACK_POINTS)?;
    let peaks = labels(&df, COL_PEAK_INTENSITY)?;
    let par_winds = f64_values(&df, COL_PAR_MAX_WIND)?;
    let par_peaks = labels(&df, COL_PAR_PEAK_INTENSITY)?;
    let landfalls = str_values(&df, COL_ANY_LANDFALL)?;
    let landfall_labels = labels(&df, landfall_column)?;

    let records = (0..df.height())
        .filter_map(|idx| {
            let sid = sids[idx].clone()?;
            Some(StormRecord {
                sid,
                start_year: whole(start_years[idx]).and_then(|y| i32::try_from(y).ok()),
                max_wind: max_winds[idx],
                n_track_points: whole(n_points[idx]).and_then(|n| u32::try_from(n).ok()),
                peak_intensity: peaks[idx],
                par_max_wind: par_winds[idx],
                par_peak_intensity: par_peaks[idx],
                any_landfall: has_any_landfall.then(|| {
                    landfalls[idx].as_deref().and_then(parse_flag) == Some(true)
                }),
                landfall_intensity: landfall_labels[idx],
            })
        })
        .collect();
    Ok(StormTable {
        records,
        has_par_intensity,
    })
}

/// Loads the PAR-entry storm summaries.
pub async fn load_par_storms(path: &Path) -> Result<StormTable, DashboardError> {
    let df = read_csv(path).await?;
    require(&df, path, &[COL_SID, COL_START_YEAR, COL_PAR_PEAK_INTENSITY])?;
    Ok(storm_table(df, COL_LANDFALL_INTENSITY)?)
}

/// Adds a `start_year` column holding the year of each `time_column` value.
fn with_year_from(df: DataFrame, time_column: &str) -> PolarsResult<DataFrame> {
    let years: Vec<Option<i32>> = str_values(&df, time_column)?
        .into_iter()
        .map(|time| time.as_deref().and_then(parse_track_time).map(|t| t.year()))
        .collect();
    let mut df = df;
    df.with_column(Column::new(COL_START_YEAR.into(), years))?;
    Ok(df)
}

/// Loads the landfall storm summaries.
///
/// Without a `start_year` column the year is taken from
/// `first_landfall_time`. The landfall label falls back to `peak_intensity`
/// when the file has no `landfall_intensity` column.
pub async fn load_landfall_storms(path: &Path) -> Result<StormTable, DashboardError> {
    let df = read_csv(path).await?;
    require(&df, path, &[COL_SID])?;
    let available = column_names(&df);
    let has = |column: &str| available.iter().any(|name| name == column);

    let df = if has(COL_START_YEAR) {
        df
    } else if has(COL_FIRST_LANDFALL_TIME) {
        warn!(
            "{:?} has no {} column, deriving it from {}",
            path, COL_START_YEAR, COL_FIRST_LANDFALL_TIME
        );
        with_year_from(df, COL_FIRST_LANDFALL_TIME)?
    } else {
        return Err(DashboardError::MissingAnyColumn {
            path: path.to_path_buf(),
            candidates: vec![COL_START_YEAR, COL_FIRST_LANDFALL_TIME],
        });
    };
    let landfall_column = [COL_LANDFALL_INTENSITY, COL_PEAK_INTENSITY]
        .into_iter()
        .find(|candidate| has(*candidate))
        .ok_or_else(|| DashboardError::MissingAnyColumn {
            path: path.to_path_buf(),
            candidates: vec![COL_LANDFALL_INTENSITY, COL_PEAK_INTENSITY],
        })?;
    if landfall_column != COL_LANDFALL_INTENSITY {
        warn!(
            "{:?} has no {} column, using {}",
            path, COL_LANDFALL_INTENSITY, landfall_column
        );
    }
    Ok(storm_table(df, landfall_column)?)
}

/// Loads the landfall detail rows, dropping rows without a position.
pub async fn load_landfall_tracks(path: &Path) -> Result<TrackTable, DashboardError> {
    let df = read_csv(path).await?;
    require(&df, path, &[COL_SID, COL_ISO_TIME, COL_LAT, COL_LON])?;
    let lon_column = if df.get_column_index(COL_LON_180).is_some() {
        COL_LON_180
    } else {
        COL_LON
    };
    let df = cast_numeric(df, &[COL_LAT, lon_column])?;

    let sids = str_values(&df, COL_SID)?;
    let times = str_values(&df, COL_ISO_TIME)?;
    let lats = f64_values(&df, COL_LAT)?;
    let lons = f64_values(&df, lon_column)?;
    let on_land = str_values(&df, COL_ON_PH_LAND)?;

    let records = (0..df.height())
        .filter_map(|idx| {
            Some(TrackRecord {
                sid: sids[idx].clone()?,
                time: times[idx].as_deref().and_then(parse_track_time),
                lat: lats[idx]?,
                lon: lons[idx]?,
                on_land: on_land[idx].as_deref().and_then(parse_flag) == Some(true),
            })
        })
        .collect();
    Ok(TrackTable { records })
}

/// Loads the merged climate table. Rows with a missing year are dropped and
/// rows are sorted by year.
pub async fn load_climate(path: &Path) -> Result<ClimateTable, DashboardError> {
    let df = read_csv(path).await?;
    if df.height() == 0 {
        return Err(DashboardError::EmptyDataset(path.to_path_buf()));
    }
    require(&df, path, &[COL_YEAR])?;

    let missing: Vec<&str> = CLIMATE_INDICES
        .iter()
        .copied()
        .filter(|name| df.get_column_index(name).is_none())
        .collect();
    if !missing.is_empty() {
        warn!("{:?} is missing climate indices {:?}", path, missing);
    }

    let mut numeric = vec![COL_YEAR];
    numeric.extend(CLIMATE_INDICES.iter().filter(|name| !missing.contains(name)));
    let df = cast_numeric(df, &numeric)?;

    let years = f64_values(&df, COL_YEAR)?;
    let mut order: Vec<(i32, usize)> = years
        .iter()
        .enumerate()
        .filter_map(|(idx, year)| {
            whole(*year)
                .and_then(|y| i32::try_from(y).ok())
                .map(|y| (y, idx))
        })
        .collect();
    order.sort();

    let mut series = Vec::new();
    for name in CLIMATE_INDICES.iter().filter(|name| !missing.contains(name)) {
        let values = f64_values(&df, name)?;
        series.push((
            name.to_string(),
            order.iter().map(|&(_, idx)| values[idx]).collect(),
        ));
    }

    Ok(ClimateTable {
        years: order.iter().map(|&(year, _)| year).collect(),
        series,
    })
}

/// Cached access to every dataset, keyed by loader name and path.
pub async fn par_storms(
    cache: &FrameCache,
    sources: &DataSources,
) -> Result<Arc<StormTable>, DashboardError> {
    let path = &sources.par_storms;
    cache
        .get_or_try_insert_with(CacheKey::new("load_par_storms", path), || {
            load_par_storms(path)
        })
        .await
}

pub async fn landfall_storms(
    cache: &FrameCache,
    sources: &DataSources,
) -> Result<Arc<StormTable>, DashboardError> {
    let path = &sources.landfall_storms;
    cache
        .get_or_try_insert_with(CacheKey::new("load_landfall_storms", path), || {
            load_landfall_storms(path)
        })
        .await
}

pub async fn landfall_tracks(
    cache: &FrameCache,
    sources: &DataSources,
) -> Result<Arc<TrackTable>, DashboardError> {
    let path = &sources.landfall_tracks;
    cache
        .get_or_try_insert_with(CacheKey::new("load_landfall_tracks", path), || {
            load_landfall_tracks(path)
        })
        .await
}

pub async fn climate(
    cache: &FrameCache,
    sources: &DataSources,
) -> Result<Arc<ClimateTable>, DashboardError> {
    let path = &sources.climate;
    cache
        .get_or_try_insert_with(CacheKey::new("load_climate", path), || load_climate(path))
        .await
}

use crate::constants::{COL_ISO_TIME, COL_LAT, COL_LON, COL_NATURE, COL_SID};
use crate::geometry::convention::{is_valid_latitude, is_valid_longitude};
use crate::tracks::error::TrackError;
use crate::types::track::TrackPoint;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Track points pulled out of a coerced frame, with the rows that could not
/// become a `TrackPoint`.
#[derive(Debug, Default)]
pub struct ExtractedPoints {
    pub points: Vec<TrackPoint>,
    pub unparseable_times: usize,
    pub invalid_positions: usize,
}

/// Retrieves a column by name from a DataFrame.
fn get_column<'a>(df: &'a DataFrame, col: &str) -> Result<&'a Column, TrackError> {
    df.column(col)
        .map_err(|e| TrackError::ColumnNotFound(col.to_string(), e))
}

fn get_str<'a>(df: &'a DataFrame, col: &str) -> Result<&'a StringChunked, TrackError> {
    get_column(df, col)?
        .str()
        .map_err(|e| TrackError::ColumnNotFound(col.to_string(), e))
}

fn get_f64<'a>(df: &'a DataFrame, col: &str) -> Result<&'a Float64Chunked, TrackError> {
    get_column(df, col)?
        .f64()
        .map_err(|e| TrackError::ColumnNotFound(col.to_string(), e))
}

/// Parses an IBTrACS timestamp. Accepts a space or `T` separator, and a bare
/// date which is read as midnight.
pub fn parse_track_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Converts a frame that went through `coerce_track_types` into track points.
///
/// Rows with a missing field or a non-finite wind are skipped silently (they
/// should already have been dropped). Rows whose timestamp does not parse or whose position lies
/// outside the valid ranges are skipped and counted.
pub fn extract_points(df: &DataFrame, wind_column: &str) -> Result<ExtractedPoints, TrackError> {
    let sids = get_str(df, COL_SID)?;
    let times = get_str(df, COL_ISO_TIME)?;
    let lats = get_f64(df, COL_LAT)?;
    let lons = get_f64(df, COL_LON)?;
    let natures = get_str(df, COL_NATURE)?;
    let winds = get_f64(df, wind_column)?;

    let mut extracted = ExtractedPoints::default();
    for idx in 0..df.height() {
        let (Some(sid), Some(time), Some(lat), Some(lon), Some(wind)) = (
            sids.get(idx),
            times.get(idx),
            lats.get(idx),
            lons.get(idx),
            winds.get(idx),
        ) else {
            continue;
        };
        if !wind.is_finite() {
            continue;
        }

        let Some(time) = parse_track_time(time) else {
            extracted.unparseable_times += 1;
            continue;
        };
        if !is_valid_latitude(lat) || !is_valid_longitude(lon) {
            extracted.invalid_positions += 1;
            continue;
        }

        extracted.points.push(TrackPoint {
            sid: sid.trim().to_string(),
            time,
            lat,
            lon,
            nature: natures
                .get(idx)
                .map(str::trim)
                .filter(|nature| !nature.is_empty())
                .map(str::to_string),
            wind,
        });
    }
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_track_time_formats() {
        let spaced = parse_track_time("1950-01-01 06:00:00").unwrap();
        assert_eq!(spaced.hour(), 6);
        let iso = parse_track_time("2020-10-31T18:00:00").unwrap();
        assert_eq!(iso.year(), 2020);
        let date_only = parse_track_time(" 1999-12-31 ").unwrap();
        assert_eq!(date_only.hour(), 0);
        assert!(parse_track_time("not a time").is_none());
        assert!(parse_track_time("").is_none());
    }

    #[test]
    fn test_extract_counts_rejected_rows() {
        let df = df!(
            "SID" => ["A", "A", "A", "A"],
            "ISO_TIME" => ["1950-01-01 00:00:00", "garbage", "1950-01-01 12:00:00", "1950-01-01 18:00:00"],
            "LAT" => [10.0, 10.5, 95.0, 11.0],
            "LON" => [130.0, 129.5, 129.0, 365.0],
            "NATURE" => [Some("TS"), Some("TS"), None, Some(" ")],
            "USA_WIND" => [35.0, 40.0, 45.0, 50.0]
        )
        .unwrap();

        let extracted = extract_points(&df, "USA_WIND").unwrap();
        assert_eq!(extracted.points.len(), 1);
        assert_eq!(extracted.unparseable_times, 1);
        assert_eq!(extracted.invalid_positions, 2);
        assert_eq!(extracted.points[0].nature.as_deref(), Some("TS"));
    }

    #[test]
    fn test_extract_skips_nan_wind() {
        let df = df!(
            "SID" => ["A", "A"],
            "ISO_TIME" => ["1950-01-01 00:00:00", "1950-01-01 06:00:00"],
            "LAT" => [10.0, 10.5],
            "LON" => [130.0, 129.5],
            "NATURE" => ["TS", "TY"],
            "USA_WIND" => [f64::NAN, 70.0]
        )
        .unwrap();

        let extracted = extract_points(&df, "USA_WIND").unwrap();
        assert_eq!(extracted.points.len(), 1);
        assert_eq!(extracted.points[0].wind, 70.0);
        assert_eq!(extracted.invalid_positions, 0);
    }

    #[test]
    fn test_extract_requires_coerced_columns() {
        let df = df!(
            "SID" => ["A"],
            "ISO_TIME" => ["1950-01-01 00:00:00"],
            "LAT" => ["10.0"],
            "LON" => [130.0],
            "NATURE" => ["TS"],
            "USA_WIND" => [35.0]
        )
        .unwrap();
        assert!(matches!(
            extract_points(&df, "USA_WIND"),
            Err(TrackError::ColumnNotFound(..))
        ));
    }
}

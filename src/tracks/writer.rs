use crate::constants::*;
use crate::output::write_csv;
use crate::tracks::aggregate::Scopes;
use crate::tracks::error::TrackError;
use crate::types::intensity::IntensityClass;
use crate::types::storm::{FirstLandfall, StormSummary};
use crate::types::track::CleanTrack;
use polars::prelude::*;
use std::path::Path;

fn label(class: Option<IntensityClass>) -> Option<String> {
    class.map(|c| c.label().to_string())
}

fn first_landfall(storm: &StormSummary) -> Option<&FirstLandfall> {
    storm.landfall.as_ref().and_then(|l| l.first.as_ref())
}

/// Builds the detail frame: the raw columns plus `year`, `LON_180` and one
/// membership column per configured boundary.
pub fn tracks_frame(
    tracks: &[CleanTrack],
    wind_column: &str,
    scopes: Scopes,
) -> PolarsResult<DataFrame> {
    let mut columns = vec![
        Column::new(
            COL_SID.into(),
            tracks.iter().map(|t| t.point.sid.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_ISO_TIME.into(),
            tracks
                .iter()
                .map(|t| t.point.time.format(TIME_FORMAT).to_string())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            COL_LAT.into(),
            tracks.iter().map(|t| t.point.lat).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_LON.into(),
            tracks.iter().map(|t| t.point.lon).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_NATURE.into(),
            tracks
                .iter()
                .map(|t| t.point.nature.clone())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            wind_column.into(),
            tracks.iter().map(|t| t.point.wind).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_YEAR.into(),
            tracks.iter().map(|t| t.point.year()).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_LON_180.into(),
            tracks.iter().map(|t| t.lon_180).collect::<Vec<_>>(),
        ),
    ];
    if scopes.region {
        columns.push(Column::new(
            COL_IN_PAR.into(),
            tracks.iter().map(|t| t.in_region).collect::<Vec<_>>(),
        ));
    }
    if scopes.landfall {
        columns.push(Column::new(
            COL_ON_PH_LAND.into(),
            tracks.iter().map(|t| t.on_land).collect::<Vec<_>>(),
        ));
    }
    DataFrame::new(columns)
}

/// Builds the summary frame. Missing scoped aggregates become empty cells.
pub fn storms_frame(storms: &[StormSummary], scopes: Scopes) -> PolarsResult<DataFrame> {
    let fmt_time = |time: &chrono::NaiveDateTime| time.format(TIME_FORMAT).to_string();

    let mut columns = vec![
        Column::new(
            COL_SID.into(),
            storms.iter().map(|s| s.sid.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_START_TIME.into(),
            storms.iter().map(|s| fmt_time(&s.start_time)).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_END_TIME.into(),
            storms.iter().map(|s| fmt_time(&s.end_time)).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_START_YEAR.into(),
            storms.iter().map(|s| s.start_year).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_MAX_WIND.into(),
            storms.iter().map(|s| s.max_wind).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_N_TRACK_POINTS.into(),
            storms
                .iter()
                .map(|s| s.n_track_points as u64)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            COL_MEAN_LAT.into(),
            storms.iter().map(|s| s.mean_lat).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_MEAN_LON.into(),
            storms.iter().map(|s| s.mean_lon).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_PEAK_INTENSITY.into(),
            storms
                .iter()
                .map(|s| s.peak_intensity.label().to_string())
                .collect::<Vec<_>>(),
        ),
    ];

    if scopes.region {
        columns.push(Column::new(
            COL_PAR_MAX_WIND.into(),
            storms
                .iter()
                .map(|s| s.region.as_ref().and_then(|r| r.max_wind))
                .collect::<Vec<_>>(),
        ));
        columns.push(Column::new(
            COL_PAR_PEAK_INTENSITY.into(),
            storms
                .iter()
                .map(|s| label(s.region.as_ref().and_then(|r| r.peak_intensity)))
                .collect::<Vec<_>>(),
        ));
    }

    if scopes.landfall {
        columns.extend([
            Column::new(
                COL_ANY_LANDFALL.into(),
                storms
                    .iter()
                    .map(|s| s.landfall.as_ref().map(|l| l.any_landfall))
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                COL_FIRST_LANDFALL_TIME.into(),
                storms
                    .iter()
                    .map(|s| first_landfall(s).map(|f| fmt_time(&f.time)))
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                COL_FIRST_LANDFALL_LAT.into(),
                storms
                    .iter()
                    .map(|s| first_landfall(s).map(|f| f.lat))
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                COL_FIRST_LANDFALL_LON.into(),
                storms
                    .iter()
                    .map(|s| first_landfall(s).map(|f| f.lon))
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                COL_FIRST_LANDFALL_WIND.into(),
                storms
                    .iter()
                    .map(|s| first_landfall(s).map(|f| f.wind))
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                COL_FIRST_LANDFALL_NATURE.into(),
                storms
                    .iter()
                    .map(|s| first_landfall(s).and_then(|f| f.nature.clone()))
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                COL_LANDFALL_INTENSITY.into(),
                storms
                    .iter()
                    .map(|s| label(s.landfall.as_ref().and_then(|l| l.intensity)))
                    .collect::<Vec<_>>(),
            ),
        ]);
    }

    DataFrame::new(columns)
}

pub async fn write_tracks_csv(
    tracks: &[CleanTrack],
    wind_column: &str,
    scopes: Scopes,
    path: &Path,
) -> Result<(), TrackError> {
    Ok(write_csv(tracks_frame(tracks, wind_column, scopes)?, path).await?)
}

pub async fn write_storms_csv(
    storms: &[StormSummary],
    scopes: Scopes,
    path: &Path,
) -> Result<(), TrackError> {
    Ok(write_csv(storms_frame(storms, scopes)?, path).await?)
}

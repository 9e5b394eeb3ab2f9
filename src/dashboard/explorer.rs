//! Spatio-temporal explorer: landfall storm paths filtered by year and
//! intensity, coloured for the map, plus the accompanying storms table.

use crate::constants::{END_YEAR, START_YEAR};
use crate::dashboard::data::{StormRecord, StormTable, TrackRecord, TrackTable};
use crate::types::intensity::IntensityClass;
use bon::Builder;
use ordered_float::OrderedFloat;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::RangeInclusive;

/// Rows shown in the storms table under the map.
pub const TABLE_ROW_LIMIT: usize = 300;

/// RGBA colour, channels 0-255.
pub type Rgba = [u8; 4];

const UNKNOWN_COLOR: Rgba = [100, 100, 100, 200];
const NO_PAR_COLUMN_COLOR: Rgba = [100, 100, 100, 120];

pub fn intensity_color(class: Option<IntensityClass>) -> Rgba {
    match class {
        Some(IntensityClass::TropicalDepression) => [120, 120, 120, 220],
        Some(IntensityClass::TropicalStorm) => [70, 130, 180, 220],
        Some(IntensityClass::Typhoon) => [255, 165, 0, 220],
        Some(IntensityClass::SuperTyphoon) => [220, 20, 60, 230],
        None => UNKNOWN_COLOR,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorMode {
    /// Lifetime peak label of the storm.
    #[default]
    Intensity,
    /// Grey ramp from the weakest to the strongest shown storm.
    MaxWind,
    /// In-PAR peak label.
    ParIntensity,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Builder)]
pub struct ExplorerFilter {
    #[builder(default = START_YEAR..=END_YEAR)]
    pub years: RangeInclusive<i32>,
    #[builder(default = IntensityClass::ALL.to_vec())]
    pub intensities: Vec<IntensityClass>,
    /// Keep only the track points on Philippine land.
    #[builder(default)]
    pub land_only: bool,
    #[builder(default)]
    pub color_mode: ColorMode,
}

impl Default for ExplorerFilter {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Classes that occur as lifetime peak in `table`, weakest first.
pub fn intensity_options(table: &StormTable) -> Vec<IntensityClass> {
    IntensityClass::ALL
        .into_iter()
        .filter(|class| table.records.iter().any(|r| r.peak_intensity == Some(*class)))
        .collect()
}

/// Storms whose start year is in range and whose peak label is selected.
pub fn filter_storms<'a>(table: &'a StormTable, filter: &ExplorerFilter) -> Vec<&'a StormRecord> {
    table
        .records
        .iter()
        .filter(|r| r.start_year.is_some_and(|year| filter.years.contains(&year)))
        .filter(|r| {
            r.peak_intensity
                .is_some_and(|class| filter.intensities.contains(&class))
        })
        .collect()
}

/// One storm drawn on the map, with its tooltip fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StormPath {
    pub sid: String,
    /// `[lon, lat]` pairs in time order.
    pub path: Vec<[f64; 2]>,
    pub start_year: Option<i32>,
    pub peak_intensity: Option<IntensityClass>,
    pub max_wind: Option<f64>,
    pub n_track_points: Option<u32>,
    pub par_max_wind: Option<f64>,
    pub par_peak_intensity: Option<IntensityClass>,
    pub color: Rgba,
}

fn time_order(a: &&TrackRecord, b: &&TrackRecord) -> std::cmp::Ordering {
    // Unparseable times sort last
    (a.time.is_none(), a.time).cmp(&(b.time.is_none(), b.time))
}

/// Builds one path per selected storm from its track points, ordered by SID.
/// Storms with fewer than two points left are not drawn.
pub fn build_paths(
    tracks: &TrackTable,
    storms: &[&StormRecord],
    land_only: bool,
    color_mode: ColorMode,
    has_par_intensity: bool,
) -> Vec<StormPath> {
    let selected: HashMap<&str, &StormRecord> =
        storms.iter().map(|s| (s.sid.as_str(), *s)).collect();

    let mut points: BTreeMap<&str, Vec<&TrackRecord>> = BTreeMap::new();
    for record in tracks.records.iter() {
        if (land_only && !record.on_land) || !selected.contains_key(record.sid.as_str()) {
            continue;
        }
        points.entry(record.sid.as_str()).or_default().push(record);
    }

    let mut paths: Vec<StormPath> = points
        .into_iter()
        .filter(|(_, rows)| rows.len() >= 2)
        .filter_map(|(sid, mut rows)| {
            let storm = selected.get(sid)?;
            rows.sort_by(time_order);
            Some(StormPath {
                sid: sid.to_string(),
                path: rows.iter().map(|r| [r.lon, r.lat]).collect(),
                start_year: storm.start_year,
                peak_intensity: storm.peak_intensity,
                max_wind: storm.max_wind,
                n_track_points: storm.n_track_points,
                par_max_wind: storm.par_max_wind,
                par_peak_intensity: storm.par_peak_intensity,
                color: UNKNOWN_COLOR,
            })
        })
        .collect();

    apply_colors(&mut paths, color_mode, has_par_intensity);
    paths
}

fn apply_colors(paths: &mut [StormPath], mode: ColorMode, has_par_intensity: bool) {
    match mode {
        ColorMode::Intensity => {
            for path in paths.iter_mut() {
                path.color = intensity_color(path.peak_intensity);
            }
        }
        ColorMode::ParIntensity => {
            for path in paths.iter_mut() {
                path.color = if has_par_intensity {
                    intensity_color(path.par_peak_intensity)
                } else {
                    NO_PAR_COLUMN_COLOR
                };
            }
        }
        ColorMode::MaxWind => {
            let winds: Vec<f64> = paths
                .iter()
                .map(|p| p.max_wind.filter(|w| !w.is_nan()).unwrap_or(0.0))
                .collect();
            let ramp = GreyRamp::over(&winds);
            for (path, wind) in paths.iter_mut().zip(winds) {
                path.color = ramp.color(wind);
            }
        }
    }
}

/// Maps wind linearly onto grey levels 60 (weakest) to 240 (strongest).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GreyRamp {
    min: f64,
    max: f64,
}

impl GreyRamp {
    pub fn over(winds: &[f64]) -> Self {
        let min = winds.iter().copied().fold(f64::INFINITY, f64::min);
        let max = winds.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = if min.is_finite() { min } else { 0.0 };
        let max = if max > min { max } else { min + 1.0 };
        Self { min, max }
    }

    pub fn color(&self, wind: f64) -> Rgba {
        let t = (wind - self.min) / (self.max - self.min);
        let grey = (60.0 + 180.0 * t).clamp(0.0, 255.0) as u8;
        [grey, grey, grey, 160]
    }
}

/// Storms sorted by start year ascending, then max wind descending, limited to
/// [`TABLE_ROW_LIMIT`] rows.
pub fn storms_table(storms: &[&StormRecord]) -> Vec<StormRecord> {
    let mut rows: Vec<&StormRecord> = storms.to_vec();
    rows.sort_by_key(|r| {
        (
            r.start_year.is_none(),
            r.start_year,
            std::cmp::Reverse(r.max_wind.map(OrderedFloat)),
        )
    });
    rows.into_iter().take(TABLE_ROW_LIMIT).cloned().collect()
}

/// Everything the explorer page shows for one filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerView {
    /// Distinct storms matching the filter, drawn or not.
    pub storm_count: usize,
    pub paths: Vec<StormPath>,
    pub table: Vec<StormRecord>,
}

pub fn explore(storms: &StormTable, tracks: &TrackTable, filter: &ExplorerFilter) -> ExplorerView {
    let matching = filter_storms(storms, filter);
    let storm_count = matching
        .iter()
        .map(|r| r.sid.as_str())
        .collect::<HashSet<_>>()
        .len();
    ExplorerView {
        storm_count,
        paths: build_paths(
            tracks,
            &matching,
            filter.land_only,
            filter.color_mode,
            storms.has_par_intensity,
        ),
        table: storms_table(&matching),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use IntensityClass::*;

    fn storm(sid: &str, year: i32, wind: Option<f64>) -> StormRecord {
        StormRecord {
            sid: sid.to_string(),
            start_year: Some(year),
            max_wind: wind,
            n_track_points: Some(3),
            peak_intensity: IntensityClass::classify_opt(wind),
            par_max_wind: None,
            par_peak_intensity: None,
            any_landfall: Some(true),
            landfall_intensity: IntensityClass::classify_opt(wind),
        }
    }

    fn point(sid: &str, hour: u32, lon: f64, on_land: bool) -> TrackRecord {
        TrackRecord {
            sid: sid.to_string(),
            time: NaiveDate::from_ymd_opt(2000, 7, 1)
                .and_then(|d| d.and_hms_opt(hour, 0, 0)),
            lat: 12.0,
            lon,
            on_land,
        }
    }

    fn storms() -> StormTable {
        StormTable {
            records: vec![
                storm("A", 2000, Some(140.0)),
                storm("B", 2001, Some(70.0)),
                storm("C", 2001, Some(40.0)),
                storm("D", 2005, Some(70.0)),
            ],
            has_par_intensity: false,
        }
    }

    fn tracks() -> TrackTable {
        TrackTable {
            records: vec![
                point("A", 6, 124.0, true),
                point("A", 0, 125.0, false),
                point("A", 12, 123.0, true),
                point("B", 0, 126.0, false),
                point("B", 6, 125.0, true),
                point("C", 0, 126.0, true),
                point("D", 0, 126.0, true),
                point("D", 6, 125.0, true),
            ],
        }
    }

    #[test]
    fn test_filter_by_year_and_intensity() {
        let table = storms();
        let filter = ExplorerFilter::builder()
            .years(2000..=2001)
            .intensities(vec![Typhoon, SuperTyphoon])
            .build();
        let sids: Vec<&str> = filter_storms(&table, &filter)
            .iter()
            .map(|r| r.sid.as_str())
            .collect();
        assert_eq!(sids, vec!["A", "B"]);
        assert_eq!(intensity_options(&table), vec![TropicalStorm, Typhoon, SuperTyphoon]);
    }

    #[test]
    fn test_paths_are_time_ordered_and_need_two_points() {
        let table = storms();
        let view = explore(&table, &tracks(), &ExplorerFilter::default());
        let sids: Vec<&str> = view.paths.iter().map(|p| p.sid.as_str()).collect();
        // C has a single point
        assert_eq!(sids, vec!["A", "B", "D"]);
        assert_eq!(view.storm_count, 4);
        assert_eq!(view.paths[0].path, vec![[125.0, 12.0], [124.0, 12.0], [123.0, 12.0]]);
        assert_eq!(view.paths[0].color, [220, 20, 60, 230]);
        assert_eq!(view.paths[1].n_track_points, Some(3));
    }

    #[test]
    fn test_land_only_points() {
        let table = storms();
        let filter = ExplorerFilter::builder().land_only(true).build();
        let view = explore(&table, &tracks(), &filter);
        let sids: Vec<&str> = view.paths.iter().map(|p| p.sid.as_str()).collect();
        assert_eq!(sids, vec!["A", "D"]);
        assert_eq!(view.paths[0].path.len(), 2);
    }

    #[test]
    fn test_color_modes() {
        let table = storms();
        let filter = ExplorerFilter::builder().color_mode(ColorMode::MaxWind).build();
        let view = explore(&table, &tracks(), &filter);
        let colors: Vec<Rgba> = view.paths.iter().map(|p| p.color).collect();
        assert_eq!(colors, vec![[240, 240, 240, 160], [60, 60, 60, 160], [60, 60, 60, 160]]);

        let filter = ExplorerFilter::builder()
            .color_mode(ColorMode::ParIntensity)
            .build();
        let view = explore(&table, &tracks(), &filter);
        assert!(view.paths.iter().all(|p| p.color == NO_PAR_COLUMN_COLOR));

        let flat = GreyRamp::over(&[50.0, 50.0]);
        assert_eq!(flat.color(50.0), [60, 60, 60, 160]);
    }

    #[test]
    fn test_storms_table_order_and_limit() {
        let table = storms();
        let all: Vec<&StormRecord> = table.records.iter().collect();
        let rows = storms_table(&all);
        let sids: Vec<&str> = rows.iter().map(|r| r.sid.as_str()).collect();
        assert_eq!(sids, vec!["A", "B", "C", "D"]);

        let many: Vec<StormRecord> = (0..400)
            .map(|i| storm(&format!("S{i}"), 2000, Some(i as f64)))
            .collect();
        let refs: Vec<&StormRecord> = many.iter().collect();
        let rows = storms_table(&refs);
        assert_eq!(rows.len(), TABLE_ROW_LIMIT);
        assert_eq!(rows[0].max_wind, Some(399.0));
    }
}

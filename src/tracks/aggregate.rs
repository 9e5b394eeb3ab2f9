//! Per-storm aggregation of cleaned track rows.

use crate::types::intensity::IntensityClass;
use crate::types::storm::{FirstLandfall, LandfallScope, RegionScope, StormSummary};
use crate::types::track::CleanTrack;
use chrono::Datelike;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

/// Which scoped aggregates a cleaning run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scopes {
    pub region: bool,
    pub landfall: bool,
}

/// Orders tracks by storm, then time. Position breaks the remaining ties so
/// the output is fully deterministic.
pub fn sort_tracks(tracks: &mut [CleanTrack]) {
    tracks.sort_by(|a, b| {
        (&a.point.sid, a.point.time, OrderedFloat(a.point.lat), OrderedFloat(a.lon_180)).cmp(&(
            &b.point.sid,
            b.point.time,
            OrderedFloat(b.point.lat),
            OrderedFloat(b.lon_180),
        ))
    });
}

/// Builds one summary per storm, sorted by `(start_year, SID)`.
///
/// `tracks` must already be sorted with [`sort_tracks`]; the first on-land row
/// of a storm is taken as its first landfall.
pub fn summarize_storms(tracks: &[CleanTrack], scopes: Scopes) -> Vec<StormSummary> {
    let mut by_storm: BTreeMap<&str, Vec<&CleanTrack>> = BTreeMap::new();
    for track in tracks {
        by_storm.entry(track.point.sid.as_str()).or_default().push(track);
    }

    let mut storms: Vec<StormSummary> = by_storm
        .into_iter()
        .filter_map(|(sid, rows)| summarize_storm(sid, &rows, scopes))
        .collect();
    storms.sort_by(|a, b| (a.start_year, &a.sid).cmp(&(b.start_year, &b.sid)));
    storms
}

fn summarize_storm(sid: &str, rows: &[&CleanTrack], scopes: Scopes) -> Option<StormSummary> {
    let start_time = rows.iter().map(|t| t.point.time).min()?;
    let end_time = rows.iter().map(|t| t.point.time).max()?;
    let max_wind = max_wind(rows.iter().copied())?;
    let n = rows.len() as f64;
    let mean_lat = rows.iter().map(|t| t.point.lat).sum::<f64>() / n;
    let mean_lon = rows.iter().map(|t| t.lon_180).sum::<f64>() / n;

    let region = scopes.region.then(|| {
        let max_wind = max_wind_where(rows, |t| t.in_region == Some(true));
        RegionScope {
            max_wind,
            peak_intensity: IntensityClass::classify_opt(max_wind),
        }
    });

    let landfall = scopes.landfall.then(|| {
        let first = rows
            .iter()
            .find(|t| t.on_land == Some(true))
            .map(|t| FirstLandfall {
                time: t.point.time,
                lat: t.point.lat,
                lon: t.lon_180,
                wind: t.point.wind,
                nature: t.point.nature.clone(),
            });
        LandfallScope {
            any_landfall: first.is_some(),
            intensity: IntensityClass::classify_opt(first.as_ref().map(|f| f.wind)),
            first,
        }
    });

    Some(StormSummary {
        sid: sid.to_string(),
        start_time,
        end_time,
        start_year: start_time.year(),
        max_wind,
        n_track_points: rows.len(),
        mean_lat,
        mean_lon,
        peak_intensity: IntensityClass::classify(max_wind),
        region,
        landfall,
    })
}

fn max_wind<'a>(rows: impl Iterator<Item = &'a CleanTrack>) -> Option<f64> {
    rows.map(|t| OrderedFloat(t.point.wind)).max().map(|w| w.0)
}

fn max_wind_where(rows: &[&CleanTrack], keep: impl Fn(&CleanTrack) -> bool) -> Option<f64> {
    max_wind(rows.iter().copied().filter(|t| keep(t)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::track::TrackPoint;
    use chrono::NaiveDate;

    fn track(
        sid: &str,
        (year, day, hour): (i32, u32, u32),
        wind: f64,
        in_region: Option<bool>,
        on_land: Option<bool>,
    ) -> CleanTrack {
        let point = TrackPoint {
            sid: sid.to_string(),
            time: NaiveDate::from_ymd_opt(year, 12, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            lat: 10.0 + hour as f64,
            lon: 230.0,
            nature: Some("TS".to_string()),
            wind,
        };
        CleanTrack {
            lon_180: point.lon_180(),
            point,
            in_region,
            on_land,
        }
    }

    #[test]
    fn test_summary_fields_and_labels() {
        let mut tracks = vec![
            track("S1", (2000, 1, 12), 140.0, Some(false), Some(false)),
            track("S1", (2000, 1, 0), 40.0, Some(true), Some(false)),
            track("S1", (2000, 1, 6), 70.0, Some(true), Some(true)),
        ];
        sort_tracks(&mut tracks);
        assert_eq!(tracks[0].point.wind, 40.0);

        let storms = summarize_storms(&tracks, Scopes { region: true, landfall: true });
        assert_eq!(storms.len(), 1);
        let storm = &storms[0];
        assert_eq!(storm.n_track_points, 3);
        assert_eq!(storm.max_wind, 140.0);
        assert_eq!(storm.peak_intensity, IntensityClass::SuperTyphoon);
        assert!((storm.mean_lat - 16.0).abs() < 1e-9);
        assert!((storm.mean_lon + 130.0).abs() < 1e-9);

        let region = storm.region.as_ref().unwrap();
        assert_eq!(region.max_wind, Some(70.0));
        assert_eq!(region.peak_intensity, Some(IntensityClass::Typhoon));

        let landfall = storm.landfall.as_ref().unwrap();
        assert!(landfall.any_landfall);
        assert_eq!(landfall.first.as_ref().unwrap().wind, 70.0);
        assert_eq!(landfall.intensity, Some(IntensityClass::Typhoon));
    }

    #[test]
    fn test_scopes_left_missing_when_never_inside() {
        let tracks = vec![track("S1", (2000, 1, 0), 40.0, Some(false), Some(false))];
        let storms = summarize_storms(&tracks, Scopes { region: true, landfall: true });
        let storm = &storms[0];
        assert_eq!(storm.region.as_ref().unwrap().max_wind, None);
        assert_eq!(storm.region.as_ref().unwrap().peak_intensity, None);
        let landfall = storm.landfall.as_ref().unwrap();
        assert!(!landfall.any_landfall);
        assert!(landfall.first.is_none());
        assert_eq!(landfall.intensity, None);
    }

    #[test]
    fn test_unconfigured_scopes_are_absent() {
        let tracks = vec![track("S1", (2000, 1, 0), 40.0, None, None)];
        let storms = summarize_storms(&tracks, Scopes::default());
        assert!(storms[0].region.is_none());
        assert!(storms[0].landfall.is_none());
    }

    #[test]
    fn test_storms_sorted_by_start_year_then_sid() {
        let mut tracks = vec![
            track("A", (2001, 1, 0), 40.0, None, None),
            track("C", (2000, 1, 0), 40.0, None, None),
            track("B", (2000, 2, 0), 40.0, None, None),
            // Starts in its earliest observation's year
            track("D", (1999, 31, 18), 40.0, None, None),
            track("D", (2000, 1, 0), 40.0, None, None),
        ];
        sort_tracks(&mut tracks);
        let sids: Vec<String> = summarize_storms(&tracks, Scopes::default())
            .into_iter()
            .map(|s| s.sid)
            .collect();
        assert_eq!(sids, vec!["D", "B", "C", "A"]);
    }
}

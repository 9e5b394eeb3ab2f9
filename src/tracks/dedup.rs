//! Removal of repeated observations sharing `(SID, time, lat, lon)`.
//!
//! Longitudes are compared in the -180..180 convention, so the same position
//! written as 235 and -125 is one observation.

use crate::types::track::TrackPoint;
use chrono::NaiveDateTime;
use log::{debug, warn};
use ordered_float::OrderedFloat;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Which row survives when several observations share the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Keep the row with the highest wind; ties go to the earliest row.
    #[default]
    MaxWind,
    FirstOccurrence,
    LastOccurrence,
}

type DedupKey = (String, NaiveDateTime, OrderedFloat<f64>, OrderedFloat<f64>);

fn dedup_key(point: &TrackPoint) -> DedupKey {
    (
        point.sid.clone(),
        point.time,
        OrderedFloat(point.lat),
        OrderedFloat(point.lon_180()),
    )
}

#[derive(Debug, PartialEq)]
pub struct DedupOutcome<T> {
    pub points: Vec<T>,
    /// Rows removed as duplicates.
    pub removed: usize,
    /// Duplicate groups whose wind values disagreed.
    pub conflicting_groups: usize,
}

/// Collapses every duplicate group to a single row chosen by `policy`.
///
/// Surviving rows keep the position of the first row of their group.
pub fn deduplicate<T: AsRef<TrackPoint>>(
    points: Vec<T>,
    policy: DuplicatePolicy,
) -> DedupOutcome<T> {
    let total = points.len();
    let mut slots: HashMap<DedupKey, usize> = HashMap::with_capacity(total);
    let mut kept: Vec<T> = Vec::with_capacity(total);
    let mut conflicting: Vec<bool> = Vec::with_capacity(total);

    for point in points {
        match slots.entry(dedup_key(point.as_ref())) {
            Entry::Vacant(entry) => {
                entry.insert(kept.len());
                kept.push(point);
                conflicting.push(false);
            }
            Entry::Occupied(entry) => {
                let slot = *entry.get();
                let (current, candidate) = (kept[slot].as_ref().wind, point.as_ref().wind);
                if current != candidate {
                    conflicting[slot] = true;
                }
                let replace = match policy {
                    DuplicatePolicy::MaxWind => candidate > current,
                    DuplicatePolicy::FirstOccurrence => false,
                    DuplicatePolicy::LastOccurrence => true,
                };
                if replace {
                    kept[slot] = point;
                }
            }
        }
    }

    let removed = total - kept.len();
    let conflicting_groups = conflicting.iter().filter(|&&flag| flag).count();
    if conflicting_groups > 0 {
        warn!(
            "{} duplicate observation group(s) disagree on wind, resolved with {:?}",
            conflicting_groups, policy
        );
    }
    debug!("Removed {} duplicate track rows", removed);

    DedupOutcome {
        points: kept,
        removed,
        conflicting_groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(sid: &str, hour: u32, lat: f64, wind: f64) -> TrackPoint {
        TrackPoint {
            sid: sid.to_string(),
            time: NaiveDate::from_ymd_opt(2000, 8, 1)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            lat,
            lon: 125.0,
            nature: Some("TS".to_string()),
            wind,
        }
    }

    fn winds(outcome: &DedupOutcome<TrackPoint>) -> Vec<f64> {
        outcome.points.iter().map(|p| p.wind).collect()
    }

    fn sample() -> Vec<TrackPoint> {
        vec![
            point("A", 0, 10.0, 50.0),
            point("A", 0, 10.0, 70.0),
            point("A", 6, 11.0, 60.0),
            point("A", 0, 10.0, 65.0),
            point("B", 0, 10.0, 30.0),
        ]
    }

    #[test]
    fn test_max_wind_policy() {
        let outcome = deduplicate(sample(), DuplicatePolicy::MaxWind);
        assert_eq!(winds(&outcome), vec![70.0, 60.0, 30.0]);
        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.conflicting_groups, 1);
    }

    #[test]
    fn test_first_and_last_policies() {
        let first = deduplicate(sample(), DuplicatePolicy::FirstOccurrence);
        assert_eq!(winds(&first), vec![50.0, 60.0, 30.0]);
        let last = deduplicate(sample(), DuplicatePolicy::LastOccurrence);
        assert_eq!(winds(&last), vec![65.0, 60.0, 30.0]);
    }

    #[test]
    fn test_identical_duplicates_are_not_conflicts() {
        let points = vec![point("A", 0, 10.0, 40.0), point("A", 0, 10.0, 40.0)];
        let outcome = deduplicate(points, DuplicatePolicy::MaxWind);
        assert_eq!(outcome.points.len(), 1);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.conflicting_groups, 0);
    }

    #[test]
    fn test_different_positions_are_kept() {
        let points = vec![point("A", 0, 10.0, 40.0), point("A", 0, 10.5, 40.0)];
        assert_eq!(deduplicate(points, DuplicatePolicy::MaxWind).removed, 0);
    }
}

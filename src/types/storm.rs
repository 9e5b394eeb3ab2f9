//! Storm-level summary rows built from cleaned track observations.

use crate::types::intensity::IntensityClass;
use chrono::NaiveDateTime;

/// One row per storm, aggregated over its retained track points.
///
/// Scoped aggregates live in their own structs so a storm carries exactly the
/// scopes that were configured for the cleaning run. The lifetime, in-region
/// and first-landfall labels are computed independently and may disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct StormSummary {
    pub sid: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub start_year: i32,
    /// Lifetime maximum sustained wind (kt).
    pub max_wind: f64,
    pub n_track_points: usize,
    pub mean_lat: f64,
    /// Mean of the -180..180 longitudes.
    pub mean_lon: f64,
    /// Label of `max_wind`.
    pub peak_intensity: IntensityClass,
    /// Present when a region boundary was configured.
    pub region: Option<RegionScope>,
    /// Present when a landmass boundary was configured.
    pub landfall: Option<LandfallScope>,
}

/// Aggregates restricted to points inside the regional boundary (PAR).
#[derive(Debug, Clone, PartialEq)]
pub struct RegionScope {
    /// Maximum wind while inside the region; `None` if the storm never entered.
    pub max_wind: Option<f64>,
    pub peak_intensity: Option<IntensityClass>,
}

/// The first observation classified as on land.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstLandfall {
    pub time: NaiveDateTime,
    pub lat: f64,
    pub lon: f64,
    pub wind: f64,
    pub nature: Option<String>,
}

/// Aggregates describing the landmass crossing.
#[derive(Debug, Clone, PartialEq)]
pub struct LandfallScope {
    pub any_landfall: bool,
    pub first: Option<FirstLandfall>,
    /// Label of the wind at the first landfall point.
    pub intensity: Option<IntensityClass>,
}

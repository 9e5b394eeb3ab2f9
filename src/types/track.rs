//! Data structures for individual storm track observations.

use crate::geometry::LonConvention;
use chrono::{Datelike, NaiveDateTime};

/// One observation of one storm at one timestamp, after type coercion.
///
/// Every field the cleaning pipeline depends on is present; rows missing any of
/// them are dropped before a `TrackPoint` is built. `NATURE` is the only
/// optional attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    /// IBTrACS storm identifier (`SID`).
    pub sid: String,
    /// Observation time (`ISO_TIME`), UTC.
    pub time: NaiveDateTime,
    /// Latitude in degrees north.
    pub lat: f64,
    /// Longitude exactly as found in the source, either convention.
    pub lon: f64,
    /// Category code (`NATURE`), e.g. "TS".
    pub nature: Option<String>,
    /// Sustained wind speed in knots.
    pub wind: f64,
}

impl TrackPoint {
    pub fn year(&self) -> i32 {
        self.time.year()
    }

    /// Longitude wrapped into the -180..180 range.
    ///
    /// Only meaningful for points that passed position validation.
    pub fn lon_180(&self) -> f64 {
        LonConvention::Signed180.wrap(self.lon)
    }
}

/// A retained observation with its spatial memberships.
///
/// Membership flags are `None` when the corresponding boundary was not part of
/// the cleaning run.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanTrack {
    pub point: TrackPoint,
    pub lon_180: f64,
    pub in_region: Option<bool>,
    pub on_land: Option<bool>,
}

impl AsRef<TrackPoint> for TrackPoint {
    fn as_ref(&self) -> &TrackPoint {
        self
    }
}

impl AsRef<TrackPoint> for CleanTrack {
    fn as_ref(&self) -> &TrackPoint {
        &self.point
    }
}

//! Longitude conventions and the conversions between them.

use crate::geometry::error::BoundaryError;
use std::fmt;

/// The range a set of longitudes is expressed in.
///
/// IBTrACS stores some longitudes in 0..360 while most boundary files use
/// -180..180. Mixing the two silently produces wrong memberships, so every
/// [`crate::Boundary`] declares its convention and every point is normalized
/// into it before a containment test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LonConvention {
    /// Longitudes in `[-180, 180]`.
    #[default]
    Signed180,
    /// Longitudes in `[0, 360]`.
    Unsigned360,
}

impl LonConvention {
    /// Inclusive bounds of the convention.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            LonConvention::Signed180 => (-180.0, 180.0),
            LonConvention::Unsigned360 => (0.0, 360.0),
        }
    }

    /// Whether `lon` is already expressed in this convention.
    pub fn accepts(self, lon: f64) -> bool {
        let (min, max) = self.bounds();
        lon.is_finite() && lon >= min && lon <= max
    }

    /// Wraps a longitude from either convention into this one without
    /// validating it. Use [`LonConvention::normalize`] for untrusted input.
    pub fn wrap(self, lon: f64) -> f64 {
        match self {
            LonConvention::Signed180 if lon > 180.0 => lon - 360.0,
            LonConvention::Unsigned360 if lon < 0.0 => lon + 360.0,
            _ => lon,
        }
    }

    /// Validates that `lon` belongs to one of the two conventions
    /// (`[-180, 360]`) and wraps it into this one.
    pub fn normalize(self, lon: f64) -> Result<f64, BoundaryError> {
        if !is_valid_longitude(lon) {
            return Err(BoundaryError::InvalidLongitude(lon));
        }
        Ok(self.wrap(lon))
    }
}

/// A longitude expressible in either convention.
pub fn is_valid_longitude(lon: f64) -> bool {
    lon.is_finite() && (-180.0..=360.0).contains(&lon)
}

pub fn is_valid_latitude(lat: f64) -> bool {
    lat.is_finite() && (-90.0..=90.0).contains(&lat)
}

impl fmt::Display for LonConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LonConvention::Signed180 => f.write_str("-180..180"),
            LonConvention::Unsigned360 => f.write_str("0..360"),
        }
    }
}

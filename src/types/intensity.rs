//! Defines the `IntensityClass` enum, mapping sustained wind speeds (knots) to the
//! JTWC-style tropical cyclone categories used throughout the dashboard.

use std::fmt;
use std::str::FromStr;

/// Wind-based storm intensity class.
///
/// Thresholds are in knots and follow the Joint Typhoon Warning Center convention:
///
/// | Class | Wind (kt)   |
/// |-------|-------------|
/// | TD    | `< 34`      |
/// | TS    | `34 ..< 64` |
/// | TY    | `64 ..< 130`|
/// | STY   | `>= 130`    |
///
/// The ordering of the variants follows intensity, so `TD < TS < TY < STY`.
///
/// # Examples
///
/// ```rust
/// use island_storms::IntensityClass;
///
/// assert_eq!(IntensityClass::classify(70.0), IntensityClass::Typhoon);
/// assert_eq!(IntensityClass::classify_opt(None), None);
/// assert_eq!("sty ".parse::<IntensityClass>().ok(), Some(IntensityClass::SuperTyphoon));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntensityClass {
    /// TD: sustained wind below 34 kt.
    TropicalDepression,
    /// TS: sustained wind from 34 kt up to (not including) 64 kt.
    TropicalStorm,
    /// TY: sustained wind from 64 kt up to (not including) 130 kt.
    Typhoon,
    /// STY: sustained wind of 130 kt or more.
    SuperTyphoon,
}

/// Lower bound (inclusive) of the tropical storm class, in knots.
pub const TROPICAL_STORM_KT: f64 = 34.0;
/// Lower bound (inclusive) of the typhoon class, in knots.
pub const TYPHOON_KT: f64 = 64.0;
/// Lower bound (inclusive) of the super typhoon class, in knots.
pub const SUPER_TYPHOON_KT: f64 = 130.0;

impl IntensityClass {
    /// All classes, weakest first.
    pub const ALL: [IntensityClass; 4] = [
        IntensityClass::TropicalDepression,
        IntensityClass::TropicalStorm,
        IntensityClass::Typhoon,
        IntensityClass::SuperTyphoon,
    ];

    /// Classifies a sustained wind speed in knots.
    ///
    /// Non-decreasing in `wind`, with breakpoints exactly at 34, 64 and 130.
    pub fn classify(wind: f64) -> Self {
        if wind >= SUPER_TYPHOON_KT {
            IntensityClass::SuperTyphoon
        } else if wind >= TYPHOON_KT {
            IntensityClass::Typhoon
        } else if wind >= TROPICAL_STORM_KT {
            IntensityClass::TropicalStorm
        } else {
            IntensityClass::TropicalDepression
        }
    }

    /// Classifies an optional wind value. Missing (or NaN) wind stays unknown
    /// instead of falling into the lowest class.
    pub fn classify_opt(wind: Option<f64>) -> Option<Self> {
        wind.filter(|w| !w.is_nan()).map(Self::classify)
    }

    /// Short label as written to CSV (`TD`, `TS`, `TY`, `STY`).
    pub fn label(self) -> &'static str {
        match self {
            IntensityClass::TropicalDepression => "TD",
            IntensityClass::TropicalStorm => "TS",
            IntensityClass::Typhoon => "TY",
            IntensityClass::SuperTyphoon => "STY",
        }
    }

    /// Typhoon or super typhoon.
    pub fn is_severe(self) -> bool {
        self >= IntensityClass::Typhoon
    }
}

impl fmt::Display for IntensityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a string is not one of the four intensity labels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown intensity label '{0}'")]
pub struct ParseIntensityError(pub String);

impl FromStr for IntensityClass {
    type Err = ParseIntensityError;

    /// Parses a label case-insensitively, ignoring surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TD" => Ok(IntensityClass::TropicalDepression),
            "TS" => Ok(IntensityClass::TropicalStorm),
            "TY" => Ok(IntensityClass::Typhoon),
            "STY" => Ok(IntensityClass::SuperTyphoon),
            _ => Err(ParseIntensityError(s.to_string())),
        }
    }
}

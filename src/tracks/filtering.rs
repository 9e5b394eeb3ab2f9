use crate::constants::{COL_ISO_TIME, COL_LAT, COL_LON, COL_NATURE, COL_SID};
use polars::prelude::{col, lit, DataType, LazyFrame, NULL};

pub trait TrackFrameFilterExt {
    /// Casts `LAT`, `LON` and the wind column to `Float64`.
    ///
    /// The cast is non-strict: cells that do not parse as numbers (units rows,
    /// blanks, stray text) become null instead of failing the query.
    fn coerce_track_types(self, wind_column: &str) -> LazyFrame;

    /// Drops rows missing the storm identifier, timestamp, position or wind.
    /// A `NaN` or infinite number counts as missing.
    fn drop_incomplete(self, wind_column: &str) -> LazyFrame;

    /// Keeps rows whose `NATURE`, with surrounding whitespace removed, is one
    /// of `natures`.
    ///
    /// Rows with a missing category never match. An empty slice keeps nothing.
    fn filter_natures(self, natures: &[String]) -> LazyFrame;
}

impl TrackFrameFilterExt for LazyFrame {
    fn coerce_track_types(self, wind_column: &str) -> LazyFrame {
        self.with_columns([
            col(COL_LAT).cast(DataType::Float64),
            col(COL_LON).cast(DataType::Float64),
            col(wind_column).cast(DataType::Float64),
        ])
    }

    fn drop_incomplete(self, wind_column: &str) -> LazyFrame {
        self.filter(
            col(COL_SID)
                .is_not_null()
                .and(col(COL_ISO_TIME).is_not_null())
                .and(col(COL_LAT).is_finite())
                .and(col(COL_LON).is_finite())
                .and(col(wind_column).is_finite()),
        )
    }

    fn filter_natures(self, natures: &[String]) -> LazyFrame {
        let predicate = natures
            .iter()
            .map(|nature| {
                col(COL_NATURE)
                    .str()
                    .strip_chars(lit(NULL))
                    .eq(lit(nature.clone()))
            })
            .reduce(|acc, expr| acc.or(expr))
            .unwrap_or_else(|| lit(false));
        // Null NATURE compares as null, which the filter treats as false
        self.filter(predicate)
    }
}

//! Cleaning and analysis backend for a Philippine typhoon dashboard.
//!
//! * [`tracks`] turns raw IBTrACS track points into per-storm summaries for
//!   storms that entered PAR or made landfall on the Philippines.
//! * [`climate`] reshapes and merges ERA5 annual climate-index documents.
//! * [`dashboard`] loads the processed CSVs and computes the page views.

pub mod climate;
pub mod constants;
pub mod dashboard;
mod error;
pub mod geometry;
pub mod output;
pub mod tracks;
mod types;
mod utils;

pub use error::IslandStormsError;

pub use types::intensity::{IntensityClass, ParseIntensityError};
pub use types::storm::{FirstLandfall, LandfallScope, RegionScope, StormSummary};
pub use types::track::{CleanTrack, TrackPoint};

pub use geometry::error::BoundaryError;
pub use geometry::{Boundary, LonConvention};

pub use climate::{ClimateDocument, ClimateError, ClimateMergeConfig};
pub use dashboard::{Dashboard, DashboardError, DataSources, Page};
pub use output::CsvOutputError;
pub use tracks::{
    CleaningConfig, CleaningOutput, CleaningReport, DuplicatePolicy, Retention, StormPipeline,
    TrackError,
};

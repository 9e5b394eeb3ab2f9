use crate::climate::error::ClimateError;
use crate::dashboard::error::DashboardError;
use crate::geometry::error::BoundaryError;
use crate::output::CsvOutputError;
use crate::tracks::error::TrackError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IslandStormsError {
    #[error(transparent)]
    Boundary(#[from] BoundaryError),

    #[error(transparent)]
    Track(#[from] TrackError),

    #[error(transparent)]
    Climate(#[from] ClimateError),

    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    #[error(transparent)]
    Output(#[from] CsvOutputError),
}

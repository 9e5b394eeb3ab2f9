use crate::geometry::LonConvention;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("Boundary file not found: '{0}'")]
    FileNotFound(PathBuf),

    #[error("Failed to read boundary file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse GeoJSON")]
    GeoJsonParse(#[from] geojson::Error),

    #[error("GeoJSON contains no usable geometry: {0}")]
    MissingGeometry(String),

    #[error("Unsupported geometry type {0}, expected Polygon or MultiPolygon")]
    UnsupportedGeometry(&'static str),

    #[error("GeoJSON position has fewer than two coordinates")]
    MalformedPosition,

    #[error("Boundary '{0}' has no polygons")]
    Empty(String),

    #[error("Polygon ring in boundary '{name}' has {vertices} vertices, at least 3 are required")]
    DegeneratePolygon { name: String, vertices: usize },

    #[error("Vertex longitude {lon} of boundary '{name}' lies outside the {convention} convention")]
    ConventionMismatch {
        name: String,
        lon: f64,
        convention: LonConvention,
    },

    #[error("Longitude {0} is not a valid coordinate")]
    InvalidLongitude(f64),

    #[error("Latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),
}

//! Static boundary geometry and point-in-polygon membership.

use crate::geometry::convention::{is_valid_latitude, LonConvention};
use crate::geometry::error::BoundaryError;
use geo::{Intersects, LineString, MultiPolygon, Point, Polygon};
use geojson::{GeoJson, Value};
use log::info;
use std::path::Path;

/// Vertices of the Philippine Area of Responsibility as `(lon, lat)`, in the
/// -180..180 convention.
pub const PAR_VERTICES: [(f64, f64); 6] = [
    (120.0, 25.0),
    (135.0, 25.0),
    (135.0, 5.0),
    (115.0, 5.0),
    (115.0, 15.0),
    (120.0, 21.0),
];

/// A named, immutable set of simple polygons used for containment tests.
///
/// Only exterior rings are kept; holes are ignored. A point lies inside the
/// boundary when it lies inside *any* of its polygons.
///
/// Boundary inclusion policy: points exactly on an edge or a vertex count as
/// inside. This matches the inclusive `>=`/`<=` comparisons of a bounding-box
/// test and is the same for every boundary.
#[derive(Debug, Clone)]
pub struct Boundary {
    name: String,
    polygons: MultiPolygon<f64>,
    convention: LonConvention,
}

impl Boundary {
    /// Builds a boundary after validating every vertex against `convention`.
    pub fn new(
        name: impl Into<String>,
        polygons: MultiPolygon<f64>,
        convention: LonConvention,
    ) -> Result<Self, BoundaryError> {
        let name = name.into();
        if polygons.0.is_empty() {
            return Err(BoundaryError::Empty(name));
        }
        for polygon in polygons.iter() {
            let ring = polygon.exterior();
            let mut vertices = ring.0.len();
            if ring.is_closed() && vertices > 0 {
                vertices -= 1;
            }
            if vertices < 3 {
                return Err(BoundaryError::DegeneratePolygon { name, vertices });
            }
            for coord in ring.coords() {
                if !convention.accepts(coord.x) {
                    return Err(BoundaryError::ConventionMismatch {
                        name,
                        lon: coord.x,
                        convention,
                    });
                }
                if !is_valid_latitude(coord.y) {
                    return Err(BoundaryError::InvalidLatitude(coord.y));
                }
            }
        }
        Ok(Self {
            name,
            polygons,
            convention,
        })
    }

    /// Builds a single-polygon boundary from `(lon, lat)` vertices.
    pub fn from_vertices(
        name: impl Into<String>,
        vertices: &[(f64, f64)],
        convention: LonConvention,
    ) -> Result<Self, BoundaryError> {
        let ring = LineString::from(vertices.to_vec());
        let polygon = Polygon::new(ring, vec![]);
        Self::new(name, MultiPolygon::new(vec![polygon]), convention)
    }

    /// The hard-coded Philippine Area of Responsibility polygon.
    pub fn philippine_area_of_responsibility() -> Self {
        let ring = LineString::from(PAR_VERTICES.to_vec());
        Self {
            name: "PAR".to_string(),
            polygons: MultiPolygon::new(vec![Polygon::new(ring, vec![])]),
            convention: LonConvention::Signed180,
        }
    }

    /// Parses a GeoJSON document (FeatureCollection, Feature or bare geometry).
    ///
    /// For a FeatureCollection only the first feature is used. Polygon and
    /// MultiPolygon geometries are accepted; only their exterior rings are kept.
    pub fn from_geojson_str(
        name: impl Into<String>,
        geojson: &str,
        convention: LonConvention,
    ) -> Result<Self, BoundaryError> {
        let parsed: GeoJson = geojson.parse()?;
        let geometry = match parsed {
            GeoJson::FeatureCollection(collection) => collection
                .features
                .into_iter()
                .next()
                .ok_or_else(|| {
                    BoundaryError::MissingGeometry("FeatureCollection has no features".into())
                })?
                .geometry,
            GeoJson::Feature(feature) => feature.geometry,
            GeoJson::Geometry(geometry) => Some(geometry),
        }
        .ok_or_else(|| BoundaryError::MissingGeometry("feature has no geometry".into()))?;

        let polygons = match geometry.value {
            Value::Polygon(rings) => vec![exterior_polygon(&rings)?],
            Value::MultiPolygon(polys) => polys
                .iter()
                .map(|rings| exterior_polygon(rings))
                .collect::<Result<Vec<_>, _>>()?,
            other => return Err(BoundaryError::UnsupportedGeometry(geometry_type_name(&other))),
        };

        Self::new(name, MultiPolygon::new(polygons), convention)
    }

    /// Reads and parses a GeoJSON boundary file.
    pub async fn from_geojson_file(
        name: impl Into<String>,
        path: &Path,
        convention: LonConvention,
    ) -> Result<Self, BoundaryError> {
        if tokio::fs::metadata(path).await.is_err() {
            return Err(BoundaryError::FileNotFound(path.to_path_buf()));
        }
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BoundaryError::Read(path.to_path_buf(), e))?;
        let boundary = Self::from_geojson_str(name, &contents, convention)?;
        info!(
            "Loaded boundary '{}' with {} polygon(s) from {:?}",
            boundary.name,
            boundary.polygon_count(),
            path
        );
        Ok(boundary)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn convention(&self) -> LonConvention {
        self.convention
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.0.len()
    }

    /// Tests a single point. The longitude may be in either convention and is
    /// normalized into the boundary's convention first.
    pub fn contains(&self, lon: f64, lat: f64) -> Result<bool, BoundaryError> {
        if !is_valid_latitude(lat) {
            return Err(BoundaryError::InvalidLatitude(lat));
        }
        let lon = self.convention.normalize(lon)?;
        Ok(self.polygons.intersects(&Point::new(lon, lat)))
    }

    /// Tests a sequence of `(lon, lat)` points, returning one flag per point.
    ///
    /// Fails on the first point with an invalid coordinate rather than
    /// guessing a membership for it.
    pub fn membership(&self, points: &[(f64, f64)]) -> Result<Vec<bool>, BoundaryError> {
        points
            .iter()
            .map(|&(lon, lat)| self.contains(lon, lat))
            .collect()
    }
}

fn exterior_polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>, BoundaryError> {
    let exterior = rings
        .first()
        .ok_or_else(|| BoundaryError::MissingGeometry("polygon has no rings".into()))?;
    let coords = exterior
        .iter()
        .map(|position| match (position.first(), position.get(1)) {
            (Some(&x), Some(&y)) => Ok((x, y)),
            _ => Err(BoundaryError::MalformedPosition),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(LineString::from(coords), vec![]))
}

fn geometry_type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ISLANDS: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"name": "islands"},
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [
                    [[[120.0, 14.0], [122.0, 14.0], [122.0, 16.0], [120.0, 16.0], [120.0, 14.0]],
                     [[120.5, 14.5], [121.0, 14.5], [121.0, 15.0], [120.5, 15.0], [120.5, 14.5]]],
                    [[[124.0, 8.0], [126.0, 8.0], [126.0, 10.0], [124.0, 10.0], [124.0, 8.0]]]
                ]
            }
        }]
    }"#;

    #[test]
    fn test_par_interior_and_antipode() {
        let par = Boundary::philippine_area_of_responsibility();
        assert!(par.contains(125.0, 15.0).unwrap());
        assert!(!par.contains(-55.0, -15.0).unwrap());
        // West of the 21N-120E / 15N-115E edge
        assert!(!par.contains(116.0, 20.0).unwrap());
    }

    #[test]
    fn test_boundary_points_are_inside() {
        let par = Boundary::philippine_area_of_responsibility();
        assert!(par.contains(135.0, 10.0).unwrap());
        assert!(par.contains(120.0, 25.0).unwrap());
    }

    #[test]
    fn test_unsigned_points_against_signed_boundary() {
        let square = Boundary::from_vertices(
            "dateline",
            &[(170.0, -5.0), (180.0, -5.0), (180.0, 5.0), (170.0, 5.0)],
            LonConvention::Signed180,
        )
        .unwrap();
        let flags = square
            .membership(&[(175.0, 0.0), (185.0, 0.0), (-175.0, 0.0)])
            .unwrap();
        assert_eq!(flags, vec![true, false, false]);

        let wrapped = Boundary::from_vertices(
            "dateline-360",
            &[(170.0, -5.0), (190.0, -5.0), (190.0, 5.0), (170.0, 5.0)],
            LonConvention::Unsigned360,
        )
        .unwrap();
        assert_eq!(
            wrapped.membership(&[(-175.0, 0.0), (185.0, 0.0)]).unwrap(),
            vec![true, true]
        );
    }

    #[test]
    fn test_membership_rejects_invalid_points() {
        let par = Boundary::philippine_area_of_responsibility();
        assert!(matches!(
            par.membership(&[(125.0, 15.0), (400.0, 15.0)]),
            Err(BoundaryError::InvalidLongitude(_))
        ));
        assert!(matches!(
            par.contains(125.0, 95.0),
            Err(BoundaryError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_convention_mismatch_is_rejected() {
        let result = Boundary::from_vertices(
            "bad",
            &[(170.0, 0.0), (190.0, 0.0), (190.0, 5.0)],
            LonConvention::Signed180,
        );
        assert!(matches!(result, Err(BoundaryError::ConventionMismatch { .. })));
    }

    #[test]
    fn test_degenerate_polygon_is_rejected() {
        let result =
            Boundary::from_vertices("line", &[(120.0, 0.0), (121.0, 0.0)], LonConvention::Signed180);
        assert!(matches!(result, Err(BoundaryError::DegeneratePolygon { vertices: 2, .. })));
    }

    #[test]
    fn test_geojson_multipolygon_ignores_holes() {
        let land = Boundary::from_geojson_str("PH", TWO_ISLANDS, LonConvention::Signed180).unwrap();
        assert_eq!(land.polygon_count(), 2);
        // Inside the hole of the first polygon, still counted as land
        assert!(land.contains(120.75, 14.75).unwrap());
        assert!(land.contains(125.0, 9.0).unwrap());
        assert!(!land.contains(123.0, 12.0).unwrap());
    }

    #[test]
    fn test_geojson_rejects_non_polygons() {
        let point = r#"{"type": "Point", "coordinates": [120.0, 14.0]}"#;
        assert!(matches!(
            Boundary::from_geojson_str("p", point, LonConvention::Signed180),
            Err(BoundaryError::UnsupportedGeometry("Point"))
        ));

        let empty = r#"{"type": "FeatureCollection", "features": []}"#;
        assert!(matches!(
            Boundary::from_geojson_str("e", empty, LonConvention::Signed180),
            Err(BoundaryError::MissingGeometry(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_geojson_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Boundary::from_geojson_file(
            "PH",
            &dir.path().join("missing.geojson"),
            LonConvention::Signed180,
        )
        .await;
        assert!(matches!(result, Err(BoundaryError::FileNotFound(_))));
    }
}

//! Raw boundary geometry as it arrives in reference data, and its
//! conversion into normalized [`Polygon`] rings.
//!
//! Only outer rings are kept. Holes are dropped, which slightly
//! over-covers the rare precinct or sector that has one.

use precinct_map_jurisdiction_models::Polygon;
use serde::Deserialize;

use crate::projection;

/// A single raw vertex.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawVertex {
    /// A `[x, y, ...]` position. Components past the second are ignored.
    Position(Vec<f64>),
    /// An explicit `{ "latitude": .., "longitude": .. }` object.
    LatLng {
        latitude: f64,
        longitude: f64,
    },
}

impl RawVertex {
    /// Returns the vertex as an `(x, y)` pair in input order, i.e.
    /// `(longitude, latitude)` or `(easting, northing)`.
    #[must_use]
    pub fn as_pair(&self) -> Option<(f64, f64)> {
        match self {
            Self::Position(components) => match components.as_slice() {
                [x, y, ..] => Some((*x, *y)),
                _ => None,
            },
            Self::LatLng {
                latitude,
                longitude,
            } => Some((*longitude, *latitude)),
        }
    }
}

/// Polygon geometry in either single or multi-part form.
///
/// Each polygon is a list of rings; the first ring is the outer boundary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum RawGeometry {
    Polygon(Vec<Vec<RawVertex>>),
    MultiPolygon(Vec<Vec<Vec<RawVertex>>>),
}

impl RawGeometry {
    /// Converts a parsed `GeoJSON` geometry value. Non-polygonal
    /// geometry types yield `None`.
    #[must_use]
    pub fn from_geojson(value: &geojson::Value) -> Option<Self> {
        match value {
            geojson::Value::Polygon(rings) => Some(Self::Polygon(convert_rings(rings))),
            geojson::Value::MultiPolygon(polygons) => Some(Self::MultiPolygon(
                polygons.iter().map(|rings| convert_rings(rings)).collect(),
            )),
            _ => None,
        }
    }

    /// Outer ring of every polygon part, in order.
    #[must_use]
    pub fn outer_rings(&self) -> Vec<&[RawVertex]> {
        match self {
            Self::Polygon(rings) => rings.first().map(Vec::as_slice).into_iter().collect(),
            Self::MultiPolygon(polygons) => polygons
                .iter()
                .filter_map(|rings| rings.first().map(Vec::as_slice))
                .collect(),
        }
    }
}

fn convert_rings(rings: &[Vec<geojson::Position>]) -> Vec<Vec<RawVertex>> {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .map(|position| RawVertex::Position(position.iter().copied().collect()))
                .collect()
        })
        .collect()
}

/// Raw boundary for a precinct: either a bare vertex list or a geometry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawBoundary {
    Geometry(RawGeometry),
    Ring(Vec<RawVertex>),
}

impl RawBoundary {
    /// Normalizes the boundary into usable rings.
    #[must_use]
    pub fn load(&self) -> Vec<Polygon> {
        match self {
            Self::Geometry(geometry) => load(geometry),
            Self::Ring(vertices) => normalize_ring(vertices).into_iter().collect(),
        }
    }
}

/// Normalizes every outer ring of `geometry`.
///
/// Vertices that fail normalization are dropped. A ring left with fewer
/// than [`Polygon::MIN_VERTICES`] points is discarded.
#[must_use]
pub fn load(geometry: &RawGeometry) -> Vec<Polygon> {
    geometry
        .outer_rings()
        .into_iter()
        .filter_map(normalize_ring)
        .collect()
}

fn normalize_ring(vertices: &[RawVertex]) -> Option<Polygon> {
    let points: Vec<_> = vertices
        .iter()
        .filter_map(RawVertex::as_pair)
        .filter_map(|(x, y)| projection::normalize(x, y))
        .collect();

    let dropped = vertices.len() - points.len();
    if dropped > 0 {
        log::debug!("Dropped {dropped}/{} ring vertices outside metro bounds", vertices.len());
    }

    let polygon = Polygon(points);
    if polygon.is_usable() {
        Some(polygon)
    } else {
        log::debug!(
            "Discarding ring with {} usable vertices (need {})",
            polygon.len(),
            Polygon::MIN_VERTICES
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use precinct_map_jurisdiction_models::GeoPoint;

    use super::*;
    use crate::contains_point;

    fn square(x0: f64, y0: f64, size: f64) -> serde_json::Value {
        serde_json::json!([
            [x0, y0],
            [x0 + size, y0],
            [x0 + size, y0 + size],
            [x0, y0 + size],
            [x0, y0]
        ])
    }

    #[test]
    fn parses_polygon_and_keeps_outer_ring_only() {
        let json = serde_json::json!({
            "type": "Polygon",
            "coordinates": [square(-73.99, 40.70, 0.02), square(-73.985, 40.705, 0.005)]
        });
        let geometry: RawGeometry = serde_json::from_value(json).unwrap();
        let rings = load(&geometry);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 5);
        assert!((rings[0].vertices()[1].longitude - -73.97).abs() < 1e-12);
    }

    #[test]
    fn multipolygon_yields_one_ring_per_part() {
        let json = serde_json::json!({
            "type": "MultiPolygon",
            "coordinates": [
                [square(-73.99, 40.70, 0.01)],
                [square(-73.90, 40.80, 0.01)]
            ]
        });
        let geometry: RawGeometry = serde_json::from_value(json).unwrap();
        assert_eq!(load(&geometry).len(), 2);
    }

    #[test]
    fn ring_with_too_few_valid_points_is_discarded() {
        let json = serde_json::json!({
            "type": "Polygon",
            "coordinates": [[[-73.99, 40.70], [-73.98, 40.70], [-87.6, 41.8], [-87.7, 41.9]]]
        });
        let geometry: RawGeometry = serde_json::from_value(json).unwrap();
        assert!(load(&geometry).is_empty());
    }

    #[test]
    fn invalid_points_are_dropped_from_surviving_rings() {
        let json = serde_json::json!({
            "type": "Polygon",
            "coordinates": [[
                [-73.99, 40.70], [-73.98, 40.70], [-73.98, 40.71], [0.0, 0.0], [-73.99, 40.71]
            ]]
        });
        let geometry: RawGeometry = serde_json::from_value(json).unwrap();
        let rings = load(&geometry);
        assert_eq!(rings[0].len(), 4);
    }

    #[test]
    fn raw_boundary_accepts_lat_lng_objects() {
        let json = serde_json::json!([
            {"latitude": 40.70, "longitude": -73.99},
            {"latitude": 40.70, "longitude": -73.98},
            {"latitude": 40.71, "longitude": -73.98}
        ]);
        let boundary: RawBoundary = serde_json::from_value(json).unwrap();
        let rings = boundary.load();
        assert_eq!(rings.len(), 1);
        assert!((rings[0].vertices()[2].latitude - 40.71).abs() < 1e-12);
    }

    #[test]
    fn raw_boundary_accepts_geometry_object() {
        let json = serde_json::json!({
            "type": "MultiPolygon",
            "coordinates": [[square(-73.99, 40.70, 0.01)]]
        });
        let boundary: RawBoundary = serde_json::from_value(json).unwrap();
        assert!(matches!(boundary, RawBoundary::Geometry(_)));
        assert_eq!(boundary.load().len(), 1);
    }

    #[test]
    fn converts_geojson_values() {
        let geometry: geojson::Geometry = serde_json::from_value(serde_json::json!({
            "type": "Polygon",
            "coordinates": [square(-73.99, 40.70, 0.01)]
        }))
        .unwrap();
        let raw = RawGeometry::from_geojson(&geometry.value).unwrap();
        assert_eq!(raw.outer_rings().len(), 1);

        let point: geojson::Geometry = serde_json::from_value(serde_json::json!({
            "type": "Point",
            "coordinates": [-73.99, 40.70]
        }))
        .unwrap();
        assert!(RawGeometry::from_geojson(&point.value).is_none());
    }

    fn near_edge(ring: &Polygon, lng: f64, lat: f64) -> bool {
        let vertices = ring.vertices();
        (0..vertices.len()).any(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % vertices.len()];
            let (dx, dy) = (b.longitude - a.longitude, b.latitude - a.latitude);
            let t = (((lng - a.longitude) * dx + (lat - a.latitude) * dy) / dx.hypot(dy).powi(2))
                .clamp(0.0, 1.0);
            let (px, py) = (a.longitude + t * dx, a.latitude + t * dy);
            (lng - px).hypot(lat - py) < 1e-7
        })
    }

    #[test]
    fn state_plane_ring_contains_same_points_as_degree_ring() {
        let degrees = [
            (-74.000, 40.740),
            (-73.975, 40.742),
            (-73.968, 40.758),
            (-73.981, 40.771),
            (-73.992, 40.760),
            (-73.986, 40.752),
        ];
        let degree_ring: Vec<RawVertex> = degrees
            .iter()
            .map(|&(lng, lat)| RawVertex::Position(vec![lng, lat]))
            .collect();
        let feet_ring: Vec<RawVertex> = degrees
            .iter()
            .map(|&(lng, lat)| {
                let (x, y) = projection::project(lng, lat).unwrap();
                assert!(x > 180.0 && y > 90.0);
                RawVertex::Position(vec![x, y])
            })
            .collect();

        let from_degrees = load(&RawGeometry::Polygon(vec![degree_ring]));
        let from_feet = load(&RawGeometry::Polygon(vec![feet_ring]));
        assert_eq!(from_degrees.len(), 1);
        assert_eq!(from_feet.len(), 1);

        let mut inside = 0;
        for i in 0..50 {
            for j in 0..50 {
                let lng = f64::from(i).mul_add(0.000_7, -74.003);
                let lat = f64::from(j).mul_add(0.000_7, 40.737);
                if near_edge(&from_degrees[0], lng, lat) {
                    continue;
                }
                let point = GeoPoint::new(lat, lng);
                let expected = contains_point(point, &from_degrees[0]);
                assert_eq!(
                    contains_point(point, &from_feet[0]),
                    expected,
                    "disagreement at {lat}, {lng}"
                );
                inside += usize::from(expected);
            }
        }
        assert!(inside > 0);
    }

    #[test]
    fn short_positions_are_ignored() {
        assert_eq!(RawVertex::Position(vec![1.0]).as_pair(), None);
        assert_eq!(
            RawVertex::Position(vec![1.0, 2.0, 3.0]).as_pair(),
            Some((1.0, 2.0))
        );
    }
}

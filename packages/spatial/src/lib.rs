#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory boundary geometry for precinct and sector attribution.
//!
//! Raw boundary vertices are normalized to WGS84 at load time
//! ([`projection`]), outer rings are extracted from single or
//! multi-part geometry ([`geometry`]), and the resulting rings are
//! bulk-loaded into an R-tree keyed by bounding box. Lookups use the
//! R-tree as a cheap rejection test and an even-odd ray-casting test
//! for the final answer.

pub mod geometry;
pub mod projection;

use geo::BoundingRect;
use precinct_map_jurisdiction_models::{BoundingBox, GeoPoint, Polygon};
use rstar::{AABB, RTree, RTreeObject};

pub use geometry::{RawBoundary, RawGeometry, RawVertex};
pub use projection::normalize;

/// Mean Earth radius used for great-circle distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Computes the bounding box of a ring's vertices.
///
/// Returns `None` for an empty ring. A single-vertex ring collapses to
/// a zero-area box.
#[must_use]
pub fn bounding_box_of(polygon: &Polygon) -> Option<BoundingBox> {
    let line: geo::LineString<f64> = polygon
        .vertices()
        .iter()
        .map(|p| (p.longitude, p.latitude))
        .collect::<Vec<_>>()
        .into();

    line.bounding_rect().map(|rect| BoundingBox {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lng: rect.min().x,
        max_lng: rect.max().x,
    })
}

/// Even-odd ray-casting containment test.
///
/// Casts a horizontal ray from `point` and counts edge crossings. Points
/// exactly on an edge or vertex fall wherever the crossing arithmetic
/// puts them.
#[must_use]
pub fn contains_point(point: GeoPoint, polygon: &Polygon) -> bool {
    let vertices = polygon.vertices();
    let x = point.longitude;
    let y = point.latitude;

    let mut inside = false;
    let mut j = vertices.len().wrapping_sub(1);
    for (i, vi) in vertices.iter().enumerate() {
        let vj = &vertices[j];
        let (xi, yi) = (vi.longitude, vi.latitude);
        let (xj, yj) = (vj.longitude, vj.latitude);

        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Great-circle distance in kilometres (haversine formula).
#[must_use]
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Index of the candidate closest to `point`.
///
/// Ties keep the earliest candidate. Candidates whose distance is not
/// finite are skipped.
#[must_use]
pub fn nearest_index<I>(point: GeoPoint, candidates: I) -> Option<usize>
where
    I: IntoIterator<Item = GeoPoint>,
{
    let mut best: Option<(usize, f64)> = None;

    for (idx, candidate) in candidates.into_iter().enumerate() {
        let distance = haversine_km(point, candidate);
        if !distance.is_finite() {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((idx, distance)),
        }
    }

    best.map(|(idx, _)| idx)
}

/// A ring stored in the R-tree along with the record that owns it.
struct RingEntry {
    /// Insertion order across the whole index; lower wins.
    ordinal: usize,
    /// Index of the owning record in the caller's table.
    owner: usize,
    envelope: AABB<[f64; 2]>,
    ring: Polygon,
}

impl RTreeObject for RingEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Immutable R-tree of boundary rings.
///
/// Built once from `(owner, ring)` pairs. Queries are read-only, so a
/// shared reference can serve any number of concurrent lookups.
pub struct RingIndex {
    tree: RTree<RingEntry>,
}

impl RingIndex {
    /// Bulk-loads rings. `owner` is an index into whatever table the
    /// caller keeps (precincts, sectors); insertion order decides which
    /// ring wins when several contain a point.
    #[must_use]
    pub fn build<I>(rings: I) -> Self
    where
        I: IntoIterator<Item = (usize, Polygon)>,
    {
        let entries: Vec<RingEntry> = rings
            .into_iter()
            .filter(|(_, ring)| ring.is_usable())
            .enumerate()
            .filter_map(|(ordinal, (owner, ring))| {
                let bbox = bounding_box_of(&ring)?;
                Some(RingEntry {
                    ordinal,
                    owner,
                    envelope: AABB::from_corners(
                        [bbox.min_lng, bbox.min_lat],
                        [bbox.max_lng, bbox.max_lat],
                    ),
                    ring,
                })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of rings in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Owner of the earliest-inserted ring containing `point`.
    #[must_use]
    pub fn first_containing(&self, point: GeoPoint) -> Option<usize> {
        self.candidates(point)
            .filter(|entry| contains_point(point, &entry.ring))
            .min_by_key(|entry| entry.ordinal)
            .map(|entry| entry.owner)
    }

    fn candidates(&self, point: GeoPoint) -> impl Iterator<Item = &RingEntry> {
        let query_env = AABB::from_point([point.longitude, point.latitude]);
        self.tree.locate_in_envelope_intersecting(&query_env)
    }
}

#[cfg(test)]
mod tests {
    use geo::Contains;

    use super::*;

    fn ring(coords: &[(f64, f64)]) -> Polygon {
        Polygon(
            coords
                .iter()
                .map(|&(lng, lat)| GeoPoint::new(lat, lng))
                .collect(),
        )
    }

    fn square(lng: f64, lat: f64, size: f64) -> Polygon {
        ring(&[
            (lng, lat),
            (lng + size, lat),
            (lng + size, lat + size),
            (lng, lat + size),
        ])
    }

    #[test]
    fn bounding_box_is_min_max_reduction() {
        let bbox = bounding_box_of(&ring(&[(-74.0, 40.7), (-73.9, 40.6), (-73.95, 40.8)])).unwrap();
        assert!((bbox.min_lat - 40.6).abs() < f64::EPSILON);
        assert!((bbox.max_lat - 40.8).abs() < f64::EPSILON);
        assert!((bbox.min_lng - -74.0).abs() < f64::EPSILON);
        assert!((bbox.max_lng - -73.9).abs() < f64::EPSILON);
    }

    #[test]
    fn bounding_box_of_single_point_collapses() {
        let bbox = bounding_box_of(&ring(&[(-74.0, 40.7)])).unwrap();
        assert!((bbox.min_lat - bbox.max_lat).abs() < f64::EPSILON);
        assert!((bbox.min_lng - bbox.max_lng).abs() < f64::EPSILON);
        assert!(bounding_box_of(&Polygon::default()).is_none());
    }

    #[test]
    fn contains_point_inside_and_outside_square() {
        let sq = square(-74.0, 40.7, 0.1);
        assert!(contains_point(GeoPoint::new(40.75, -73.95), &sq));
        assert!(!contains_point(GeoPoint::new(40.85, -73.95), &sq));
        assert!(!contains_point(GeoPoint::new(40.75, -74.05), &sq));
    }

    #[test]
    fn contains_point_handles_concave_ring() {
        // U shape opening north
        let u = ring(&[
            (0.0, 0.0),
            (3.0, 0.0),
            (3.0, 3.0),
            (2.0, 3.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 3.0),
            (0.0, 3.0),
        ]);
        assert!(contains_point(GeoPoint::new(2.0, 0.5), &u));
        assert!(!contains_point(GeoPoint::new(2.0, 1.5), &u));
        assert!(contains_point(GeoPoint::new(2.0, 2.5), &u));
    }

    #[test]
    fn closed_and_open_rings_agree() {
        let open = square(-74.0, 40.7, 0.1);
        let mut closed = open.clone();
        closed.0.push(closed.0[0]);
        for &(lat, lng) in &[(40.75, -73.95), (40.69, -73.95), (40.79, -73.91)] {
            let p = GeoPoint::new(lat, lng);
            assert_eq!(contains_point(p, &open), contains_point(p, &closed));
        }
    }

    #[test]
    fn ray_casting_agrees_with_geo_on_interior_and_exterior_points() {
        let coords = [
            (-74.01, 40.70),
            (-73.97, 40.71),
            (-73.96, 40.75),
            (-73.99, 40.76),
            (-74.00, 40.73),
            (-74.02, 40.74),
        ];
        let ours = ring(&coords);
        let theirs = geo::Polygon::new(geo::LineString::from(coords.to_vec()), vec![]);

        for i in 0..40 {
            for j in 0..40 {
                let lng = -74.03 + f64::from(i) * 0.0019;
                let lat = 40.69 + f64::from(j) * 0.0019;
                let expected = theirs.contains(&geo::Point::new(lng, lat));
                assert_eq!(
                    contains_point(GeoPoint::new(lat, lng), &ours),
                    expected,
                    "disagreement at ({lng}, {lat})"
                );
            }
        }
    }

    #[test]
    fn degenerate_rings_contain_nothing() {
        assert!(!contains_point(GeoPoint::new(0.0, 0.0), &Polygon::default()));
        assert!(!contains_point(GeoPoint::new(40.7, -74.0), &ring(&[(-74.0, 40.7)])));
    }

    #[test]
    fn haversine_matches_known_distance() {
        // Times Square to Brooklyn Bridge
        let d = haversine_km(GeoPoint::new(40.7580, -73.9855), GeoPoint::new(40.7061, -73.9969));
        assert!((d - 5.850).abs() < 0.005, "distance {d}");
        assert!(haversine_km(GeoPoint::new(40.0, -74.0), GeoPoint::new(40.0, -74.0)).abs() < 1e-12);
    }

    #[test]
    fn nearest_index_breaks_ties_by_first() {
        let p = GeoPoint::new(40.0, -74.0);
        let candidates = [
            GeoPoint::new(41.0, -74.0),
            GeoPoint::new(40.5, -74.0),
            GeoPoint::new(39.5, -74.0),
        ];
        assert_eq!(nearest_index(p, candidates), Some(1));
        assert_eq!(nearest_index(p, []), None);
    }

    #[test]
    fn nearest_index_skips_non_finite() {
        let p = GeoPoint::new(40.0, -74.0);
        let candidates = [GeoPoint::new(f64::NAN, -74.0), GeoPoint::new(45.0, -74.0)];
        assert_eq!(nearest_index(p, candidates), Some(1));
    }

    #[test]
    fn ring_index_returns_first_inserted_match() {
        let index = RingIndex::build([
            (7, square(-74.0, 40.7, 0.1)),
            (3, square(-73.95, 40.75, 0.1)),
            (9, square(-73.5, 40.0, 0.1)),
        ]);
        assert_eq!(index.len(), 3);

        let overlap = GeoPoint::new(40.77, -73.93);
        assert_eq!(index.first_containing(overlap), Some(7));

        assert_eq!(index.first_containing(GeoPoint::new(40.82, -73.87)), Some(3));
        assert_eq!(index.first_containing(GeoPoint::new(41.5, -73.0)), None);
    }

    #[test]
    fn ring_index_skips_unusable_rings() {
        let index = RingIndex::build([(0, ring(&[(-74.0, 40.7), (-73.9, 40.7)]))]);
        assert!(index.is_empty());
        assert_eq!(index.first_containing(GeoPoint::new(40.7, -73.95)), None);
    }

    #[test]
    fn multi_part_owner_matches_either_part() {
        let index = RingIndex::build([
            (0, square(-74.0, 40.7, 0.01)),
            (0, square(-73.8, 40.8, 0.01)),
            (1, square(-73.9, 40.6, 0.01)),
        ]);
        assert_eq!(index.first_containing(GeoPoint::new(40.705, -73.995)), Some(0));
        assert_eq!(index.first_containing(GeoPoint::new(40.805, -73.795)), Some(0));
        assert_eq!(index.first_containing(GeoPoint::new(40.605, -73.895)), Some(1));
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Precinct, sector, and coordinate types.
//!
//! These are the read-mostly reference records the resolver works over.
//! They are built once at load time and never mutated afterwards, so
//! every type here is plain data with no interior mutability.

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeoPoint {
    /// Origin used as the last resort for a missing centroid.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` if both components are finite and within the
    /// valid degree ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Axis-aligned latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// Bounds a normalized boundary vertex must fall inside to be kept.
pub const METRO_BOUNDS: BoundingBox = BoundingBox {
    min_lat: 40.45,
    max_lat: 40.95,
    min_lng: -74.35,
    max_lng: -73.60,
};

/// Tighter bounds applied to forward-geocoded addresses.
pub const GEOCODE_BOUNDS: BoundingBox = BoundingBox {
    min_lat: 40.49,
    max_lat: 40.92,
    min_lng: -74.26,
    max_lng: -73.70,
};

impl BoundingBox {
    /// A zero-area box at a single point.
    #[must_use]
    pub const fn collapsed(point: GeoPoint) -> Self {
        Self {
            min_lat: point.latitude,
            max_lat: point.latitude,
            min_lng: point.longitude,
            max_lng: point.longitude,
        }
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
    }

    /// Same as [`Self::contains`] but takes raw components.
    #[must_use]
    pub fn contains_lat_lng(&self, latitude: f64, longitude: f64) -> bool {
        self.contains(GeoPoint::new(latitude, longitude))
    }

    #[must_use]
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Smallest box covering both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lng: self.min_lng.min(other.min_lng),
            max_lng: self.max_lng.max(other.max_lng),
        }
    }

    /// Formats the box as the `south,west|north,east` pair used by
    /// geocoding viewport biasing.
    #[must_use]
    pub fn to_viewport_param(&self) -> String {
        format!(
            "{},{}|{},{}",
            self.min_lat, self.min_lng, self.max_lat, self.max_lng
        )
    }
}

/// An open ring of vertices (the first vertex is not repeated at the end).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon(pub Vec<GeoPoint>);

impl Polygon {
    /// Minimum number of vertices for a ring to enclose an area.
    pub const MIN_VERTICES: usize = 3;

    #[must_use]
    pub fn vertices(&self) -> &[GeoPoint] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the ring has enough vertices to be used for containment.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.0.len() >= Self::MIN_VERTICES
    }
}

/// Opening hours for a single weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayHours {
    /// Weekday label (e.g. "Sunday").
    pub day: String,
    /// Free-form hours text (e.g. "Open 24 hours").
    pub hours: String,
    pub is_open: bool,
}

/// An NYPD precinct with its boundary and derived geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Precinct {
    /// Unique, always positive.
    pub precinct_num: u32,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub borough: String,
    /// Station house location, when known.
    pub station: Option<GeoPoint>,
    /// Boundary parts. Most precincts have one; multi-part geometry
    /// yields one entry per outer ring.
    pub boundary: Vec<Polygon>,
    /// Representative point for nearest-neighbour fallback. Always finite.
    pub centroid: GeoPoint,
    pub bounding_box: BoundingBox,
    /// Seven entries indexed by weekday (0 = Sunday) when present.
    pub opening_hours: Vec<DayHours>,
}

impl Precinct {
    /// Name used when the reference data has none, e.g. "22nd Precinct".
    #[must_use]
    pub fn default_name(precinct_num: u32) -> String {
        format!("{precinct_num}{} Precinct", ordinal_suffix(precinct_num))
    }

    /// Point a map should focus on: the station house, else the centroid.
    #[must_use]
    pub fn focus_point(&self) -> GeoPoint {
        self.station.unwrap_or(self.centroid)
    }
}

/// English ordinal suffix for a number ("st", "nd", "rd", "th").
#[must_use]
pub const fn ordinal_suffix(n: u32) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Optional descriptive attributes carried by sector features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorMetadata {
    pub patrol_borough: Option<String>,
    pub phase: Option<String>,
    /// Area in square miles.
    pub sq_miles: Option<f64>,
    pub sector_indicator: Option<String>,
    pub start_date: Option<String>,
}

/// A patrol sector ring.
///
/// `sector_id` is only unique within its precinct, and a sector split
/// across several polygons is stored as several `Sector` entries sharing
/// the same `(precinct_num, sector_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    pub sector_id: String,
    pub precinct_num: u32,
    pub boundary: Polygon,
    pub bounding_box: BoundingBox,
    #[serde(flatten)]
    pub metadata: SectorMetadata,
}

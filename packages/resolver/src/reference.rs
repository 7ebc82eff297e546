//! Reference data loading.
//!
//! The resolver consumes static tables from a data directory:
//!
//! | File | Contents |
//! |---|---|
//! | `precincts.json` | precinct attributes, as a list or a map keyed by number |
//! | `precinct_boundaries.json` | map from precinct number to vertex list or geometry |
//! | `precinct_locations.json` | recorded precinct centroids (`{num, lat, lng}`) |
//! | `sectors.geojson` | sector `FeatureCollection` with `pct` and `sector` properties |
//! | `squads.json` | duty squads |
//! | `rdo_schedules.json` | one RDO schedule per squad |
//!
//! Only `precincts.json` is required. Individual malformed records are
//! skipped with a warning rather than failing the whole load.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use geojson::GeoJson;
use precinct_map_jurisdiction_models::{
    BoundingBox, DayHours, GeoPoint, Polygon, Precinct, Sector, SectorMetadata,
};
use precinct_map_schedule_models::{RdoSchedule, Squad};
use precinct_map_spatial::{RawBoundary, RawGeometry, bounding_box_of, geometry};
use serde::{Deserialize, de::DeserializeOwned};

use crate::LoadError;

pub const PRECINCTS_FILE: &str = "precincts.json";
pub const PRECINCT_BOUNDARIES_FILE: &str = "precinct_boundaries.json";
pub const PRECINCT_LOCATIONS_FILE: &str = "precinct_locations.json";
pub const SECTORS_FILE: &str = "sectors.geojson";
pub const SQUADS_FILE: &str = "squads.json";
pub const RDO_SCHEDULES_FILE: &str = "rdo_schedules.json";

/// All tables, normalized and ready to index.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub precincts: Vec<Precinct>,
    pub sectors: Vec<Sector>,
    pub squads: Vec<Squad>,
    pub schedules: Vec<RdoSchedule>,
}

impl ReferenceData {
    /// Loads every table from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if `precincts.json` is missing, or any
    /// present file cannot be read or is not valid JSON / `GeoJSON` at
    /// the top level.
    pub fn load_dir(dir: &Path) -> Result<Self, LoadError> {
        let precincts_json = std::fs::read_to_string(dir.join(PRECINCTS_FILE)).inspect_err(|e| {
            log::error!("Failed to read {}: {e}", dir.join(PRECINCTS_FILE).display());
        })?;
        let boundaries_json = read_optional(dir, PRECINCT_BOUNDARIES_FILE)?;
        let locations_json = read_optional(dir, PRECINCT_LOCATIONS_FILE)?;

        let precincts = parse_precincts(
            &precincts_json,
            boundaries_json.as_deref(),
            locations_json.as_deref(),
        )?;

        let sectors = match read_optional(dir, SECTORS_FILE)? {
            Some(text) => parse_sectors(&text)?,
            None => Vec::new(),
        };
        let squads = match read_optional(dir, SQUADS_FILE)? {
            Some(text) => parse_records(&text, SQUADS_FILE)?,
            None => Vec::new(),
        };
        let schedules = match read_optional(dir, RDO_SCHEDULES_FILE)? {
            Some(text) => parse_records(&text, RDO_SCHEDULES_FILE)?,
            None => Vec::new(),
        };

        log::info!(
            "Loaded {} precincts, {} sector rings, {} squads, {} RDO schedules from {}",
            precincts.len(),
            sectors.len(),
            squads.len(),
            schedules.len(),
            dir.display()
        );

        Ok(Self {
            precincts,
            sectors,
            squads,
            schedules,
        })
    }
}

fn read_optional(dir: &Path, file: &str) -> Result<Option<String>, LoadError> {
    let path = dir.join(file);
    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("{} not found; continuing without it", path.display());
            Ok(None)
        }
        Err(e) => {
            log::error!("Failed to read {}: {e}", path.display());
            Err(e.into())
        }
    }
}

/// A number that may arrive as JSON number or numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

impl RawNumber {
    fn from_json(value: &serde_json::Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }

    fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// A strictly positive whole number that fits in `u32`.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::float_cmp
    )]
    fn as_positive_u32(&self) -> Option<u32> {
        let value = self.as_f64()?;
        (value > 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX))
            .then_some(value as u32)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPrecinct {
    precinct_num: Option<RawNumber>,
    name: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    borough: Option<String>,
    /// Station house latitude.
    latitude: Option<RawNumber>,
    /// Station house longitude.
    longitude: Option<RawNumber>,
    #[serde(default)]
    opening_hours: Vec<DayHours>,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    num: RawNumber,
    lat: Option<RawNumber>,
    lng: Option<RawNumber>,
}

/// The precincts table is either a list or an object keyed by number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrecinctTable {
    List(Vec<serde_json::Value>),
    Map(BTreeMap<String, serde_json::Value>),
}

impl RawPrecinctTable {
    /// Records in load order. Map entries are ordered by numeric key,
    /// then non-numeric keys lexically.
    fn into_records(self) -> Vec<serde_json::Value> {
        match self {
            Self::List(records) => records,
            Self::Map(map) => {
                let mut entries: Vec<(String, serde_json::Value)> = map.into_iter().collect();
                entries.sort_by_key(|(key, _)| (key.parse::<u64>().unwrap_or(u64::MAX), key.clone()));
                entries.into_iter().map(|(_, value)| value).collect()
            }
        }
    }
}

/// A partially known coordinate. Each axis is finite or absent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisPair {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl AxisPair {
    #[must_use]
    pub fn new(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        Self {
            latitude: latitude.filter(|v| v.is_finite()),
            longitude: longitude.filter(|v| v.is_finite()),
        }
    }

    /// A full point, if both axes are known.
    #[must_use]
    pub fn point(self) -> Option<GeoPoint> {
        Some(GeoPoint::new(self.latitude?, self.longitude?))
    }
}

/// Where a precinct centroid axis came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CentroidSource {
    /// The recorded precinct location.
    Recorded,
    /// The station house coordinate.
    Station,
    /// Center of the boundary's bounding box.
    BoundingBoxCenter,
    /// `0.0`, when nothing else is known.
    Origin,
}

/// Evaluation order for each centroid axis.
pub const CENTROID_CHAIN: [CentroidSource; 4] = [
    CentroidSource::Recorded,
    CentroidSource::Station,
    CentroidSource::BoundingBoxCenter,
    CentroidSource::Origin,
];

/// Everything a centroid may be derived from.
#[derive(Debug, Clone, Copy, Default)]
pub struct CentroidInputs {
    pub recorded: AxisPair,
    pub station: AxisPair,
    pub bounding_box: Option<BoundingBox>,
}

impl CentroidSource {
    fn axes(self, inputs: &CentroidInputs) -> AxisPair {
        match self {
            Self::Recorded => inputs.recorded,
            Self::Station => inputs.station,
            Self::BoundingBoxCenter => inputs.bounding_box.map_or_else(AxisPair::default, |b| {
                let center = b.center();
                AxisPair::new(Some(center.latitude), Some(center.longitude))
            }),
            Self::Origin => AxisPair::new(Some(0.0), Some(0.0)),
        }
    }
}

/// Derives a finite centroid, choosing each axis independently from the
/// first source in [`CENTROID_CHAIN`] that knows it.
///
/// Returns the point and the `(latitude, longitude)` sources used.
#[must_use]
pub fn derive_centroid(inputs: &CentroidInputs) -> (GeoPoint, (CentroidSource, CentroidSource)) {
    let pick = |axis: fn(AxisPair) -> Option<f64>| {
        CENTROID_CHAIN
            .iter()
            .find_map(|source| axis(source.axes(inputs)).map(|v| (v, *source)))
            .unwrap_or((0.0, CentroidSource::Origin))
    };
    let (latitude, lat_source) = pick(|a| a.latitude);
    let (longitude, lng_source) = pick(|a| a.longitude);
    (GeoPoint::new(latitude, longitude), (lat_source, lng_source))
}

fn parse_records<T: DeserializeOwned>(text: &str, table: &str) -> Result<Vec<T>, LoadError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(text)?;
    let total = values.len();
    let records: Vec<T> = values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| {
            serde_json::from_value(value)
                .inspect_err(|e| log::warn!("Skipping {table} record {i}: {e}"))
                .ok()
        })
        .collect();
    if records.len() < total {
        log::warn!("{table}: kept {}/{total} records", records.len());
    }
    Ok(records)
}

/// Builds precincts from the attribute table plus optional boundary and
/// recorded-location tables.
///
/// Records whose number is missing, non-numeric, or not positive are
/// skipped, as are repeats of an already loaded number.
///
/// # Errors
///
/// Returns [`LoadError::Json`] if any table is not valid JSON of the
/// expected top-level shape.
pub fn parse_precincts(
    precincts_json: &str,
    boundaries_json: Option<&str>,
    locations_json: Option<&str>,
) -> Result<Vec<Precinct>, LoadError> {
    let table: RawPrecinctTable = serde_json::from_str(precincts_json)?;
    let boundaries = match boundaries_json {
        Some(text) => parse_boundaries(text)?,
        None => BTreeMap::new(),
    };
    let locations: Vec<RawLocation> = match locations_json {
        Some(text) => parse_records(text, PRECINCT_LOCATIONS_FILE)?,
        None => Vec::new(),
    };

    let mut seen = BTreeSet::new();
    let mut precincts = Vec::new();

    for (i, value) in table.into_records().into_iter().enumerate() {
        let raw: RawPrecinct = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Skipping precinct record {i}: {e}");
                continue;
            }
        };
        let Some(num) = raw.precinct_num.as_ref().and_then(RawNumber::as_positive_u32) else {
            log::warn!("Skipping precinct record {i} with invalid number {:?}", raw.precinct_num);
            continue;
        };
        if !seen.insert(num) {
            log::warn!("Skipping duplicate precinct {num}");
            continue;
        }

        let recorded = locations
            .iter()
            .find(|loc| loc.num.as_positive_u32() == Some(num))
            .map(|loc| {
                AxisPair::new(
                    loc.lat.as_ref().and_then(RawNumber::as_f64),
                    loc.lng.as_ref().and_then(RawNumber::as_f64),
                )
            })
            .unwrap_or_default();

        precincts.push(build_precinct(
            num,
            raw,
            boundaries.get(&num).cloned().unwrap_or_default(),
            recorded,
        ));
    }

    Ok(precincts)
}

fn parse_boundaries(text: &str) -> Result<BTreeMap<u32, Vec<Polygon>>, LoadError> {
    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(text)?;
    let mut boundaries = BTreeMap::new();

    for (key, value) in raw {
        let Some(num) = RawNumber::Text(key.clone()).as_positive_u32() else {
            log::warn!("Skipping boundary with invalid precinct key {key:?}");
            continue;
        };
        match serde_json::from_value::<RawBoundary>(value) {
            Ok(boundary) => {
                let parts = boundary.load();
                if parts.is_empty() {
                    log::warn!("Precinct {num} boundary has no usable rings");
                }
                boundaries.insert(num, parts);
            }
            Err(e) => log::warn!("Skipping unparseable boundary for precinct {num}: {e}"),
        }
    }

    Ok(boundaries)
}

fn build_precinct(num: u32, raw: RawPrecinct, boundary: Vec<Polygon>, recorded: AxisPair) -> Precinct {
    let station = AxisPair::new(
        raw.latitude.as_ref().and_then(RawNumber::as_f64),
        raw.longitude.as_ref().and_then(RawNumber::as_f64),
    );
    let ring_bounds = boundary
        .iter()
        .filter_map(bounding_box_of)
        .reduce(|a, b| a.union(&b));

    let (centroid, sources) = derive_centroid(&CentroidInputs {
        recorded,
        station,
        bounding_box: ring_bounds,
    });
    if sources != (CentroidSource::Recorded, CentroidSource::Recorded) {
        log::debug!("Precinct {num} centroid derived from {sources:?}");
    }

    Precinct {
        precinct_num: num,
        name: non_empty(raw.name).unwrap_or_else(|| Precinct::default_name(num)),
        address: non_empty(raw.address).unwrap_or_default(),
        phone: non_empty(raw.phone).unwrap_or_default(),
        borough: non_empty(raw.borough).unwrap_or_default(),
        station: station.point(),
        boundary,
        centroid,
        bounding_box: ring_bounds.unwrap_or_else(|| BoundingBox::collapsed(centroid)),
        opening_hours: raw.opening_hours,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Builds sector rings from a `GeoJSON` document.
///
/// Each outer ring of a feature becomes its own [`Sector`] entry sharing
/// the feature's sector id and precinct number. Features without a
/// numeric `pct`, a non-blank `sector`, or polygonal geometry are
/// skipped.
///
/// # Errors
///
/// Returns [`LoadError::GeoJson`] if the text is not `GeoJSON`, or
/// [`LoadError::Config`] if it is a bare geometry.
pub fn parse_sectors(text: &str) -> Result<Vec<Sector>, LoadError> {
    let features = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(LoadError::Config {
                message: "sector data must be a Feature or FeatureCollection".to_string(),
            });
        }
    };

    let total = features.len();
    let mut sectors = Vec::new();
    let mut skipped = 0_usize;

    for feature in &features {
        let precinct_num = feature
            .property("pct")
            .and_then(RawNumber::from_json)
            .and_then(|n| n.as_positive_u32());
        let sector_id = feature
            .property("sector")
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let geometry = feature
            .geometry
            .as_ref()
            .and_then(|g| RawGeometry::from_geojson(&g.value));

        let (Some(precinct_num), Some(sector_id), Some(geometry)) =
            (precinct_num, sector_id, geometry)
        else {
            skipped += 1;
            continue;
        };

        let metadata = SectorMetadata {
            patrol_borough: string_property(feature, "patrol_bor"),
            phase: string_property(feature, "phase"),
            sq_miles: feature
                .property("sq_miles")
                .and_then(RawNumber::from_json)
                .and_then(|n| n.as_f64()),
            sector_indicator: string_property(feature, "sector_ind"),
            start_date: string_property(feature, "START_DATE"),
        };

        for ring in geometry::load(&geometry) {
            let Some(bounding_box) = bounding_box_of(&ring) else {
                continue;
            };
            sectors.push(Sector {
                sector_id: sector_id.to_string(),
                precinct_num,
                boundary: ring,
                bounding_box,
                metadata: metadata.clone(),
            });
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped}/{total} sector features missing pct, sector, or polygon geometry");
    }

    Ok(sectors)
}

fn string_property(feature: &geojson::Feature, key: &str) -> Option<String> {
    feature
        .property(key)
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

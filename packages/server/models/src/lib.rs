#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the precinct map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the reference records so that list endpoints can omit boundary
//! geometry and the API contract can evolve independently.

use std::collections::BTreeMap;

use precinct_map_jurisdiction_models::{BoundingBox, DayHours, GeoPoint, Precinct, Sector};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Number of loaded precincts.
    pub precincts: usize,
    /// Number of loaded sector rings.
    pub sectors: usize,
    /// Number of loaded squads.
    pub squads: usize,
    /// Whether an external place provider is configured.
    pub provider_enabled: bool,
}

/// Query parameters carrying a point.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PointQueryParams {
    pub lat: f64,
    pub lng: f64,
}

impl PointQueryParams {
    #[must_use]
    pub const fn point(self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Query parameters for the address endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressQueryParams {
    /// Free-text address.
    pub q: String,
}

/// Query parameters selecting a month. `month` is 0-indexed.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MonthQueryParams {
    pub year: i32,
    pub month: u32,
}

/// A precinct without its boundary geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPrecinctSummary {
    pub precinct_num: u32,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub borough: String,
    /// Station house location, else the centroid.
    pub focus_point: GeoPoint,
    pub centroid: GeoPoint,
    pub bounding_box: BoundingBox,
}

impl From<&Precinct> for ApiPrecinctSummary {
    fn from(precinct: &Precinct) -> Self {
        Self {
            precinct_num: precinct.precinct_num,
            name: precinct.name.clone(),
            address: precinct.address.clone(),
            phone: precinct.phone.clone(),
            borough: precinct.borough.clone(),
            focus_point: precinct.focus_point(),
            centroid: precinct.centroid,
            bounding_box: precinct.bounding_box,
        }
    }
}

/// A sector without its ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSectorSummary {
    pub sector_id: String,
    pub precinct_num: u32,
    pub bounding_box: BoundingBox,
    pub patrol_borough: Option<String>,
    pub phase: Option<String>,
}

impl From<&Sector> for ApiSectorSummary {
    fn from(sector: &Sector) -> Self {
        Self {
            sector_id: sector.sector_id.clone(),
            precinct_num: sector.precinct_num,
            bounding_box: sector.bounding_box,
            patrol_borough: sector.metadata.patrol_borough.clone(),
            phase: sector.metadata.phase.clone(),
        }
    }
}

/// The jurisdiction of a point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResolution {
    pub precinct: Option<ApiPrecinctSummary>,
    pub sector: Option<ApiSectorSummary>,
    /// Name of the tier that chose the precinct.
    pub tier: Option<String>,
    /// Precinct of a containing sector that was discarded because it
    /// disagrees with the chosen precinct.
    pub sector_conflict: Option<u32>,
}

/// The jurisdiction of an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAddressResolution {
    #[serde(flatten)]
    pub resolution: ApiResolution,
    pub resolved_point: GeoPoint,
    pub display_address: String,
}

/// Raw external hint for a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiNearbyPrecinct {
    pub precinct_num: Option<u32>,
}

/// On-duty flags for each day of a squad's month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMonthSchedule {
    pub squad_id: u32,
    pub year: i32,
    /// 0-indexed.
    pub month: u32,
    /// Day of month to on-duty flag.
    pub days: BTreeMap<u32, bool>,
}

/// Opening hours for each day of a precinct's month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMonthHours {
    pub precinct_num: u32,
    pub year: i32,
    /// 0-indexed.
    pub month: u32,
    /// Days without an hours entry are omitted.
    pub days: BTreeMap<u32, DayHours>,
}

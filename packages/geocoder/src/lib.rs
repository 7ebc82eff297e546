#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! External place search and geocoding for precinct resolution.
//!
//! The resolver depends only on the [`PlaceProvider`] trait:
//!
//! 1. **Nearby named-place search**: finds places near a point matching
//!    a keyword and extracts a precinct number from their names (see
//!    [`precinct_name`]).
//! 2. **Forward geocoding**: free text to a point inside the city.
//! 3. **Reverse geocoding**: a point to a display address.
//!
//! [`google::GoogleMapsClient`] implements it against the Google Maps
//! web services configured in the [`service_registry`]. Every request
//! goes through the two-tier attempt policy in [`retry`].
//!
//! "Not found" is `Ok(None)`. Errors are reserved for transport and
//! protocol failures, which callers are free to treat as "not found".

pub mod google;
pub mod precinct_name;
pub mod retry;
pub mod service_registry;

use precinct_map_jurisdiction_models::GeoPoint;
use thiserror::Error;

/// A forward-geocoding match.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    /// Matched location (WGS84).
    pub point: GeoPoint,
    /// The provider's formatted address, if it returned one.
    pub formatted_address: Option<String>,
}

/// Errors from place search and geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The server answered with a non-success HTTP status.
    #[error("HTTP status {code}")]
    Status {
        /// HTTP status code.
        code: u16,
    },

    /// A request attempt ran out of time.
    #[error("'{attempt}' attempt timed out after {timeout_ms}ms")]
    Timeout {
        /// Name of the attempt that timed out.
        attempt: String,
        /// The attempt's budget.
        timeout_ms: u64,
    },

    /// The provider is misconfigured.
    #[error("Config error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },
}

impl GeocodeError {
    /// Whether retrying with a more lenient attempt could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_body() || e.is_request(),
            Self::Timeout { .. } => true,
            Self::Status { code } => *code == 429 || (500..600).contains(code),
            Self::Parse { .. } | Self::Config { .. } => false,
        }
    }
}

/// A source of place-search and geocoding answers.
#[async_trait::async_trait]
pub trait PlaceProvider: Send + Sync {
    /// Provider identifier, used in logs.
    fn id(&self) -> &str;

    /// Searches for places matching `keyword` nearest to `point` and
    /// returns the first valid precinct number extracted from their
    /// names, in the provider's distance order.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the provider could not be reached or
    /// answered with something unparseable.
    async fn find_nearest_named_place(
        &self,
        point: GeoPoint,
        keyword: &str,
    ) -> Result<Option<u32>, GeocodeError>;

    /// Resolves free text to a point inside the city.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the provider could not be reached or
    /// answered with something unparseable.
    async fn forward_geocode(&self, address: &str) -> Result<Option<GeocodedPlace>, GeocodeError>;

    /// Resolves a point to a display address.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the provider could not be reached or
    /// answered with something unparseable.
    async fn reverse_geocode(&self, point: GeoPoint) -> Result<Option<String>, GeocodeError>;
}

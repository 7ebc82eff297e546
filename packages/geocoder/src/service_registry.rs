//! Compile-time registry of place-search service configurations.
//!
//! Each provider is defined in a TOML file under `services/`. The
//! registry embeds these at compile time and exposes them via
//! [`all_services`] and [`service`].

use std::time::Duration;

use serde::Deserialize;

/// A place-search service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceService {
    /// Unique identifier (e.g., `"google"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service may be used at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
    /// Request attempts, tried in order until one succeeds or fails
    /// permanently.
    pub attempts: Vec<Attempt>,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Google Places nearby search plus the Geocoding API.
    GoogleMaps {
        /// Places nearby-search endpoint.
        nearby_search_url: String,
        /// Geocoding endpoint (forward and reverse).
        geocode_url: String,
        /// Component filter for forward geocoding.
        components: String,
    },
}

/// One tier of the attempt policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Attempt {
    /// Label used in logs (e.g., `"strict"`).
    pub name: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Attempt {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

const fn default_true() -> bool {
    true
}

impl PlaceService {
    /// Reads the API key from [`Self::api_key_env`]. Missing or blank
    /// keys yield `None`.
    #[must_use]
    pub fn api_key_from_env(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[("google", include_str!("../services/google.toml"))];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 1;

/// Returns all place-search service configurations.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_services() -> Vec<PlaceService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse place service '{name}': {e}"))
        })
        .collect()
}

/// Looks up an enabled service by id.
#[must_use]
pub fn service(id: &str) -> Option<PlaceService> {
    all_services()
        .into_iter()
        .find(|svc| svc.id == id && svc.enabled)
}

//! Google Maps web services client.
//!
//! Uses the Places nearby search (`rankby=distance`) for precinct hints
//! and the Geocoding API for forward and reverse lookups. Every response
//! envelope carries a `status`; anything but `"OK"` (including
//! `"ZERO_RESULTS"`) is treated as "not found".
//!
//! See <https://developers.google.com/maps/documentation/places/web-service/search-nearby>
//! and <https://developers.google.com/maps/documentation/geocoding/requests-geocoding>.

use precinct_map_jurisdiction_models::{BoundingBox, GEOCODE_BOUNDS, GeoPoint};

use crate::{
    GeocodeError, GeocodedPlace, PlaceProvider, precinct_name, retry,
    service_registry::{self, Attempt, PlaceService, ProviderConfig},
};

/// Service registry id for this client.
pub const SERVICE_ID: &str = "google";

/// Client for the Google Maps Places and Geocoding APIs.
#[derive(Debug, Clone)]
pub struct GoogleMapsClient {
    client: reqwest::Client,
    api_key: String,
    nearby_search_url: String,
    geocode_url: String,
    components: String,
    bounds: BoundingBox,
    attempts: Vec<Attempt>,
}

impl GoogleMapsClient {
    /// Builds a client from a registry entry.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the API key is blank or the
    /// service has no request attempts.
    pub fn from_service(
        service: &PlaceService,
        api_key: impl Into<String>,
    ) -> Result<Self, GeocodeError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GeocodeError::Config {
                message: format!("{} requires an API key", service.name),
            });
        }
        if service.attempts.is_empty() {
            return Err(GeocodeError::Config {
                message: format!("{} has no request attempts", service.name),
            });
        }

        let ProviderConfig::GoogleMaps {
            nearby_search_url,
            geocode_url,
            components,
        } = &service.provider;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            nearby_search_url: nearby_search_url.clone(),
            geocode_url: geocode_url.clone(),
            components: components.clone(),
            bounds: GEOCODE_BOUNDS,
            attempts: service.attempts.clone(),
        })
    }

    /// Builds a client from the embedded `google` service, reading the
    /// key from the environment variable it names.
    ///
    /// Returns `Ok(None)` when the service is disabled or no key is set,
    /// in which case callers should run without external hints.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the service is misconfigured.
    pub fn from_env() -> Result<Option<Self>, GeocodeError> {
        let Some(service) = service_registry::service(SERVICE_ID) else {
            log::info!("Place service '{SERVICE_ID}' is disabled");
            return Ok(None);
        };
        let Some(api_key) = service.api_key_from_env() else {
            log::info!(
                "{} not set; external precinct hints disabled",
                service.api_key_env
            );
            return Ok(None);
        };
        Self::from_service(&service, api_key).map(Some)
    }
}

#[async_trait::async_trait]
impl PlaceProvider for GoogleMapsClient {
    fn id(&self) -> &str {
        SERVICE_ID
    }

    async fn find_nearest_named_place(
        &self,
        point: GeoPoint,
        keyword: &str,
    ) -> Result<Option<u32>, GeocodeError> {
        let location = lat_lng_param(point);
        let body = retry::send_json(&self.attempts, || {
            self.client.get(&self.nearby_search_url).query(&[
                ("location", location.as_str()),
                ("rankby", "distance"),
                ("keyword", keyword),
                ("key", self.api_key.as_str()),
            ])
        })
        .await?;

        parse_nearby_response(&body)
    }

    async fn forward_geocode(&self, address: &str) -> Result<Option<GeocodedPlace>, GeocodeError> {
        let bounds = self.bounds.to_viewport_param();
        let body = retry::send_json(&self.attempts, || {
            self.client.get(&self.geocode_url).query(&[
                ("address", address),
                ("bounds", bounds.as_str()),
                ("components", self.components.as_str()),
                ("key", self.api_key.as_str()),
            ])
        })
        .await?;

        parse_geocode_response(&body, &self.bounds)
    }

    async fn reverse_geocode(&self, point: GeoPoint) -> Result<Option<String>, GeocodeError> {
        let latlng = lat_lng_param(point);
        let body = retry::send_json(&self.attempts, || {
            self.client.get(&self.geocode_url).query(&[
                ("latlng", latlng.as_str()),
                ("key", self.api_key.as_str()),
            ])
        })
        .await?;

        parse_reverse_response(&body)
    }
}

fn lat_lng_param(point: GeoPoint) -> String {
    format!("{},{}", point.latitude, point.longitude)
}

/// Returns the envelope's results if its status is `"OK"`.
fn ok_results(body: &serde_json::Value) -> Result<Option<&Vec<serde_json::Value>>, GeocodeError> {
    let status = body["status"].as_str().ok_or_else(|| GeocodeError::Parse {
        message: "Google response has no status".to_string(),
    })?;

    if status != "OK" {
        if status != "ZERO_RESULTS" {
            let detail = body["error_message"].as_str().unwrap_or_default();
            log::warn!("Google responded with status {status}: {detail}");
        }
        return Ok(None);
    }

    Ok(body["results"].as_array().filter(|results| !results.is_empty()))
}

/// Parses a nearby-search response into the first valid precinct number
/// found among the result names.
fn parse_nearby_response(body: &serde_json::Value) -> Result<Option<u32>, GeocodeError> {
    let Some(results) = ok_results(body)? else {
        return Ok(None);
    };

    Ok(precinct_name::first_valid_precinct(
        results.iter().filter_map(|place| place["name"].as_str()),
    ))
}

/// Parses a forward-geocode response, preferring the first candidate
/// inside `bounds`. If none is inside, the first candidate is used and
/// then rejected for being out of bounds. Candidates without a location
/// are skipped.
fn parse_geocode_response(
    body: &serde_json::Value,
    bounds: &BoundingBox,
) -> Result<Option<GeocodedPlace>, GeocodeError> {
    let Some(results) = ok_results(body)? else {
        return Ok(None);
    };

    let candidates: Vec<GeocodedPlace> = results
        .iter()
        .filter_map(|result| {
            let location = &result["geometry"]["location"];
            let (Some(lat), Some(lng)) = (location["lat"].as_f64(), location["lng"].as_f64())
            else {
                log::debug!("Skipping geocode candidate without a location");
                return None;
            };
            Some(GeocodedPlace {
                point: GeoPoint::new(lat, lng),
                formatted_address: result["formatted_address"].as_str().map(String::from),
            })
        })
        .collect();

    let chosen = candidates
        .iter()
        .find(|place| bounds.contains(place.point))
        .or_else(|| candidates.first());

    Ok(chosen
        .filter(|place| {
            let inside = bounds.contains(place.point);
            if !inside {
                log::debug!(
                    "Rejecting geocode result {:?} outside city bounds",
                    place.formatted_address
                );
            }
            inside
        })
        .cloned())
}

/// Parses a reverse-geocode response into the first formatted address.
fn parse_reverse_response(body: &serde_json::Value) -> Result<Option<String>, GeocodeError> {
    let Some(results) = ok_results(body)? else {
        return Ok(None);
    };

    Ok(results
        .first()
        .and_then(|first| first["formatted_address"].as_str())
        .map(String::from))
}

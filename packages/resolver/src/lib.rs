#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Resolves a point or address to an NYPD precinct and patrol sector.
//!
//! Precincts are chosen by an ordered list of [`PrecinctTier`]s (by
//! default: boundary containment, external place-search hint, nearest
//! centroid). The first tier to produce a loaded precinct wins. Sectors
//! are always found by boundary containment alone and are dropped when
//! they belong to a different precinct than the one chosen.
//!
//! External provider failures never fail a resolution; they only make
//! the external tier yield nothing.

pub mod config;
pub mod reference;
pub mod store;
pub mod tier;

use std::{collections::BTreeMap, future::Future, sync::Arc};

use precinct_map_geocoder::{GeocodeError, PlaceProvider};
use precinct_map_jurisdiction_models::{DayHours, GeoPoint, Precinct, Sector};
use precinct_map_schedule::DutyMonth;
use thiserror::Error;

pub use config::ResolverConfig;
pub use reference::ReferenceData;
pub use store::JurisdictionStore;
pub use tier::PrecinctTier;

/// Errors from loading reference data or configuration.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A table is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Sector data is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Configuration is invalid.
    #[error("Config error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },
}

/// Errors from resolution operations that can legitimately find nothing.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The address could not be geocoded to a point inside the city.
    #[error("Could not locate address: {query}")]
    AddressNotFound {
        /// The query as given.
        query: String,
    },

    /// No precinct could be determined.
    #[error("Precinct not found: {message}")]
    PrecinctNotFound {
        /// What was looked up.
        message: String,
    },

    /// No such squad.
    #[error("Squad {squad_id} not found")]
    SquadNotFound {
        /// The requested squad.
        squad_id: u32,
    },

    /// The squad exists but has no schedule.
    #[error("No RDO schedule for squad {squad_id}")]
    ScheduleNotFound {
        /// The requested squad.
        squad_id: u32,
    },
}

/// The jurisdiction found for a point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Resolution<'a> {
    pub precinct: Option<&'a Precinct>,
    /// Only set when the sector belongs to [`Self::precinct`].
    pub sector: Option<&'a Sector>,
    /// The tier that chose the precinct.
    pub tier: Option<PrecinctTier>,
    /// Precinct number of a sector that contained the point but was
    /// discarded because it belongs to a different precinct.
    pub sector_conflict: Option<u32>,
}

/// The jurisdiction found for a free-text address.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressResolution<'a> {
    pub resolution: Resolution<'a>,
    /// Where the address geocoded to.
    pub resolved_point: GeoPoint,
    /// The provider's formatted address, else a reverse-geocoded one,
    /// else the query itself.
    pub display_address: String,
}

/// Multi-tier precinct and sector resolver.
///
/// Holds no per-call state; every `resolve` keeps its intermediate
/// results local, so an abandoned call cannot affect any other.
#[derive(Clone)]
pub struct JurisdictionResolver {
    store: Arc<JurisdictionStore>,
    provider: Option<Arc<dyn PlaceProvider>>,
    config: ResolverConfig,
}

impl std::fmt::Debug for JurisdictionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JurisdictionResolver")
            .field("store", &self.store)
            .field("provider", &self.provider.as_ref().map(|p| p.id()))
            .field("config", &self.config)
            .finish()
    }
}

impl JurisdictionResolver {
    #[must_use]
    pub fn new(
        store: Arc<JurisdictionStore>,
        provider: Option<Arc<dyn PlaceProvider>>,
        config: ResolverConfig,
    ) -> Self {
        if provider.is_none() && config.tiers.iter().any(|t| t.is_external()) {
            log::info!("No place provider configured; external tiers will be skipped");
        }
        if store.precincts().is_empty() {
            log::warn!("Resolver built with no precincts; every resolution will be empty");
        }
        Self {
            store,
            provider,
            config,
        }
    }

    #[must_use]
    pub fn store(&self) -> &JurisdictionStore {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    #[must_use]
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Resolves `point` to a precinct and sector.
    ///
    /// Returns an empty resolution for a point that is not a finite
    /// coordinate, or when no precincts are loaded. Any other point gets
    /// a precinct as long as the nearest-centroid tier is configured.
    pub async fn resolve(&self, point: GeoPoint) -> Resolution<'_> {
        if !point.is_valid() {
            log::debug!("Rejected invalid point {point:?}");
            return Resolution::default();
        }

        let mut chosen = None;
        for &tier in &self.config.tiers {
            if let Some(precinct) = self.run_tier(tier, point).await {
                log::debug!(
                    "Tier {tier} chose precinct {} for {point:?}",
                    precinct.precinct_num
                );
                chosen = Some((tier, precinct));
                break;
            }
            log::debug!("Tier {tier} found nothing for {point:?}");
        }

        let Some((tier, precinct)) = chosen else {
            return Resolution::default();
        };

        let mut resolution = Resolution {
            precinct: Some(precinct),
            sector: None,
            tier: Some(tier),
            sector_conflict: None,
        };

        if let Some(sector) = self.store.sector_containing(point) {
            if sector.precinct_num == precinct.precinct_num {
                resolution.sector = Some(sector);
            } else {
                log::warn!(
                    "Sector {} at {point:?} belongs to precinct {} but {tier} chose precinct {}; \
                     reporting no sector",
                    sector.sector_id,
                    sector.precinct_num,
                    precinct.precinct_num
                );
                resolution.sector_conflict = Some(sector.precinct_num);
            }
        }

        resolution
    }

    async fn run_tier(&self, tier: PrecinctTier, point: GeoPoint) -> Option<&Precinct> {
        match tier {
            PrecinctTier::Boundary => self.store.precinct_containing(point),
            PrecinctTier::SectorOwner => self
                .store
                .sector_containing(point)
                .and_then(|sector| self.store.precinct(sector.precinct_num)),
            PrecinctTier::ExternalHint => {
                let hint = self.nearby_precinct(point).await?;
                let precinct = self.store.precinct(hint);
                if precinct.is_none() {
                    log::debug!("External hint {hint} is not a loaded precinct");
                }
                precinct
            }
            PrecinctTier::NearestCentroid => self.store.nearest_precinct(point),
        }
    }

    /// Asks the external provider for the nearest precinct-like place.
    ///
    /// Returns `None` without a provider, on provider error, or once the
    /// hint budget runs out. The number is a valid precinct but is not
    /// necessarily loaded.
    pub async fn nearby_precinct(&self, point: GeoPoint) -> Option<u32> {
        let provider = self.provider.as_ref()?;
        self.bounded(
            "nearby search",
            provider.find_nearest_named_place(point, &self.config.hint_keyword),
        )
        .await
        .flatten()
    }

    /// Runs a provider call within the hint budget. Errors and timeouts
    /// are logged and reported as `None`.
    async fn bounded<T>(
        &self,
        label: &str,
        call: impl Future<Output = Result<T, GeocodeError>>,
    ) -> Option<T> {
        match tokio::time::timeout(self.config.hint_budget(), call).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                log::warn!("Provider {label} failed: {e}");
                None
            }
            Err(_) => {
                log::warn!(
                    "Provider {label} exceeded {}ms budget",
                    self.config.hint_budget_ms
                );
                None
            }
        }
    }

    /// Geocodes `query` and resolves the resulting point.
    ///
    /// # Errors
    ///
    /// * [`ResolveError::AddressNotFound`] if there is no provider, the
    ///   query is blank, or it does not geocode to a point in the city.
    /// * [`ResolveError::PrecinctNotFound`] if the point resolves to no
    ///   precinct (no precincts loaded).
    pub async fn resolve_by_address(
        &self,
        query: &str,
    ) -> Result<AddressResolution<'_>, ResolveError> {
        let query = query.trim();
        let not_found = || ResolveError::AddressNotFound {
            query: query.to_string(),
        };

        if query.is_empty() {
            return Err(not_found());
        }
        let Some(provider) = self.provider.as_ref() else {
            log::warn!("Cannot geocode {query:?}: no place provider configured");
            return Err(not_found());
        };

        let scoped = self.config.scope_query(query);
        let place = self
            .bounded("forward geocode", provider.forward_geocode(&scoped))
            .await
            .flatten()
            .ok_or_else(not_found)?;

        let resolution = self.resolve(place.point).await;
        if resolution.precinct.is_none() {
            return Err(ResolveError::PrecinctNotFound {
                message: format!("no precinct for {query:?}"),
            });
        }

        let display_address = match place.formatted_address {
            Some(address) => address,
            None => self
                .bounded("reverse geocode", provider.reverse_geocode(place.point))
                .await
                .flatten()
                .unwrap_or_else(|| query.to_string()),
        };

        Ok(AddressResolution {
            resolution,
            resolved_point: place.point,
            display_address,
        })
    }

    /// On-duty map for a squad over a 0-indexed month.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::SquadNotFound`] or
    /// [`ResolveError::ScheduleNotFound`] if there is nothing to compute.
    pub fn month_schedule_for_squad(
        &self,
        squad_id: u32,
        year: i32,
        month0: u32,
    ) -> Result<DutyMonth, ResolveError> {
        let Some(schedule) = self.store.schedule_for_squad(squad_id) else {
            return Err(if self.store.squad(squad_id).is_some() {
                ResolveError::ScheduleNotFound { squad_id }
            } else {
                ResolveError::SquadNotFound { squad_id }
            });
        };
        Ok(precinct_map_schedule::month_schedule(year, month0, schedule))
    }

    /// Opening hours for each day of a 0-indexed month at a precinct.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::PrecinctNotFound`] for an unknown precinct.
    pub fn month_opening_hours(
        &self,
        precinct_num: u32,
        year: i32,
        month0: u32,
    ) -> Result<BTreeMap<u32, DayHours>, ResolveError> {
        let precinct =
            self.store
                .precinct(precinct_num)
                .ok_or_else(|| ResolveError::PrecinctNotFound {
                    message: format!("precinct {precinct_num}"),
                })?;
        Ok(precinct_map_schedule::month_opening_hours(
            year,
            month0,
            &precinct.opening_hours,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use chrono::NaiveDate;
    use precinct_map_geocoder::GeocodedPlace;
    use precinct_map_jurisdiction_models::{BoundingBox, Polygon, SectorMetadata};
    use precinct_map_schedule_models::{PatternType, RdoSchedule, Squad};
    use precinct_map_spatial::{bounding_box_of, haversine_km};

    use super::*;

    fn rect(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Polygon {
        Polygon(vec![
            GeoPoint::new(min_lat, min_lng),
            GeoPoint::new(min_lat, max_lng),
            GeoPoint::new(max_lat, max_lng),
            GeoPoint::new(max_lat, min_lng),
        ])
    }

    fn precinct(num: u32, boundary: Vec<Polygon>, centroid: GeoPoint) -> Precinct {
        let bounding_box = boundary
            .iter()
            .filter_map(bounding_box_of)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| BoundingBox::collapsed(centroid));
        Precinct {
            precinct_num: num,
            name: Precinct::default_name(num),
            address: String::new(),
            phone: String::new(),
            borough: String::new(),
            station: None,
            boundary,
            centroid,
            bounding_box,
            opening_hours: Vec::new(),
        }
    }

    fn sector(id: &str, precinct_num: u32, ring: Polygon) -> Sector {
        Sector {
            sector_id: id.to_string(),
            precinct_num,
            bounding_box: bounding_box_of(&ring).unwrap(),
            boundary: ring,
            metadata: SectorMetadata::default(),
        }
    }

    /// 1 and 5 are side-by-side squares, 22 has two disjoint parts, 14
    /// has no boundary. Sector 5A sits outside every precinct boundary.
    fn fixture() -> ReferenceData {
        let mut p1 = precinct(
            1,
            vec![rect(-74.02, 40.70, -74.00, 40.72)],
            GeoPoint::new(40.71, -74.01),
        );
        p1.opening_hours = [
            "Sunday",
            "Monday",
            "Tuesday",
            "Wednesday",
            "Thursday",
            "Friday",
            "Saturday",
        ]
        .iter()
        .map(|day| DayHours {
            day: (*day).to_string(),
            hours: "Open 24 hours".to_string(),
            is_open: true,
        })
        .collect();

        ReferenceData {
            precincts: vec![
                p1,
                precinct(
                    5,
                    vec![rect(-74.00, 40.70, -73.98, 40.72)],
                    GeoPoint::new(40.71, -73.99),
                ),
                precinct(
                    22,
                    vec![
                        rect(-73.98, 40.76, -73.97, 40.77),
                        rect(-73.96, 40.78, -73.95, 40.79),
                    ],
                    GeoPoint::new(40.775, -73.965),
                ),
                precinct(14, Vec::new(), GeoPoint::new(40.75, -73.99)),
            ],
            sectors: vec![
                sector("1A", 1, rect(-74.02, 40.70, -74.01, 40.71)),
                sector("1B", 1, rect(-74.01, 40.70, -74.00, 40.71)),
                sector("1A", 1, rect(-74.02, 40.71, -74.01, 40.72)),
                sector("5A", 5, rect(-74.00, 40.745, -73.98, 40.755)),
            ],
            squads: vec![
                Squad {
                    squad_id: 2,
                    squad_name: "Squad B".to_string(),
                    display_order: 2,
                },
                Squad {
                    squad_id: 1,
                    squad_name: "Squad A".to_string(),
                    display_order: 1,
                },
                Squad {
                    squad_id: 3,
                    squad_name: "Squad C".to_string(),
                    display_order: 3,
                },
            ],
            schedules: vec![
                RdoSchedule {
                    schedule_id: 10,
                    squad_id: 1,
                    pattern_type: PatternType::Steady,
                    cycle_length: 7,
                    pattern_array: ["O", "X", "X", "X", "X", "X", "O"]
                        .iter()
                        .map(ToString::to_string)
                        .collect(),
                    anchor_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    squad_offset: 0,
                },
                RdoSchedule {
                    schedule_id: 11,
                    squad_id: 1,
                    pattern_type: PatternType::Steady,
                    cycle_length: 7,
                    pattern_array: vec!["O".to_string(); 7],
                    anchor_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    squad_offset: 0,
                },
            ],
        }
    }

    fn resolver_with(
        data: ReferenceData,
        provider: Option<Arc<dyn PlaceProvider>>,
        config: ResolverConfig,
    ) -> JurisdictionResolver {
        JurisdictionResolver::new(Arc::new(JurisdictionStore::new(data)), provider, config)
    }

    fn resolver(provider: Option<Arc<dyn PlaceProvider>>) -> JurisdictionResolver {
        resolver_with(fixture(), provider, ResolverConfig::default())
    }

    fn num(resolution: &Resolution<'_>) -> Option<u32> {
        resolution.precinct.map(|p| p.precinct_num)
    }

    struct FailingProvider;

    #[async_trait::async_trait]
    impl PlaceProvider for FailingProvider {
        fn id(&self) -> &str {
            "failing"
        }

        async fn find_nearest_named_place(
            &self,
            _point: GeoPoint,
            _keyword: &str,
        ) -> Result<Option<u32>, GeocodeError> {
            Err(GeocodeError::Status { code: 503 })
        }

        async fn forward_geocode(
            &self,
            _address: &str,
        ) -> Result<Option<GeocodedPlace>, GeocodeError> {
            Err(GeocodeError::Status { code: 503 })
        }

        async fn reverse_geocode(&self, _point: GeoPoint) -> Result<Option<String>, GeocodeError> {
            Err(GeocodeError::Status { code: 503 })
        }
    }

    #[derive(Default)]
    struct StaticProvider {
        hint: Option<u32>,
        place: Option<GeocodedPlace>,
        reverse: Option<String>,
        delay: Option<Duration>,
        queries: Mutex<Vec<String>>,
        keywords: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl PlaceProvider for StaticProvider {
        fn id(&self) -> &str {
            "static"
        }

        async fn find_nearest_named_place(
            &self,
            _point: GeoPoint,
            keyword: &str,
        ) -> Result<Option<u32>, GeocodeError> {
            self.keywords.lock().unwrap().push(keyword.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.hint)
        }

        async fn forward_geocode(
            &self,
            address: &str,
        ) -> Result<Option<GeocodedPlace>, GeocodeError> {
            self.queries.lock().unwrap().push(address.to_string());
            Ok(self.place.clone())
        }

        async fn reverse_geocode(&self, _point: GeoPoint) -> Result<Option<String>, GeocodeError> {
            Ok(self.reverse.clone())
        }
    }

    fn hinting(hint: u32) -> Arc<StaticProvider> {
        Arc::new(StaticProvider {
            hint: Some(hint),
            ..StaticProvider::default()
        })
    }

    #[tokio::test]
    async fn boundary_containment_wins_with_matching_sector() {
        let resolver = resolver(None);
        let result = resolver.resolve(GeoPoint::new(40.705, -74.015)).await;
        assert_eq!(num(&result), Some(1));
        assert_eq!(result.tier, Some(PrecinctTier::Boundary));
        assert_eq!(result.sector.map(|s| s.sector_id.as_str()), Some("1A"));
        assert_eq!(result.sector_conflict, None);
    }

    #[tokio::test]
    async fn boundary_takes_precedence_over_external_hint() {
        let resolver = resolver(Some(hinting(14)));
        let result = resolver.resolve(GeoPoint::new(40.715, -73.99)).await;
        assert_eq!(num(&result), Some(5));
        assert_eq!(result.tier, Some(PrecinctTier::Boundary));
    }

    #[tokio::test]
    async fn multi_part_precinct_resolves_from_either_part() {
        let resolver = resolver(None);
        for point in [GeoPoint::new(40.765, -73.975), GeoPoint::new(40.785, -73.955)] {
            let result = resolver.resolve(point).await;
            assert_eq!(num(&result), Some(22), "{point:?}");
            assert_eq!(result.tier, Some(PrecinctTier::Boundary));
        }
    }

    #[tokio::test]
    async fn failing_provider_still_resolves_locally() {
        let resolver = resolver(Some(Arc::new(FailingProvider)));

        let inside = resolver.resolve(GeoPoint::new(40.705, -74.005)).await;
        assert_eq!(num(&inside), Some(1));

        let outside = resolver.resolve(GeoPoint::new(40.60, -73.80)).await;
        assert!(outside.precinct.is_some());
        assert_eq!(outside.tier, Some(PrecinctTier::NearestCentroid));
    }

    #[tokio::test]
    async fn external_hint_used_outside_boundaries() {
        let provider = hinting(14);
        let resolver = resolver(Some(provider.clone()));
        let result = resolver.resolve(GeoPoint::new(40.60, -73.80)).await;
        assert_eq!(num(&result), Some(14));
        assert_eq!(result.tier, Some(PrecinctTier::ExternalHint));
        assert_eq!(*provider.keywords.lock().unwrap(), ["NYPD precinct"]);
    }

    #[tokio::test]
    async fn unloaded_hint_falls_through_to_nearest_centroid() {
        let resolver = resolver(Some(hinting(40)));
        let result = resolver.resolve(GeoPoint::new(40.776, -73.966)).await;
        assert_eq!(num(&result), Some(22));
        assert_eq!(result.tier, Some(PrecinctTier::NearestCentroid));
    }

    #[tokio::test]
    async fn slow_hint_is_abandoned_after_budget() {
        let provider = Arc::new(StaticProvider {
            hint: Some(14),
            delay: Some(Duration::from_secs(5)),
            ..StaticProvider::default()
        });
        let config = ResolverConfig {
            hint_budget_ms: 20,
            ..ResolverConfig::default()
        };
        let resolver = resolver_with(fixture(), Some(provider), config);
        let result = resolver.resolve(GeoPoint::new(40.776, -73.966)).await;
        assert_eq!(num(&result), Some(22));
        assert_eq!(result.tier, Some(PrecinctTier::NearestCentroid));
    }

    #[tokio::test]
    async fn nearest_centroid_matches_brute_force() {
        let resolver = resolver(None);
        let data = fixture();
        for i in 0..10 {
            for j in 0..10 {
                let point = GeoPoint::new(
                    f64::from(i).mul_add(0.04, 40.5),
                    f64::from(j).mul_add(0.05, -74.25),
                );
                let result = resolver.resolve(point).await;
                if result.tier != Some(PrecinctTier::NearestCentroid) {
                    continue;
                }
                let expected = data
                    .precincts
                    .iter()
                    .min_by(|a, b| {
                        haversine_km(point, a.centroid).total_cmp(&haversine_km(point, b.centroid))
                    })
                    .map(|p| p.precinct_num);
                assert_eq!(num(&result), expected, "{point:?}");
            }
        }
    }

    #[tokio::test]
    async fn nearest_centroid_ties_keep_first_precinct() {
        let centroid = GeoPoint::new(40.70, -73.90);
        let data = ReferenceData {
            precincts: vec![
                precinct(77, Vec::new(), centroid),
                precinct(75, Vec::new(), centroid),
            ],
            ..ReferenceData::default()
        };
        let resolver = resolver_with(data, None, ResolverConfig::default());
        let result = resolver.resolve(GeoPoint::new(40.65, -73.85)).await;
        assert_eq!(num(&result), Some(77));
    }

    #[tokio::test]
    async fn sector_from_other_precinct_is_reported_as_conflict() {
        let resolver = resolver(None);
        let result = resolver.resolve(GeoPoint::new(40.75, -73.99)).await;
        assert_eq!(num(&result), Some(14));
        assert_eq!(result.sector, None);
        assert_eq!(result.sector_conflict, Some(5));
    }

    #[tokio::test]
    async fn sector_owner_tier_adopts_sector_precinct() {
        let config = ResolverConfig {
            tiers: vec![
                PrecinctTier::Boundary,
                PrecinctTier::SectorOwner,
                PrecinctTier::NearestCentroid,
            ],
            ..ResolverConfig::default()
        };
        let resolver = resolver_with(fixture(), None, config);
        let result = resolver.resolve(GeoPoint::new(40.75, -73.99)).await;
        assert_eq!(num(&result), Some(5));
        assert_eq!(result.tier, Some(PrecinctTier::SectorOwner));
        assert_eq!(result.sector.map(|s| s.sector_id.as_str()), Some("5A"));
        assert_eq!(result.sector_conflict, None);
    }

    #[tokio::test]
    async fn no_precincts_resolves_to_nothing() {
        let data = ReferenceData {
            precincts: Vec::new(),
            ..fixture()
        };
        let resolver = resolver_with(data, Some(hinting(1)), ResolverConfig::default());
        let result = resolver.resolve(GeoPoint::new(40.705, -74.015)).await;
        assert_eq!(result, Resolution::default());
    }

    #[tokio::test]
    async fn invalid_points_resolve_to_nothing() {
        let resolver = resolver(Some(hinting(1)));
        for point in [
            GeoPoint::new(f64::NAN, -73.9),
            GeoPoint::new(40.7, f64::INFINITY),
            GeoPoint::new(91.0, -73.9),
        ] {
            assert_eq!(resolver.resolve(point).await, Resolution::default(), "{point:?}");
        }
    }

    #[tokio::test]
    async fn point_beyond_metro_box_still_gets_nearest_centroid() {
        let data = ReferenceData {
            precincts: vec![precinct(105, Vec::new(), GeoPoint::new(40.75, -73.70))],
            ..ReferenceData::default()
        };
        let resolver = resolver_with(data, None, ResolverConfig::default());
        let result = resolver.resolve(GeoPoint::new(40.72, -73.55)).await;
        assert_eq!(num(&result), Some(105));
        assert_eq!(result.tier, Some(PrecinctTier::NearestCentroid));
    }

    #[tokio::test]
    async fn nearest_centroid_ignores_repeated_precinct_records() {
        let mut repeat = precinct(105, Vec::new(), GeoPoint::new(40.72, -73.56));
        repeat.address = "repeat".to_string();
        let data = ReferenceData {
            precincts: vec![
                precinct(105, Vec::new(), GeoPoint::new(40.60, -73.80)),
                precinct(106, Vec::new(), GeoPoint::new(40.70, -73.70)),
                repeat,
            ],
            ..ReferenceData::default()
        };
        let resolver = resolver_with(data, None, ResolverConfig::default());
        let result = resolver.resolve(GeoPoint::new(40.72, -73.55)).await;
        assert_eq!(num(&result), Some(106));
        assert_eq!(result.tier, Some(PrecinctTier::NearestCentroid));

        let far = resolver.store().nearest_precinct(GeoPoint::new(40.59, -73.81));
        assert_eq!(far.map(|p| p.address.as_str()), Some(""));
    }

    #[tokio::test]
    async fn address_resolution_scopes_query_and_reverse_geocodes() {
        let provider = Arc::new(StaticProvider {
            place: Some(GeocodedPlace {
                point: GeoPoint::new(40.705, -74.015),
                formatted_address: None,
            }),
            reverse: Some("16 Ericsson Pl, New York, NY 10013, USA".to_string()),
            ..StaticProvider::default()
        });
        let resolver = resolver(Some(provider.clone()));

        let found = resolver.resolve_by_address("  16 Ericsson Place ").await.unwrap();
        assert_eq!(num(&found.resolution), Some(1));
        assert_eq!(found.resolved_point, GeoPoint::new(40.705, -74.015));
        assert_eq!(found.display_address, "16 Ericsson Pl, New York, NY 10013, USA");
        assert_eq!(
            *provider.queries.lock().unwrap(),
            ["16 Ericsson Place, New York City, NY"]
        );
    }

    #[tokio::test]
    async fn address_resolution_prefers_formatted_address() {
        let provider = Arc::new(StaticProvider {
            place: Some(GeocodedPlace {
                point: GeoPoint::new(40.785, -73.955),
                formatted_address: Some("Central Park, New York, NY".to_string()),
            }),
            reverse: Some("unused".to_string()),
            ..StaticProvider::default()
        });
        let resolver = resolver(Some(provider));
        let found = resolver.resolve_by_address("central park new york").await.unwrap();
        assert_eq!(num(&found.resolution), Some(22));
        assert_eq!(found.display_address, "Central Park, New York, NY");
    }

    #[tokio::test]
    async fn address_not_found_cases() {
        let no_match = resolver(Some(Arc::new(StaticProvider::default())));
        assert!(matches!(
            no_match.resolve_by_address("nowhere").await,
            Err(ResolveError::AddressNotFound { .. })
        ));

        let failing = resolver(Some(Arc::new(FailingProvider)));
        assert!(matches!(
            failing.resolve_by_address("1 Police Plaza").await,
            Err(ResolveError::AddressNotFound { .. })
        ));

        let offline = resolver(None);
        assert!(matches!(
            offline.resolve_by_address("1 Police Plaza").await,
            Err(ResolveError::AddressNotFound { .. })
        ));

        assert!(matches!(
            no_match.resolve_by_address("   ").await,
            Err(ResolveError::AddressNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn nearby_precinct_reports_raw_hint() {
        assert_eq!(
            resolver(Some(hinting(40)))
                .nearby_precinct(GeoPoint::new(40.8, -73.9))
                .await,
            Some(40)
        );
        assert_eq!(
            resolver(Some(Arc::new(FailingProvider)))
                .nearby_precinct(GeoPoint::new(40.8, -73.9))
                .await,
            None
        );
        assert_eq!(
            resolver(None)
                .nearby_precinct(GeoPoint::new(40.8, -73.9))
                .await,
            None
        );
    }

    #[test]
    fn squad_schedule_uses_first_matching_schedule() {
        let resolver = resolver(None);
        let january = resolver.month_schedule_for_squad(1, 2024, 0).unwrap();
        assert_eq!(january.len(), 31);
        assert!(january[&1]);
        assert!(!january[&6]);
        assert!(!january[&7]);

        assert!(matches!(
            resolver.month_schedule_for_squad(2, 2024, 0),
            Err(ResolveError::ScheduleNotFound { squad_id: 2 })
        ));
        assert!(matches!(
            resolver.month_schedule_for_squad(99, 2024, 0),
            Err(ResolveError::SquadNotFound { squad_id: 99 })
        ));
    }

    #[test]
    fn opening_hours_month_view() {
        let resolver = resolver(None);
        let february = resolver.month_opening_hours(1, 2024, 1).unwrap();
        assert_eq!(february.len(), 29);
        assert!(february.values().all(|h| h.is_open));

        assert!(resolver.month_opening_hours(5, 2024, 1).unwrap().is_empty());
        assert!(matches!(
            resolver.month_opening_hours(999, 2024, 1),
            Err(ResolveError::PrecinctNotFound { .. })
        ));
    }

    #[test]
    fn reference_lookups() {
        let resolver = resolver(None);
        let store = resolver.store();

        let ids: Vec<&str> = store
            .sectors_for_precinct(1)
            .iter()
            .map(|s| s.sector_id.as_str())
            .collect();
        assert_eq!(ids, ["1A", "1B"]);
        assert!(store.sector(5, "5A").is_some());
        assert!(store.sector(1, "5A").is_none());

        let order: Vec<u32> = store.squads().iter().map(|s| s.squad_id).collect();
        assert_eq!(order, [1, 2, 3]);
        assert_eq!(store.schedule_for_squad(1).map(|s| s.schedule_id), Some(10));

        let nums: Vec<u32> = store.precincts().iter().map(|p| p.precinct_num).collect();
        assert_eq!(nums, [1, 5, 22, 14]);
        assert_eq!(store.precinct(22).map(|p| p.boundary.len()), Some(2));
    }
}

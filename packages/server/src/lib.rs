#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for precinct and sector resolution.
//!
//! Serves the REST API over a [`JurisdictionResolver`] built once at
//! startup from the reference tables in `PRECINCT_MAP_DATA_DIR`. When
//! `GOOGLE_MAPS_API_KEY` is set the resolver also consults Google Maps
//! for nearby-precinct hints and address geocoding.

mod handlers;

use std::{path::PathBuf, sync::Arc};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use precinct_map_geocoder::{PlaceProvider, google::GoogleMapsClient};
use precinct_map_resolver::{JurisdictionResolver, JurisdictionStore, LoadError, ResolverConfig};

/// Default directory for the reference tables.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Shared application state.
pub struct AppState {
    pub resolver: Arc<JurisdictionResolver>,
}

/// Directory named by `PRECINCT_MAP_DATA_DIR`, else [`DEFAULT_DATA_DIR`].
#[must_use]
pub fn data_dir_from_env() -> PathBuf {
    std::env::var("PRECINCT_MAP_DATA_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from)
}

/// Builds a resolver from the environment.
///
/// Loads the reference tables, the optional resolver config override, and
/// the Google Maps provider if an API key is present.
///
/// # Errors
///
/// Returns [`LoadError`] if the reference tables or config cannot be
/// loaded, or the provider registry entry is invalid.
pub fn resolver_from_env() -> Result<JurisdictionResolver, LoadError> {
    let data_dir = data_dir_from_env();
    log::info!("Loading reference data from {}...", data_dir.display());
    let store = JurisdictionStore::load_dir(&data_dir)?;

    let config = ResolverConfig::from_env()?;

    let provider = GoogleMapsClient::from_env()
        .map_err(|e| LoadError::Config {
            message: format!("invalid place provider: {e}"),
        })?
        .map(|client| Arc::new(client) as Arc<dyn PlaceProvider>);

    Ok(JurisdictionResolver::new(Arc::new(store), provider, config))
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/resolve", web::get().to(handlers::resolve))
            .route("/resolve/address", web::get().to(handlers::resolve_address))
            .route("/nearby-precinct", web::get().to(handlers::nearby_precinct))
            .route("/precincts", web::get().to(handlers::precincts))
            .route("/precincts/{num}", web::get().to(handlers::precinct))
            .route(
                "/precincts/{num}/sectors",
                web::get().to(handlers::precinct_sectors),
            )
            .route(
                "/precincts/{num}/hours",
                web::get().to(handlers::precinct_hours),
            )
            .route("/squads", web::get().to(handlers::squads))
            .route(
                "/squads/{id}/schedule",
                web::get().to(handlers::squad_schedule),
            ),
    );
}

/// Starts the precinct map API server.
///
/// Binds to `BIND_ADDR` (default `127.0.0.1`) and `PORT` (default
/// `8080`). The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`) and initialises logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(resolver: JurisdictionResolver) -> std::io::Result<()> {
    let store = resolver.store();
    log::info!(
        "Serving {} precincts, {} sector rings, {} squads (external provider: {})",
        store.precincts().len(),
        store.sectors().len(),
        store.squads().len(),
        if resolver.has_provider() {
            "enabled"
        } else {
            "disabled"
        }
    );

    let state = web::Data::new(AppState {
        resolver: Arc::new(resolver),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

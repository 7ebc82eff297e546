#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone entry point for the precinct map API server.

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let resolver = precinct_map_server::resolver_from_env()
        .map_err(|e| std::io::Error::other(format!("Failed to load reference data: {e}")))?;

    precinct_map_server::run_server(resolver).await
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line for the precinct map resolver.
//!
//! ```text
//! precinct_map resolve --lat 40.7527 --lng -73.9772
//! precinct_map address 350 5th Ave
//! precinct_map schedule --squad 1 --year 2024 --month 2
//! precinct_map hours --precinct 14 --year 2024 --month 2
//! precinct_map serve
//! ```
//!
//! Reference data is read from `PRECINCT_MAP_DATA_DIR` (default `data`).
//! Months are 1-12 here; the HTTP API takes them 0-indexed.

use std::collections::BTreeMap;

use clap::{Parser, Subcommand};
use precinct_map_jurisdiction_models::{DayHours, GeoPoint};
use precinct_map_resolver::{AddressResolution, Resolution};

#[derive(Parser)]
#[command(
    name = "precinct_map",
    about = "Resolve NYPD precincts and sectors, and print squad duty calendars"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the precinct and sector at a point
    Resolve {
        /// Latitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
    },
    /// Geocode an address and resolve its precinct and sector
    Address {
        /// Free-text address
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Print a squad's duty calendar for a month
    Schedule {
        /// Squad ID
        #[arg(long)]
        squad: u32,
        #[arg(long)]
        year: i32,
        /// Month (1-12)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
    },
    /// Print a precinct's opening hours for a month
    Hours {
        /// Precinct number
        #[arg(long)]
        precinct: u32,
        #[arg(long)]
        year: i32,
        /// Month (1-12)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
    },
    /// Start the HTTP API server
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let resolver = precinct_map_server::resolver_from_env()?;

    match cli.command {
        Commands::Resolve { lat, lng } => {
            let point = GeoPoint::new(lat, lng);
            let resolution = resolver.resolve(point).await;
            if resolution.precinct.is_none() {
                eprintln!("No precinct found at {lat}, {lng}");
                std::process::exit(1);
            }
            print!("{}", describe_resolution(&resolution));
        }
        Commands::Address { query } => {
            let query = query.join(" ");
            match resolver.resolve_by_address(&query).await {
                Ok(found) => print!("{}", describe_address(&found)),
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Schedule {
            squad,
            year,
            month,
        } => match resolver.month_schedule_for_squad(squad, year, month - 1) {
            Ok(days) => {
                if let Some(squad) = resolver.store().squad(squad) {
                    println!("{}", squad.squad_name);
                }
                print!("{}", describe_duty_month(year, month, &days));
            }
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        Commands::Hours {
            precinct,
            year,
            month,
        } => match resolver.month_opening_hours(precinct, year, month - 1) {
            Ok(days) if days.is_empty() => {
                println!("No opening hours recorded for precinct {precinct}.");
            }
            Ok(days) => print!("{}", describe_hours_month(year, month, &days)),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        Commands::Serve => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(precinct_map_server::run_server(resolver))
            })
            .await??;
        }
    }

    Ok(())
}

fn describe_resolution(resolution: &Resolution<'_>) -> String {
    let mut out = String::new();
    if let Some(precinct) = resolution.precinct {
        out.push_str(&format!(
            "Precinct: {} ({})\n",
            precinct.precinct_num, precinct.name
        ));
        if !precinct.address.is_empty() {
            out.push_str(&format!("Address:  {}\n", precinct.address));
        }
        if !precinct.phone.is_empty() {
            out.push_str(&format!("Phone:    {}\n", precinct.phone));
        }
    }
    match (resolution.sector, resolution.sector_conflict) {
        (Some(sector), _) => out.push_str(&format!("Sector:   {}\n", sector.sector_id)),
        (None, Some(other)) => out.push_str(&format!(
            "Sector:   unknown (containing sector belongs to precinct {other})\n"
        )),
        (None, None) => out.push_str("Sector:   unknown\n"),
    }
    if let Some(tier) = resolution.tier {
        out.push_str(&format!("Resolved by: {tier}\n"));
    }
    out
}

fn describe_address(found: &AddressResolution<'_>) -> String {
    format!(
        "Location: {} ({:.5}, {:.5})\n{}",
        found.display_address,
        found.resolved_point.latitude,
        found.resolved_point.longitude,
        describe_resolution(&found.resolution)
    )
}

fn describe_duty_month(year: i32, month: u32, days: &BTreeMap<u32, bool>) -> String {
    let off = days.values().filter(|on| !**on).count();
    let mut out = String::new();
    for (day, on_duty) in days {
        out.push_str(&format!(
            "{year}-{month:02}-{day:02}  {}\n",
            if *on_duty { "on duty" } else { "off" }
        ));
    }
    out.push_str(&format!("{off} day(s) off\n"));
    out
}

fn describe_hours_month(year: i32, month: u32, days: &BTreeMap<u32, DayHours>) -> String {
    days.iter()
        .map(|(day, hours)| format!("{year}-{month:02}-{day:02}  {:<10} {}\n", hours.day, hours.hours))
        .collect()
}

//! HTTP handler functions for the precinct map API.

use actix_web::{HttpResponse, web};
use precinct_map_resolver::{Resolution, ResolveError};
use precinct_map_server_models::{
    AddressQueryParams, ApiAddressResolution, ApiHealth, ApiMonthHours, ApiMonthSchedule,
    ApiNearbyPrecinct, ApiPrecinctSummary, ApiResolution, ApiSectorSummary, MonthQueryParams,
    PointQueryParams,
};

use crate::AppState;

fn to_api_resolution(resolution: &Resolution<'_>) -> ApiResolution {
    ApiResolution {
        precinct: resolution.precinct.map(ApiPrecinctSummary::from),
        sector: resolution.sector.map(ApiSectorSummary::from),
        tier: resolution.tier.map(|tier| tier.to_string()),
        sector_conflict: resolution.sector_conflict,
    }
}

fn not_found(e: &ResolveError) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": e.to_string()
    }))
}

fn precinct_not_found(num: u32) -> HttpResponse {
    not_found(&ResolveError::PrecinctNotFound {
        message: format!("precinct {num}"),
    })
}

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let store = state.resolver.store();
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        precincts: store.precincts().len(),
        sectors: store.sectors().len(),
        squads: store.squads().len(),
        provider_enabled: state.resolver.has_provider(),
    })
}

/// `GET /api/resolve?lat=&lng=`
///
/// Invalid coordinates resolve to an all-null result, not an error.
pub async fn resolve(
    state: web::Data<AppState>,
    params: web::Query<PointQueryParams>,
) -> HttpResponse {
    let resolution = state.resolver.resolve(params.point()).await;
    HttpResponse::Ok().json(to_api_resolution(&resolution))
}

/// `GET /api/resolve/address?q=`
pub async fn resolve_address(
    state: web::Data<AppState>,
    params: web::Query<AddressQueryParams>,
) -> HttpResponse {
    match state.resolver.resolve_by_address(&params.q).await {
        Ok(found) => HttpResponse::Ok().json(ApiAddressResolution {
            resolution: to_api_resolution(&found.resolution),
            resolved_point: found.resolved_point,
            display_address: found.display_address,
        }),
        Err(e) => {
            log::debug!("Address lookup failed: {e}");
            not_found(&e)
        }
    }
}

/// `GET /api/nearby-precinct?lat=&lng=`
///
/// The external provider's hint as-is; the number may not be loaded.
pub async fn nearby_precinct(
    state: web::Data<AppState>,
    params: web::Query<PointQueryParams>,
) -> HttpResponse {
    let precinct_num = state.resolver.nearby_precinct(params.point()).await;
    HttpResponse::Ok().json(ApiNearbyPrecinct { precinct_num })
}

/// `GET /api/precincts`
pub async fn precincts(state: web::Data<AppState>) -> HttpResponse {
    let summaries: Vec<ApiPrecinctSummary> = state
        .resolver
        .store()
        .precincts()
        .iter()
        .map(ApiPrecinctSummary::from)
        .collect();
    HttpResponse::Ok().json(summaries)
}

/// `GET /api/precincts/{num}`
///
/// Full record including boundary parts and opening hours.
pub async fn precinct(state: web::Data<AppState>, path: web::Path<u32>) -> HttpResponse {
    let num = path.into_inner();
    state
        .resolver
        .store()
        .precinct(num)
        .map_or_else(|| precinct_not_found(num), |p| HttpResponse::Ok().json(p))
}

/// `GET /api/precincts/{num}/sectors`
pub async fn precinct_sectors(state: web::Data<AppState>, path: web::Path<u32>) -> HttpResponse {
    let num = path.into_inner();
    let store = state.resolver.store();
    if store.precinct(num).is_none() {
        return precinct_not_found(num);
    }
    HttpResponse::Ok().json(store.sectors_for_precinct(num))
}

/// `GET /api/precincts/{num}/hours?year=&month=`
pub async fn precinct_hours(
    state: web::Data<AppState>,
    path: web::Path<u32>,
    params: web::Query<MonthQueryParams>,
) -> HttpResponse {
    let precinct_num = path.into_inner();
    match state
        .resolver
        .month_opening_hours(precinct_num, params.year, params.month)
    {
        Ok(days) => HttpResponse::Ok().json(ApiMonthHours {
            precinct_num,
            year: params.year,
            month: params.month,
            days,
        }),
        Err(e) => not_found(&e),
    }
}

/// `GET /api/squads`
pub async fn squads(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.resolver.store().squads())
}

/// `GET /api/squads/{id}/schedule?year=&month=`
///
/// `month` is 0-indexed.
pub async fn squad_schedule(
    state: web::Data<AppState>,
    path: web::Path<u32>,
    params: web::Query<MonthQueryParams>,
) -> HttpResponse {
    let squad_id = path.into_inner();
    match state
        .resolver
        .month_schedule_for_squad(squad_id, params.year, params.month)
    {
        Ok(days) => HttpResponse::Ok().json(ApiMonthSchedule {
            squad_id,
            year: params.year,
            month: params.month,
            days,
        }),
        Err(e) => not_found(&e),
    }
}

//! State Plane to WGS84 coordinate normalization.
//!
//! NYC open data boundary exports come either as plain `[lng, lat]`
//! degrees or in NAD83 / New York Long Island State Plane (EPSG:2263,
//! US survey feet). Projected pairs are recognised by magnitude and run
//! through an inverse Lambert Conformal Conic projection on the GRS80
//! ellipsoid. Everything is rejected unless it lands in [`METRO_BOUNDS`].

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::sync::LazyLock;

use precinct_map_jurisdiction_models::{GeoPoint, METRO_BOUNDS};

/// GRS80 semi-major axis in metres.
const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;

/// GRS80 inverse flattening.
const INVERSE_FLATTENING: f64 = 298.257_222_101;

/// Metres per US survey foot.
const US_SURVEY_FOOT: f64 = 1200.0 / 3937.0;

/// EPSG:2263 standard parallels, origin, and false easting.
const STANDARD_PARALLEL_1: f64 = 41.0 + 2.0 / 60.0;
const STANDARD_PARALLEL_2: f64 = 40.0 + 40.0 / 60.0;
const LATITUDE_OF_ORIGIN: f64 = 40.0 + 10.0 / 60.0;
const CENTRAL_MERIDIAN: f64 = -74.0;
const FALSE_EASTING_M: f64 = 300_000.0;
const FALSE_NORTHING_M: f64 = 0.0;

/// Iterations for the latitude fixed-point solve. Converges to well
/// below a millimetre after five or six.
const LATITUDE_ITERATIONS: usize = 15;

/// Derived cone constants for a two-standard-parallel LCC projection.
struct LambertConformalConic {
    e: f64,
    n: f64,
    a_f: f64,
    rho0: f64,
}

impl LambertConformalConic {
    fn new() -> Self {
        let f = 1.0 / INVERSE_FLATTENING;
        let e = f.mul_add(-f, 2.0 * f).sqrt();

        let phi1 = STANDARD_PARALLEL_1.to_radians();
        let phi2 = STANDARD_PARALLEL_2.to_radians();
        let phi0 = LATITUDE_OF_ORIGIN.to_radians();

        let m1 = m(phi1, e);
        let m2 = m(phi2, e);
        let t0 = t(phi0, e);
        let t1 = t(phi1, e);
        let t2 = t(phi2, e);

        let n = (m1.ln() - m2.ln()) / (t1.ln() - t2.ln());
        let a_f = SEMI_MAJOR_AXIS * m1 / (n * t1.powf(n));
        let rho0 = a_f * t0.powf(n);

        Self { e, n, a_f, rho0 }
    }

    /// Projected metres (false origin removed) to radians.
    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let dy = self.rho0 - y;
        let rho = x.hypot(dy).copysign(self.n);
        let theta = if self.n > 0.0 {
            x.atan2(dy)
        } else {
            (-x).atan2(-dy)
        };

        let t = (rho / self.a_f).powf(1.0 / self.n);
        let lambda = theta / self.n + CENTRAL_MERIDIAN.to_radians();

        let half_e = self.e / 2.0;
        let mut phi = 2.0f64.mul_add(-t.atan(), FRAC_PI_2);
        for _ in 0..LATITUDE_ITERATIONS {
            let es = self.e * phi.sin();
            phi = 2.0f64.mul_add(-(t * ((1.0 - es) / (1.0 + es)).powf(half_e)).atan(), FRAC_PI_2);
        }

        (lambda, phi)
    }

    /// Radians to projected metres (false origin removed).
    fn forward(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let rho = self.a_f * t(phi, self.e).powf(self.n);
        let theta = self.n * (lambda - CENTRAL_MERIDIAN.to_radians());
        (rho * theta.sin(), rho.mul_add(-theta.cos(), self.rho0))
    }
}

fn m(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    phi.cos() / es.mul_add(-es, 1.0).sqrt()
}

fn t(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - es) / (1.0 + es)).powf(e / 2.0)
}

static LONG_ISLAND_FT: LazyLock<LambertConformalConic> =
    LazyLock::new(LambertConformalConic::new);

/// Converts a State Plane (EPSG:2263) easting/northing in US survey feet
/// to `(longitude, latitude)` degrees.
///
/// Returns `None` if the result is not finite.
#[must_use]
pub fn unproject(easting_ft: f64, northing_ft: f64) -> Option<(f64, f64)> {
    let x = easting_ft.mul_add(US_SURVEY_FOOT, -FALSE_EASTING_M);
    let y = northing_ft.mul_add(US_SURVEY_FOOT, -FALSE_NORTHING_M);
    let (lambda, phi) = LONG_ISLAND_FT.inverse(x, y);
    let (lng, lat) = (lambda.to_degrees(), phi.to_degrees());
    (lng.is_finite() && lat.is_finite()).then_some((lng, lat))
}

/// Converts `(longitude, latitude)` degrees to a State Plane (EPSG:2263)
/// easting/northing in US survey feet.
#[must_use]
pub fn project(longitude: f64, latitude: f64) -> Option<(f64, f64)> {
    let (x, y) = LONG_ISLAND_FT.forward(longitude.to_radians(), latitude.to_radians());
    let easting = (x + FALSE_EASTING_M) / US_SURVEY_FOOT;
    let northing = (y + FALSE_NORTHING_M) / US_SURVEY_FOOT;
    (easting.is_finite() && northing.is_finite()).then_some((easting, northing))
}

/// Normalizes a raw `(x, y)` boundary pair to a WGS84 point.
///
/// A pair whose first component exceeds 180 or second exceeds 90 in
/// magnitude is treated as State Plane feet; anything else is read as
/// `(longitude, latitude)`. The point is returned only if it lies inside
/// [`METRO_BOUNDS`]; out-of-bounds points are rejected, never clamped.
#[must_use]
pub fn normalize(x: f64, y: f64) -> Option<GeoPoint> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }

    if x.abs() > 180.0 || y.abs() > 90.0 {
        if let Some((lng, lat)) = unproject(x, y)
            && METRO_BOUNDS.contains_lat_lng(lat, lng)
        {
            return Some(GeoPoint::new(lat, lng));
        }
    }

    METRO_BOUNDS
        .contains_lat_lng(y, x)
        .then_some(GeoPoint::new(y, x))
}

//! Projection math: the numeric core of every conversion pipeline.

pub mod common;
pub mod ellipsoid;
pub mod lambert_conformal;
pub mod mercator;
pub mod methods;
pub mod transverse_mercator;

use crate::error::Error;

/// A map projection supporting forward and inverse transforms.
///
/// Geographic coordinates are in radians; projected coordinates in metres
/// (false easting/northing applied).
pub trait Projection {
    /// Forward: (lon_rad, lat_rad) -> (easting, northing)
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), Error>;

    /// Inverse: (easting, northing) -> (lon_rad, lat_rad)
    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), Error>;

    fn ellipsoid(&self) -> &ellipsoid::Ellipsoid;
}

/// Shared input guard: projections reject non-finite geographic input and
/// latitudes beyond the poles rather than emitting garbage.
pub(crate) fn check_geographic_domain(name: &str, lon: f64, lat: f64) -> Result<(), Error> {
    if !lon.is_finite() || !lat.is_finite() || lat.abs() > std::f64::consts::FRAC_PI_2 + 1e-12 {
        return Err(Error::OutOfDomain(name.to_string()));
    }
    Ok(())
}

pub(crate) fn check_projected_domain(name: &str, x: f64, y: f64) -> Result<(), Error> {
    if !x.is_finite() || !y.is_finite() {
        return Err(Error::OutOfDomain(name.to_string()));
    }
    Ok(())
}

//! Mercator projections: ellipsoidal (variants A and B) and the spherical
//! Popular Visualisation Pseudo-Mercator used by EPSG:3857.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::error::Error;
use crate::proj::common::{msfn, phi_from_ts, tsfn};
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::{check_geographic_domain, check_projected_domain, Projection};

/// Ellipsoidal Mercator.
pub struct Mercator {
    ellipsoid: Ellipsoid,
    lon0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl Mercator {
    /// Variant A: explicit scale factor at the natural origin.
    pub fn with_scale_factor(
        ellipsoid: Ellipsoid,
        lon0: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        Self {
            ellipsoid,
            lon0,
            k0,
            false_easting,
            false_northing,
        }
    }

    /// Variant B: scale factor derived from the standard parallel.
    pub fn with_standard_parallel(
        ellipsoid: Ellipsoid,
        lon0: f64,
        lat_ts: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let k0 = msfn(lat_ts, ellipsoid.e2);
        Self::with_scale_factor(ellipsoid, lon0, k0, false_easting, false_northing)
    }
}

impl Projection for Mercator {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), Error> {
        check_geographic_domain("Mercator", lon, lat)?;
        // The poles map to infinity.
        if lat.abs() > FRAC_PI_2 - 1e-10 {
            return Err(Error::OutOfDomain("Mercator".into()));
        }
        let e = self.ellipsoid.e();
        let x = self.ellipsoid.a * self.k0 * (lon - self.lon0) + self.false_easting;
        let y = self.ellipsoid.a * self.k0 * (-tsfn(lat, e).ln()) + self.false_northing;
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), Error> {
        check_projected_domain("Mercator", x, y)?;
        let e = self.ellipsoid.e();
        let lon = self.lon0 + (x - self.false_easting) / (self.ellipsoid.a * self.k0);
        let ts = (-(y - self.false_northing) / (self.ellipsoid.a * self.k0)).exp();
        Ok((lon, phi_from_ts(ts, e)))
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }
}

/// Popular Visualisation Pseudo-Mercator (EPSG method 1024): spherical
/// formulas on the WGS 84 semi-major axis.
pub struct PseudoMercator {
    ellipsoid: Ellipsoid,
    lon0: f64,
    false_easting: f64,
    false_northing: f64,
}

/// Latitude bound where the projection becomes a square: atan(sinh(π)).
const MAX_LAT: f64 = 1.4844222297453324;

impl PseudoMercator {
    pub fn new(ellipsoid: Ellipsoid, lon0: f64, false_easting: f64, false_northing: f64) -> Self {
        Self {
            ellipsoid,
            lon0,
            false_easting,
            false_northing,
        }
    }
}

impl Projection for PseudoMercator {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), Error> {
        check_geographic_domain("Popular Visualisation Pseudo Mercator", lon, lat)?;
        let lat = lat.clamp(-MAX_LAT, MAX_LAT);
        let x = self.ellipsoid.a * (lon - self.lon0) + self.false_easting;
        let y = self.ellipsoid.a * (FRAC_PI_4 + lat / 2.0).tan().ln() + self.false_northing;
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), Error> {
        check_projected_domain("Popular Visualisation Pseudo Mercator", x, y)?;
        let lon = self.lon0 + (x - self.false_easting) / self.ellipsoid.a;
        let lat =
            2.0 * ((y - self.false_northing) / self.ellipsoid.a).exp().atan() - FRAC_PI_2;
        Ok((lon, lat))
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::WGS84;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_pseudo_mercator_reference_point() {
        // (180°, 0°) -> (20037508.34, 0)
        let p = PseudoMercator::new(WGS84, 0.0, 0.0, 0.0);
        let (x, y) = p.forward(PI, 0.0).unwrap();
        assert_relative_eq!(x, 20_037_508.342_789_244, epsilon = 0.01);
        assert_relative_eq!(y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pseudo_mercator_roundtrip() {
        let p = PseudoMercator::new(WGS84, 0.0, 0.0, 0.0);
        for &(lon_deg, lat_deg) in &[(0.0, 0.0), (10.0, 45.0), (-73.9857, 40.7484), (139.69, 35.69)]
        {
            let lon = (lon_deg as f64).to_radians();
            let lat = (lat_deg as f64).to_radians();
            let (x, y) = p.forward(lon, lat).unwrap();
            let (lon2, lat2) = p.inverse(x, y).unwrap();
            assert_relative_eq!(lon2, lon, epsilon = 1e-10);
            assert_relative_eq!(lat2, lat, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_pseudo_mercator_polar_clamp() {
        let p = PseudoMercator::new(WGS84, 0.0, 0.0, 0.0);
        let (_, y) = p.forward(0.0, FRAC_PI_2).unwrap();
        assert!(y.is_finite());
    }

    #[test]
    fn test_ellipsoidal_roundtrip() {
        let m = Mercator::with_scale_factor(WGS84, 0.0, 1.0, 0.0, 0.0);
        for &(lon_deg, lat_deg) in &[(0.0, 0.0), (10.0, 45.0), (-73.9857, 40.7484)] {
            let lon = (lon_deg as f64).to_radians();
            let lat = (lat_deg as f64).to_radians();
            let (x, y) = m.forward(lon, lat).unwrap();
            let (lon2, lat2) = m.inverse(x, y).unwrap();
            assert_relative_eq!(lon2, lon, epsilon = 1e-10);
            assert_relative_eq!(lat2, lat, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_variant_b_scale() {
        // With lat_ts = 0 variant B reduces to k0 = 1.
        let b = Mercator::with_standard_parallel(WGS84, 0.0, 0.0, 0.0, 0.0);
        let a = Mercator::with_scale_factor(WGS84, 0.0, 1.0, 0.0, 0.0);
        let (xa, ya) = a.forward(0.2, 0.7).unwrap();
        let (xb, yb) = b.forward(0.2, 0.7).unwrap();
        assert_relative_eq!(xa, xb, epsilon = 1e-9);
        assert_relative_eq!(ya, yb, epsilon = 1e-9);
    }

    #[test]
    fn test_pole_is_out_of_domain() {
        let m = Mercator::with_scale_factor(WGS84, 0.0, 1.0, 0.0, 0.0);
        assert!(matches!(
            m.forward(0.0, FRAC_PI_2).unwrap_err(),
            Error::OutOfDomain(_)
        ));
    }
}

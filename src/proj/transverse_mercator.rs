//! Transverse Mercator — Krüger n-series, 6th order (Karney 2011).
//!
//! The projection behind every UTM zone and most national grids.

use crate::error::Error;
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::{check_geographic_domain, check_projected_domain, Projection};

/// Longitudes further than this from the central meridian are outside the
/// series' validity and are rejected as out-of-domain.
const MAX_DLON: f64 = 1.0471975511965976; // 60°

pub struct TransverseMercator {
    ellipsoid: Ellipsoid,
    lon0: f64,
    false_easting: f64,
    false_northing: f64,
    radius: f64,     // rectifying radius k0 * A
    alpha: [f64; 6], // forward series
    beta: [f64; 6],  // inverse series
    xi0: f64,        // normalized meridional arc at lat0
}

impl TransverseMercator {
    pub fn new(
        ellipsoid: Ellipsoid,
        lon0: f64,
        lat0: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let n = ellipsoid.n;
        let p = powers(n);
        let a_hat = ellipsoid.a / (1.0 + n) * (1.0 + p[2] / 4.0 + p[4] / 64.0);
        let mut tm = Self {
            ellipsoid,
            lon0,
            false_easting,
            false_northing,
            radius: k0 * a_hat,
            alpha: alpha_series(&p),
            beta: beta_series(&p),
            xi0: 0.0,
        };
        tm.xi0 = rectifying_latitude(lat0, n);
        tm
    }

    fn tau_to_tau_prime(&self, tau: f64) -> f64 {
        let e = self.ellipsoid.e();
        let sec = (1.0 + tau * tau).sqrt();
        let sigma = (e * (e * tau / sec).atanh()).sinh();
        tau * (1.0 + sigma * sigma).sqrt() - sigma * sec
    }

    fn tau_prime_to_tau(&self, tau_prime: f64) -> f64 {
        let e = self.ellipsoid.e();
        let e2 = self.ellipsoid.e2;
        let mut tau = tau_prime;
        for _ in 0..15 {
            let sec = (1.0 + tau * tau).sqrt();
            let sigma = (e * (e * tau / sec).atanh()).sinh();
            let estimate = tau * (1.0 + sigma * sigma).sqrt() - sigma * sec;
            let dtau = (tau_prime - estimate) * (1.0 + (1.0 - e2) * tau * tau)
                / ((1.0 - e2) * sec * (1.0 + estimate * estimate).sqrt());
            tau += dtau;
            if dtau.abs() < 1e-12 * (1.0 + tau.abs()) {
                break;
            }
        }
        tau
    }
}

/// n^0..n^6
fn powers(n: f64) -> [f64; 7] {
    let mut p = [1.0; 7];
    for i in 1..7 {
        p[i] = p[i - 1] * n;
    }
    p
}

/// Forward series coefficients α₁..α₆.
fn alpha_series(p: &[f64; 7]) -> [f64; 6] {
    [
        p[1] / 2.0 - 2.0 / 3.0 * p[2] + 5.0 / 16.0 * p[3] + 41.0 / 180.0 * p[4]
            - 127.0 / 288.0 * p[5]
            + 7891.0 / 37800.0 * p[6],
        13.0 / 48.0 * p[2] - 3.0 / 5.0 * p[3] + 557.0 / 1440.0 * p[4] + 281.0 / 630.0 * p[5]
            - 1983433.0 / 1935360.0 * p[6],
        61.0 / 240.0 * p[3] - 103.0 / 140.0 * p[4] + 15061.0 / 26880.0 * p[5]
            + 167603.0 / 181440.0 * p[6],
        49561.0 / 161280.0 * p[4] - 179.0 / 168.0 * p[5] + 6601661.0 / 7257600.0 * p[6],
        34729.0 / 80640.0 * p[5] - 3418889.0 / 1995840.0 * p[6],
        212378941.0 / 319334400.0 * p[6],
    ]
}

/// Inverse series coefficients β₁..β₆.
fn beta_series(p: &[f64; 7]) -> [f64; 6] {
    [
        p[1] / 2.0 - 2.0 / 3.0 * p[2] + 37.0 / 96.0 * p[3] - 1.0 / 360.0 * p[4]
            - 81.0 / 512.0 * p[5]
            + 96199.0 / 604800.0 * p[6],
        1.0 / 48.0 * p[2] + 1.0 / 15.0 * p[3] - 437.0 / 1440.0 * p[4] + 46.0 / 105.0 * p[5]
            - 1118711.0 / 3870720.0 * p[6],
        17.0 / 480.0 * p[3] - 37.0 / 840.0 * p[4] - 209.0 / 4480.0 * p[5] + 5569.0 / 90720.0 * p[6],
        4397.0 / 161280.0 * p[4] - 11.0 / 504.0 * p[5] - 830251.0 / 7257600.0 * p[6],
        4583.0 / 161280.0 * p[5] - 108847.0 / 3991680.0 * p[6],
        20648693.0 / 638668800.0 * p[6],
    ]
}

/// Normalized meridional arc (rectifying latitude) ξ₀.
fn rectifying_latitude(phi: f64, n: f64) -> f64 {
    let p = powers(n);
    let a2 = -3.0 / 2.0 * p[1] + 9.0 / 16.0 * p[3];
    let a4 = 15.0 / 16.0 * p[2] - 15.0 / 32.0 * p[4];
    let a6 = -35.0 / 48.0 * p[3];
    let a8 = 315.0 / 512.0 * p[4];
    phi + a2 * (2.0 * phi).sin()
        + a4 * (4.0 * phi).sin()
        + a6 * (6.0 * phi).sin()
        + a8 * (8.0 * phi).sin()
}

impl Projection for TransverseMercator {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), Error> {
        check_geographic_domain("Transverse Mercator", lon, lat)?;
        let dlam = normalize_lon(lon - self.lon0);
        if dlam.abs() > MAX_DLON {
            return Err(Error::OutOfDomain("Transverse Mercator".into()));
        }

        let tau_prime = self.tau_to_tau_prime(lat.tan());
        let xi_prime = tau_prime.atan2(dlam.cos());
        let eta_prime =
            (dlam.sin() / (tau_prime * tau_prime + dlam.cos() * dlam.cos()).sqrt()).asinh();

        let mut xi = xi_prime;
        let mut eta = eta_prime;
        for (j, &a) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi += a * (k * xi_prime).sin() * (k * eta_prime).cosh();
            eta += a * (k * xi_prime).cos() * (k * eta_prime).sinh();
        }

        let x = self.radius * eta + self.false_easting;
        let y = self.radius * (xi - self.xi0) + self.false_northing;
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), Error> {
        check_projected_domain("Transverse Mercator", x, y)?;
        let eta = (x - self.false_easting) / self.radius;
        let xi = (y - self.false_northing) / self.radius + self.xi0;

        let mut xi_prime = xi;
        let mut eta_prime = eta;
        for (j, &b) in self.beta.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi_prime -= b * (k * xi).sin() * (k * eta).cosh();
            eta_prime -= b * (k * xi).cos() * (k * eta).sinh();
        }

        let sinh_eta = eta_prime.sinh();
        let cos_xi = xi_prime.cos();
        let tau_prime = xi_prime.sin() / (sinh_eta * sinh_eta + cos_xi * cos_xi).sqrt();
        let tau = self.tau_prime_to_tau(tau_prime);

        let lat = tau.atan();
        let lon = self.lon0 + sinh_eta.atan2(cos_xi);
        Ok((lon, lat))
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }
}

fn normalize_lon(mut lon: f64) -> f64 {
    use std::f64::consts::PI;
    while lon > PI {
        lon -= 2.0 * PI;
    }
    while lon < -PI {
        lon += 2.0 * PI;
    }
    lon
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::WGS84;
    use approx::assert_relative_eq;

    /// Standard UTM parameterization for a zone 1..=60 on WGS 84.
    fn utm_zone(zone: u8, north: bool) -> TransverseMercator {
        let lon0 = ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians();
        let false_northing = if north { 0.0 } else { 10_000_000.0 };
        TransverseMercator::new(WGS84, lon0, 0.0, 0.9996, 500_000.0, false_northing)
    }

    #[test]
    fn test_roundtrip_utm33() {
        let tm = utm_zone(33, true);
        let cases: &[(f64, f64)] = &[
            (15.0, 52.0),
            (12.0, 50.0),
            (18.0, 50.0),
            (15.0, 0.0),
            (15.0, 80.0),
            (13.5, 52.5),
        ];
        for &(lon_deg, lat_deg) in cases {
            let lon = lon_deg.to_radians();
            let lat = lat_deg.to_radians();
            let (x, y) = tm.forward(lon, lat).unwrap();
            let (lon2, lat2) = tm.inverse(x, y).unwrap();
            assert_relative_eq!(lon2, lon, epsilon = 1e-9);
            assert_relative_eq!(lat2, lat, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_central_meridian_easting() {
        let tm = utm_zone(33, true);
        let (e, _) = tm
            .forward(15.0_f64.to_radians(), 45.0_f64.to_radians())
            .unwrap();
        assert_relative_eq!(e, 500_000.0, epsilon = 0.01);
    }

    #[test]
    fn test_utm33_known_point() {
        // (12°E, 55°N) in UTM zone 33N; reference easting/northing from PROJ:
        // 308124.37, 6098907.83 (centimetre agreement expected)
        let tm = utm_zone(33, true);
        let (e, n) = tm
            .forward(12.0_f64.to_radians(), 55.0_f64.to_radians())
            .unwrap();
        assert_relative_eq!(e, 308_124.37, epsilon = 0.05);
        assert_relative_eq!(n, 6_098_907.83, epsilon = 0.05);
    }

    #[test]
    fn test_matches_proj4rs() {
        let tm = utm_zone(33, true);
        let proj = proj4rs::Proj::from_user_string("+proj=utm +zone=33 +ellps=WGS84").unwrap();
        let geo = proj4rs::Proj::from_user_string("+proj=longlat +ellps=WGS84").unwrap();
        for &(lon_deg, lat_deg) in &[(12.0, 55.0), (15.0, 52.0), (17.5, 40.0)] {
            let mut point = ((lon_deg as f64).to_radians(), (lat_deg as f64).to_radians());
            proj4rs::transform::transform(&geo, &proj, &mut point).unwrap();
            let (e, n) = tm
                .forward((lon_deg as f64).to_radians(), (lat_deg as f64).to_radians())
                .unwrap();
            assert_relative_eq!(e, point.0, epsilon = 1e-3);
            assert_relative_eq!(n, point.1, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_southern_hemisphere_false_northing() {
        let tm = utm_zone(33, false);
        let (x, y) = tm
            .forward(15.0_f64.to_radians(), (-30.0_f64).to_radians())
            .unwrap();
        assert!(y > 0.0, "false northing should keep y positive, got {y}");
        let (lon2, lat2) = tm.inverse(x, y).unwrap();
        assert_relative_eq!(lon2, 15.0_f64.to_radians(), epsilon = 1e-9);
        assert_relative_eq!(lat2, (-30.0_f64).to_radians(), epsilon = 1e-9);
    }

    #[test]
    fn test_far_from_central_meridian_is_out_of_domain() {
        let tm = utm_zone(33, true);
        let err = tm
            .forward(110.0_f64.to_radians(), 45.0_f64.to_radians())
            .unwrap_err();
        assert!(matches!(err, Error::OutOfDomain(_)));
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let tm = utm_zone(33, true);
        assert!(tm.forward(f64::NAN, 0.5).is_err());
        assert!(tm.inverse(f64::INFINITY, 0.0).is_err());
    }
}

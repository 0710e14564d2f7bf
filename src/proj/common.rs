//! Shared helpers for conformal projection math.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// tsfn(φ, e) = tan(π/4 - φ/2) / ((1 - e·sinφ)/(1 + e·sinφ))^(e/2)
///
/// The isometric-latitude kernel used by Mercator and Lambert Conformal.
pub fn tsfn(phi: f64, e: f64) -> f64 {
    let sinphi = phi.sin();
    let con = e * sinphi;
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - con) / (1.0 + con)).powf(e / 2.0)
}

/// msfn(φ, e²) = cosφ / sqrt(1 - e²·sin²φ)
pub fn msfn(phi: f64, e2: f64) -> f64 {
    let sinphi = phi.sin();
    phi.cos() / (1.0 - e2 * sinphi * sinphi).sqrt()
}

/// Invert `tsfn`: recover φ from t by fixed-point iteration.
pub fn phi_from_ts(ts: f64, e: f64) -> f64 {
    let half_e = e / 2.0;
    let mut phi = FRAC_PI_2 - 2.0 * ts.atan();
    for _ in 0..15 {
        let con = e * phi.sin();
        let next = FRAC_PI_2 - 2.0 * (ts * ((1.0 - con) / (1.0 + con)).powf(half_e)).atan();
        if (next - phi).abs() < 1e-14 {
            return next;
        }
        phi = next;
    }
    phi
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::proj::ellipsoid::WGS84;

    #[test]
    fn test_tsfn_phi_roundtrip() {
        let e = WGS84.e();
        for lat_deg in [-80.0, -45.0, 0.0, 30.0, 60.0, 85.0] {
            let phi: f64 = (lat_deg as f64).to_radians();
            let ts = tsfn(phi, e);
            assert_relative_eq!(phi_from_ts(ts, e), phi, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_msfn_equator() {
        assert_relative_eq!(msfn(0.0, WGS84.e2), 1.0, epsilon = 1e-15);
    }
}

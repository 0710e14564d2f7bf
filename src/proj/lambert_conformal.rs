//! Lambert Conformal Conic, 1SP and 2SP variants.

use crate::error::Error;
use crate::proj::common::{msfn, phi_from_ts, tsfn};
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::{check_geographic_domain, check_projected_domain, Projection};

pub struct LambertConformalConic {
    ellipsoid: Ellipsoid,
    lon0: f64,
    n: f64,    // cone constant
    big_f: f64, // F = m₁/(n·t₁ⁿ)
    rho0: f64, // ρ₀ = a·F·t₀ⁿ
    false_easting: f64,
    false_northing: f64,
}

impl LambertConformalConic {
    /// Two standard parallels (EPSG method 9802).
    pub fn two_parallels(
        ellipsoid: Ellipsoid,
        lon0: f64,
        lat0: f64,
        lat1: f64,
        lat2: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let e = ellipsoid.e();
        let m1 = msfn(lat1, ellipsoid.e2);
        let m2 = msfn(lat2, ellipsoid.e2);
        let t0 = tsfn(lat0, e);
        let t1 = tsfn(lat1, e);
        let t2 = tsfn(lat2, e);

        let n = if (lat1 - lat2).abs() > 1e-10 {
            (m1.ln() - m2.ln()) / (t1.ln() - t2.ln())
        } else {
            lat1.sin()
        };
        let big_f = m1 / (n * t1.powf(n));
        let rho0 = ellipsoid.a * big_f * t0.powf(n);

        Self {
            ellipsoid,
            lon0,
            n,
            big_f,
            rho0,
            false_easting,
            false_northing,
        }
    }

    /// One standard parallel with scale factor (EPSG method 9801).
    pub fn one_parallel(
        ellipsoid: Ellipsoid,
        lon0: f64,
        lat0: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let e = ellipsoid.e();
        let n = lat0.sin();
        let m0 = msfn(lat0, ellipsoid.e2);
        let t0 = tsfn(lat0, e);
        let big_f = m0 / (n * t0.powf(n)) * k0;
        let rho0 = ellipsoid.a * big_f * t0.powf(n);

        Self {
            ellipsoid,
            lon0,
            n,
            big_f,
            rho0,
            false_easting,
            false_northing,
        }
    }
}

impl Projection for LambertConformalConic {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), Error> {
        check_geographic_domain("Lambert Conformal Conic", lon, lat)?;
        // The pole opposite the cone apex is unreachable.
        if (lat * self.n.signum()) < -std::f64::consts::FRAC_PI_2 + 1e-10 {
            return Err(Error::OutOfDomain("Lambert Conformal Conic".into()));
        }
        let e = self.ellipsoid.e();
        let t = tsfn(lat, e);
        let rho = self.ellipsoid.a * self.big_f * t.powf(self.n);
        let theta = self.n * (lon - self.lon0);

        Ok((
            rho * theta.sin() + self.false_easting,
            self.rho0 - rho * theta.cos() + self.false_northing,
        ))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), Error> {
        check_projected_domain("Lambert Conformal Conic", x, y)?;
        let dx = x - self.false_easting;
        let dy = self.rho0 - (y - self.false_northing);
        let (xn, yn) = if self.n < 0.0 { (-dx, -dy) } else { (dx, dy) };

        let rho = (xn * xn + yn * yn).sqrt();
        if rho == 0.0 && self.n.abs() < 1.0 {
            return Err(Error::OutOfDomain("Lambert Conformal Conic".into()));
        }
        let theta = xn.atan2(yn);

        let e = self.ellipsoid.e();
        let ts = (rho / (self.ellipsoid.a * self.big_f)).powf(1.0 / self.n);
        Ok((self.lon0 + theta / self.n, phi_from_ts(ts, e)))
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }
}

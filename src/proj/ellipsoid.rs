//! Precomputed ellipsoid shape parameters for projection math.

/// Derived ellipsoid quantities, computed once per projection setup.
#[derive(Clone, Copy, Debug)]
pub struct Ellipsoid {
    /// Semi-major axis (metres)
    pub a: f64,
    /// Flattening (dimensionless; 0 for a sphere)
    pub f: f64,
    /// Semi-minor axis: a * (1 - f)
    pub b: f64,
    /// First eccentricity squared: 2f - f^2
    pub e2: f64,
    /// Second eccentricity squared: e^2 / (1 - e^2)
    pub ep2: f64,
    /// Third flattening: f / (2 - f)
    pub n: f64,
}

impl Ellipsoid {
    pub const fn new(a: f64, f: f64) -> Self {
        let b = a * (1.0 - f);
        let e2 = 2.0 * f - f * f;
        let ep2 = e2 / (1.0 - e2);
        let n = f / (2.0 - f);
        Self { a, f, b, e2, ep2, n }
    }

    /// First eccentricity.
    pub fn e(&self) -> f64 {
        self.e2.sqrt()
    }
}

// Reference shapes for the numeric tests; production code always derives the
// shape from the parsed ellipsoid definition.
#[cfg(test)]
pub const WGS84: Ellipsoid = Ellipsoid::new(6_378_137.0, 1.0 / 298.257_223_563);
#[cfg(test)]
pub const GRS80: Ellipsoid = Ellipsoid::new(6_378_137.0, 1.0 / 298.257_222_101);

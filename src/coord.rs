//! The 4-tuple coordinate value exchanged with every transform.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::op::CoordinateOperation;

/// A coordinate as consumed and produced by coordinate operations.
///
/// `z` and `t` default to 0 when a coordinate is built from two or three
/// values. On *output*, a NaN `z` or `t` means "this axis does not exist in
/// the target system" (e.g. the Z slot after transforming into a 2D CRS) and
/// is distinct from a computed zero. The NaN checks are isolated behind
/// [`Coordinate::has_z`] and [`Coordinate::has_t`]; [`Coordinate::to_vec`]
/// trims the absent components.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub t: f64,
}

impl Coordinate {
    pub fn xy(x: f64, y: f64) -> Self {
        Coordinate { x, y, z: 0.0, t: 0.0 }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Coordinate { x, y, z, t: 0.0 }
    }

    pub fn xyzt(x: f64, y: f64, z: f64, t: f64) -> Self {
        Coordinate { x, y, z, t }
    }

    /// Build from up to four values; missing trailing components become 0.
    pub fn from_slice(v: &[f64]) -> Result<Self, Error> {
        if v.len() < 2 {
            return Err(Error::InvalidParameter(
                "a coordinate needs at least x and y".into(),
            ));
        }
        Ok(Coordinate {
            x: v[0],
            y: v[1],
            z: v.get(2).copied().unwrap_or(0.0),
            t: v.get(3).copied().unwrap_or(0.0),
        })
    }

    /// Whether the Z slot carries a value (NaN encodes "axis not present").
    pub fn has_z(&self) -> bool {
        !self.z.is_nan()
    }

    /// Whether the T slot carries a value.
    pub fn has_t(&self) -> bool {
        !self.t.is_nan()
    }

    /// Component by index, 0..=3.
    pub fn get(&self, index: usize) -> Option<f64> {
        match index {
            0 => Some(self.x),
            1 => Some(self.y),
            2 => Some(self.z),
            3 => Some(self.t),
            _ => None,
        }
    }

    /// Array form with absent (NaN) trailing components removed.
    pub fn to_vec(&self) -> Vec<f64> {
        if !self.has_z() {
            vec![self.x, self.y]
        } else if !self.has_t() {
            vec![self.x, self.y, self.z]
        } else {
            vec![self.x, self.y, self.z, self.t]
        }
    }

    /// A copy with every component rounded to `decimals` fraction digits.
    pub fn round(&self, decimals: u32) -> Self {
        let p = 10f64.powi(decimals as i32);
        let r = |v: f64| (v * p).round() / p;
        Coordinate {
            x: r(self.x),
            y: r(self.y),
            z: r(self.z),
            t: r(self.t),
        }
    }

    /// Apply `operation` to this coordinate, producing a new value.
    pub fn transform(&self, operation: &CoordinateOperation) -> Result<Coordinate, Error> {
        operation.apply(*self)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((x, y): (f64, f64)) -> Self {
        Coordinate::xy(x, y)
    }
}

impl From<(f64, f64, f64)> for Coordinate {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Coordinate::xyz(x, y, z)
    }
}

impl From<(f64, f64, f64, f64)> for Coordinate {
    fn from((x, y, z, t): (f64, f64, f64, f64)) -> Self {
        Coordinate::xyzt(x, y, z, t)
    }
}

// Hash over the raw bit patterns so equal values hash alike; equality itself
// stays the exact component-wise f64 comparison (NaN != NaN, as specified).
impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
        self.z.to_bits().hash(state);
        self.t.to_bits().hash(state);
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_z() {
            write!(f, "X={}, Y={}", self.x, self.y)
        } else if !self.has_t() {
            write!(f, "X={}, Y={}, Z={}", self.x, self.y, self.z)
        } else {
            write!(f, "X={}, Y={}, Z={}, T={}", self.x, self.y, self.z, self.t)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_value_constructor_defaults_zero() {
        let c = Coordinate::xy(10.0, 20.0);
        assert_eq!(c.z, 0.0);
        assert_eq!(c.t, 0.0);
        assert!(c.has_z());
        assert!(c.has_t());
    }

    #[test]
    fn test_to_vec_trims_absent_components() {
        let c = Coordinate::xyzt(1.0, 2.0, f64::NAN, f64::NAN);
        assert_eq!(c.to_vec(), vec![1.0, 2.0]);

        let c = Coordinate::xyzt(1.0, 2.0, 3.0, f64::NAN);
        assert_eq!(c.to_vec(), vec![1.0, 2.0, 3.0]);

        let c = Coordinate::xyzt(1.0, 2.0, 3.0, 4.0);
        assert_eq!(c.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_from_slice() {
        assert!(Coordinate::from_slice(&[1.0]).is_err());
        let c = Coordinate::from_slice(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(c.z, 3.0);
        assert_eq!(c.t, 0.0);
    }

    #[test]
    fn test_exact_equality() {
        assert_eq!(Coordinate::xy(1.0, 2.0), Coordinate::xyzt(1.0, 2.0, 0.0, 0.0));
        assert_ne!(Coordinate::xy(1.0, 2.0), Coordinate::xy(1.0, 2.0 + 1e-15));
        // NaN components never compare equal
        let nan = Coordinate::xyzt(1.0, 2.0, f64::NAN, 0.0);
        assert_ne!(nan, nan);
    }

    #[test]
    fn test_round() {
        let c = Coordinate::xy(1.23456, -7.98765).round(2);
        assert_eq!(c.x, 1.23);
        assert_eq!(c.y, -7.99);
    }

    #[test]
    fn test_display_omits_absent() {
        let c = Coordinate::xyzt(1.0, 2.0, f64::NAN, f64::NAN);
        assert_eq!(c.to_string(), "X=1, Y=2");
        let c = Coordinate::xyz(1.0, 2.0, 3.0);
        assert_eq!(c.to_string(), "X=1, Y=2, Z=3, T=0");
    }
}

//! Identifier and usage-area value types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An (authority, code) pair, e.g. `EPSG:4326`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    authority: String,
    code: String,
}

impl Identifier {
    pub fn new(authority: impl Into<String>, code: impl Into<String>) -> Self {
        Identifier {
            authority: authority.into(),
            code: code.into(),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

/// Ordered list of identifiers; the first entry is the primary one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentifierList(Vec<Identifier>);

impl IdentifierList {
    pub fn new(ids: Vec<Identifier>) -> Self {
        IdentifierList(ids)
    }

    pub fn primary(&self) -> Option<&Identifier> {
        self.0.first()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Identifier> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Identifier> {
        self.0.get(index)
    }
}

impl<'a> IntoIterator for &'a IdentifierList {
    type Item = &'a Identifier;
    type IntoIter = std::slice::Iter<'a, Identifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Geographic bounding rectangle in degrees within which a CRS or operation
/// is valid or recommended. West may exceed east for boxes crossing the
/// antimeridian.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageArea {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
    pub name: String,
}

impl UsageArea {
    pub const WORLD: UsageArea = UsageArea {
        west: -180.0,
        south: -90.0,
        east: 180.0,
        north: 90.0,
        name: String::new(),
    };

    pub fn new(west: f64, south: f64, east: f64, north: f64, name: impl Into<String>) -> Self {
        UsageArea {
            west,
            south,
            east,
            north,
            name: name.into(),
        }
    }

    pub fn world() -> Self {
        UsageArea::new(-180.0, -90.0, 180.0, 90.0, "World")
    }

    fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Whether a lon/lat point (degrees) falls inside the box.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        if lat < self.south || lat > self.north {
            return false;
        }
        if self.crosses_antimeridian() {
            lon >= self.west || lon <= self.east
        } else {
            lon >= self.west && lon <= self.east
        }
    }

    /// Whether two boxes overlap (shared boundary counts).
    pub fn intersects(&self, other: &UsageArea) -> bool {
        if self.south > other.north || other.south > self.north {
            return false;
        }
        let spans = |a: &UsageArea| -> [(f64, f64); 2] {
            if a.crosses_antimeridian() {
                [(a.west, 180.0), (-180.0, a.east)]
            } else {
                [(a.west, a.east), (f64::NAN, f64::NAN)]
            }
        };
        for (w1, e1) in spans(self) {
            if w1.is_nan() {
                continue;
            }
            for (w2, e2) in spans(other) {
                if w2.is_nan() {
                    continue;
                }
                if w1 <= e2 && w2 <= e1 {
                    return true;
                }
            }
        }
        false
    }

    /// Approximate size used to rank "more specific area first": span in
    /// square degrees, latitude-weighted so polar slivers rank small.
    pub fn extent(&self) -> f64 {
        let width = if self.crosses_antimeridian() {
            360.0 - (self.west - self.east)
        } else {
            self.east - self.west
        };
        let midlat = ((self.south + self.north) / 2.0).to_radians();
        width.max(0.0) * (self.north - self.south).max(0.0) * midlat.cos().max(0.05)
    }
}

/// Area hint handed to operation selection; same shape as a usage area.
pub type AreaOfInterest = UsageArea;

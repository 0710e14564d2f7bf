//! Structural equivalence over definitions.
//!
//! Metadata (identifiers, remarks, usage areas, deprecation) never affects
//! the outcome; names are compared loosely through [`normalize_name`] and a
//! small alias table; numeric parameters compare within tolerances.

use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Strictness {
    /// Full structural comparison.
    Strict,
    /// Ignores axis ordering of geographic CRS.
    RelaxedAxisOrder,
}

const LENGTH_TOL: f64 = 1e-6; // metres
const ANGLE_TOL: f64 = 1e-10; // degrees
const SCALE_TOL: f64 = 1e-12;

/// Lowercase, alphanumeric-only form of a name.
pub(crate) fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Canonical spelling for datum/CRS names that appear under several aliases
/// across WKT revisions and the ESRI flavor.
pub(crate) fn canonical_name(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    let lower = lower.strip_prefix("d_").unwrap_or(&lower);
    let lower = lower.strip_prefix("gcs_").unwrap_or(lower);
    let n = normalize_name(lower);
    match n.as_str() {
        "wgs84" | "wgs1984" | "worldgeodeticsystem1984" | "gcswgs1984" => "wgs1984".into(),
        "nad83" | "northamericandatum1983" => "nad1983".into(),
        "nad27" | "northamericandatum1927" => "nad1927".into(),
        "etrs89" | "europeanterrestrialreferencesystem1989" | "etrf89" => "etrs1989".into(),
        "ed50" | "europeandatum1950" => "ed1950".into(),
        _ => n,
    }
}

fn names_match(a: &str, b: &str) -> bool {
    a.is_empty() || b.is_empty() || canonical_name(a) == canonical_name(b)
}

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

pub(crate) fn equivalent(a: &Def, b: &Def, strictness: Strictness) -> bool {
    match (a, b) {
        (Def::Ellipsoid(x), Def::Ellipsoid(y)) => ellipsoids_equivalent(x, y),
        (Def::PrimeMeridian(x), Def::PrimeMeridian(y)) => prime_meridians_equivalent(x, y),
        (Def::Datum(x), Def::Datum(y)) => datums_equivalent(x, y),
        (Def::DatumEnsemble(x), Def::DatumEnsemble(y)) => {
            names_match(&x.info.name, &y.info.name)
                && x.members.len() == y.members.len()
                && x.members
                    .iter()
                    .zip(&y.members)
                    .all(|(m, n)| datums_equivalent(m, n))
        }
        (Def::CoordinateSystem(x), Def::CoordinateSystem(y)) => {
            coordinate_systems_equivalent(x, y, false)
        }
        (Def::Crs(x), Def::Crs(y)) => crs_equivalent(x, y, strictness),
        (Def::Operation(x), Def::Operation(y)) => operations_equivalent(x, y),
        _ => false,
    }
}

pub(crate) fn ellipsoids_equivalent(a: &EllipsoidDef, b: &EllipsoidDef) -> bool {
    close(a.semi_major, b.semi_major, LENGTH_TOL)
        && close(a.semi_minor(), b.semi_minor(), LENGTH_TOL)
}

fn prime_meridians_equivalent(a: &PrimeMeridianDef, b: &PrimeMeridianDef) -> bool {
    close(a.longitude, b.longitude, ANGLE_TOL)
}

pub(crate) fn datums_equivalent(a: &DatumDef, b: &DatumDef) -> bool {
    if a.kind != b.kind || !names_match(&a.info.name, &b.info.name) {
        return false;
    }
    match (&a.ellipsoid, &b.ellipsoid) {
        (Some(x), Some(y)) if !ellipsoids_equivalent(x, y) => return false,
        (Some(_), None) | (None, Some(_)) => return false,
        _ => {}
    }
    match (&a.prime_meridian, &b.prime_meridian) {
        (Some(x), Some(y)) => prime_meridians_equivalent(x, y),
        (None, None) => true,
        // An unstated prime meridian means Greenwich.
        (Some(x), None) | (None, Some(x)) => close(x.longitude, 0.0, ANGLE_TOL),
    }
}

pub(crate) fn datum_refs_equivalent(a: &DatumOrEnsemble, b: &DatumOrEnsemble) -> bool {
    // An ensemble matches a datum if its representative member matches;
    // an ensemble name often doubles as the datum name (WGS 84).
    datums_equivalent(&a.forced_datum(), &b.forced_datum())
}

fn units_equivalent(a: &UnitDef, b: &UnitDef) -> bool {
    a.kind == b.kind && close(a.factor, b.factor, SCALE_TOL)
}

fn axes_equivalent(a: &AxisDef, b: &AxisDef) -> bool {
    a.direction == b.direction && units_equivalent(&a.unit, &b.unit)
}

fn coordinate_systems_equivalent(a: &CsDef, b: &CsDef, ignore_order: bool) -> bool {
    if a.kind != b.kind || a.axes.len() != b.axes.len() {
        return false;
    }
    if !ignore_order {
        return a.axes.iter().zip(&b.axes).all(|(x, y)| axes_equivalent(x, y));
    }
    // Order-insensitive: every axis of a must match a distinct axis of b.
    let mut used = vec![false; b.axes.len()];
    for ax in &a.axes {
        let Some(pos) = b
            .axes
            .iter()
            .enumerate()
            .position(|(i, bx)| !used[i] && axes_equivalent(ax, bx))
        else {
            return false;
        };
        used[pos] = true;
    }
    true
}

fn conversions_equivalent(a: &ConversionDef, b: &ConversionDef) -> bool {
    let methods_match = match (a.method.code, b.method.code) {
        (Some(x), Some(y)) => x == y,
        _ => names_match(&a.method.name, &b.method.name),
    };
    if !methods_match {
        return false;
    }
    // Every parameter of a must be matched in b with the same base value;
    // parameters missing on one side are treated as 0 (defaults).
    let all_names: Vec<&str> = a
        .params
        .iter()
        .chain(&b.params)
        .map(|p| p.name.as_str())
        .collect();
    for name in all_names {
        let va = a.param(&[name]).unwrap_or(0.0);
        let vb = b.param(&[name]).unwrap_or(0.0);
        if !close(va, vb, 1e-8) {
            return false;
        }
    }
    true
}

pub(crate) fn crs_equivalent(a: &CrsDef, b: &CrsDef, strictness: Strictness) -> bool {
    if a.kind != b.kind {
        return false;
    }
    let ignore_axis_order = strictness == Strictness::RelaxedAxisOrder && a.is_geographic();
    if !coordinate_systems_equivalent(&a.cs, &b.cs, ignore_axis_order) {
        return false;
    }
    match (&a.datum, &b.datum) {
        (Some(x), Some(y)) if !datum_refs_equivalent(x, y) => return false,
        (Some(_), None) | (None, Some(_)) => return false,
        _ => {}
    }
    match (&a.conversion, &b.conversion) {
        (Some(x), Some(y)) if !conversions_equivalent(x, y) => return false,
        (Some(_), None) | (None, Some(_)) => return false,
        _ => {}
    }
    match (&a.base, &b.base) {
        (Some(x), Some(y)) if !crs_equivalent(x, y, strictness) => return false,
        (Some(_), None) | (None, Some(_)) => return false,
        _ => {}
    }
    match (&a.hub, &b.hub) {
        (Some(x), Some(y)) if !crs_equivalent(x, y, strictness) => return false,
        (Some(_), None) | (None, Some(_)) => return false,
        _ => {}
    }
    a.components.len() == b.components.len()
        && a.components
            .iter()
            .zip(&b.components)
            .all(|(x, y)| crs_equivalent(x, y, strictness))
}

fn operations_equivalent(a: &OperationDef, b: &OperationDef) -> bool {
    if a.kind != b.kind || a.params.len() != b.params.len() {
        return false;
    }
    a.params.iter().zip(&b.params).all(|(x, y)| {
        normalize_name(&x.name) == normalize_name(&y.name)
            && close(x.base_value(), y.base_value(), 1e-8)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflexive() {
        let crs = Def::Crs(CrsDef::wgs84_2d());
        assert!(equivalent(&crs, &crs.clone(), Strictness::Strict));
    }

    #[test]
    fn test_datum_name_aliases() {
        let mut a = DatumDef::wgs84();
        a.info.name = "WGS_1984".into();
        let mut b = DatumDef::wgs84();
        b.info.name = "World Geodetic System 1984".into();
        assert!(datums_equivalent(&a, &b));
    }

    #[test]
    fn test_different_ellipsoid_not_equivalent() {
        let a = Def::Ellipsoid(EllipsoidDef::wgs84());
        let b = Def::Ellipsoid(EllipsoidDef::grs80());
        // GRS80 and WGS84 differ at the tenth of a millimetre on b
        assert!(!equivalent(&a, &b, Strictness::Strict));
    }

    #[test]
    fn test_axis_order_relaxed() {
        let lat_lon = CrsDef::wgs84_2d();
        let mut lon_lat = CrsDef::wgs84_2d();
        lon_lat.cs = CsDef::ellipsoidal_2d_lon_lat();

        let a = Def::Crs(lat_lon);
        let b = Def::Crs(lon_lat);
        assert!(!equivalent(&a, &b, Strictness::Strict));
        assert!(equivalent(&a, &b, Strictness::RelaxedAxisOrder));
    }

    #[test]
    fn test_metadata_ignored() {
        let a = CrsDef::wgs84_2d();
        let mut b = CrsDef::wgs84_2d();
        b.info.remarks = Some("copy".into());
        b.info.identifiers.clear();
        b.info.usage_area = None;
        assert!(crs_equivalent(&a, &b, Strictness::Strict));
    }

    #[test]
    fn test_kind_mismatch() {
        let a = Def::Crs(CrsDef::wgs84_2d());
        let b = Def::Ellipsoid(EllipsoidDef::wgs84());
        assert!(!equivalent(&a, &b, Strictness::Strict));
    }
}

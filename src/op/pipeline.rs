//! Concrete transform chains.
//!
//! A pipeline is a fixed sequence of steps between two axis frames:
//!
//! ```text
//! source axes -> normalize -> [steps ...] -> denormalize -> target axes
//! ```
//!
//! Between the frames everything runs in canonical units: geographic
//! longitude/latitude in radians, everything linear in metres. Axis unit
//! factors absorb degrees and feet during (de)normalization, so the steps
//! themselves never see a unit.

use tracing::trace;

use crate::coord::Coordinate;
use crate::error::Error;
use crate::model::{AxisDirection, CrsDef, CrsKind, CsDef, DEG_TO_RAD};
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::{methods, Projection};

const ARCSEC_TO_RAD: f64 = DEG_TO_RAD / 3600.0;

/// Mapping between a CRS's declared axes and the canonical (x, y, z) slots.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AxisFrame {
    /// For canonical slot i: (index into the coordinate, sign, unit factor).
    slots: [Option<(usize, f64, f64)>; 3],
}

impl AxisFrame {
    pub(crate) fn of(cs: &CsDef) -> AxisFrame {
        let mut slots = [None; 3];
        for (i, axis) in cs.axes.iter().enumerate().take(3) {
            let (slot, sign) = match axis.direction {
                AxisDirection::East | AxisDirection::GeocentricX => (0, 1.0),
                AxisDirection::West => (0, -1.0),
                AxisDirection::North | AxisDirection::GeocentricY => (1, 1.0),
                AxisDirection::South => (1, -1.0),
                AxisDirection::Up | AxisDirection::GeocentricZ => (2, 1.0),
                AxisDirection::Down => (2, -1.0),
                _ => (i.min(2), 1.0),
            };
            if slots[slot].is_none() {
                slots[slot] = Some((i, sign, axis.unit.factor));
            }
        }
        AxisFrame { slots }
    }

    /// CRS-order coordinate to canonical components. A missing or NaN
    /// vertical yields 0 so the geocentric math stays finite; NaN in a
    /// horizontal slot passes through and fails the domain checks instead.
    fn normalize(&self, c: Coordinate) -> (f64, f64, f64) {
        let read = |slot: Option<(usize, f64, f64)>| match slot {
            Some((i, sign, factor)) => sign * c.get(i).unwrap_or(f64::NAN) * factor,
            None => f64::NAN,
        };
        let z = read(self.slots[2]);
        (
            read(self.slots[0]),
            read(self.slots[1]),
            if z.is_nan() { 0.0 } else { z },
        )
    }

    /// Canonical components back to CRS order. Slots the target does not
    /// have come back as NaN ("axis not present"), never 0.
    fn denormalize(&self, x: f64, y: f64, z: f64, t: f64) -> Coordinate {
        let mut out = [f64::NAN; 3];
        for (slot, value) in [(self.slots[0], x), (self.slots[1], y), (self.slots[2], z)] {
            if let Some((i, sign, factor)) = slot {
                if i < 3 {
                    out[i] = sign * value / factor;
                }
            }
        }
        Coordinate {
            x: out[0],
            y: out[1],
            z: out[2],
            t,
        }
    }
}

/// One link of the chain. Every step also knows its own inverse, which is
/// what [`Pipeline::apply_inverse`] walks.
pub(crate) enum Step {
    /// (easting, northing) -> (lon, lat) on the projection's ellipsoid.
    InverseProject(Box<dyn Projection>),
    /// (lon, lat) -> (easting, northing).
    ForwardProject(Box<dyn Projection>),
    /// Geographic (lon, lat, h) -> geocentric (X, Y, Z).
    GeogToGeocent(Ellipsoid),
    /// Geocentric (X, Y, Z) -> geographic (lon, lat, h).
    GeocentToGeog(Ellipsoid),
    /// Position-vector Helmert towards WGS 84: 3 or 7 values
    /// (metres / arc-seconds / ppm). `inverse` runs it away from WGS 84.
    Helmert { values: Vec<f64>, inverse: bool },
    /// Longitude offset in radians (prime meridian to Greenwich).
    LonOffset(f64),
    /// A distortion-grid shift this build cannot evaluate; applying it
    /// reports the grid that would be required.
    GridShift(String),
}

impl Step {
    fn apply(&self, x: f64, y: f64, z: f64, forward: bool) -> Result<(f64, f64, f64), Error> {
        match self {
            Step::InverseProject(p) => {
                if forward {
                    let (lon, lat) = p.inverse(x, y)?;
                    Ok((lon, lat, z))
                } else {
                    let (e, n) = p.forward(x, y)?;
                    Ok((e, n, z))
                }
            }
            Step::ForwardProject(p) => {
                if forward {
                    let (e, n) = p.forward(x, y)?;
                    Ok((e, n, z))
                } else {
                    let (lon, lat) = p.inverse(x, y)?;
                    Ok((lon, lat, z))
                }
            }
            Step::GeogToGeocent(e) => {
                if forward {
                    Ok(geographic_to_geocentric(e, x, y, z))
                } else {
                    Ok(geocentric_to_geographic(e, x, y, z))
                }
            }
            Step::GeocentToGeog(e) => {
                if forward {
                    Ok(geocentric_to_geographic(e, x, y, z))
                } else {
                    Ok(geographic_to_geocentric(e, x, y, z))
                }
            }
            Step::Helmert { values, inverse } => {
                if forward != *inverse {
                    Ok(helmert_forward(values, x, y, z))
                } else {
                    Ok(helmert_inverse(values, x, y, z))
                }
            }
            Step::LonOffset(dl) => {
                let dl = if forward { *dl } else { -dl };
                Ok((x + dl, y, z))
            }
            Step::GridShift(grid) => Err(Error::NetworkUnavailable(format!(
                "transformation grid {grid} is not available"
            ))),
        }
    }
}

/// A resolved transform chain between two CRS.
pub(crate) struct Pipeline {
    pub(crate) name: String,
    /// Declared positional accuracy in metres; None = ballpark.
    pub(crate) accuracy: Option<f64>,
    pub(crate) method_name: String,
    steps: Vec<Step>,
    src_frame: AxisFrame,
    dst_frame: AxisFrame,
    /// Steps 0..geographic_prefix reduce the source to geographic
    /// coordinates; used for the location hint of candidate ranking.
    geographic_prefix: usize,
}

impl Pipeline {
    pub(crate) fn apply(&self, c: Coordinate) -> Result<Coordinate, Error> {
        let (mut x, mut y, mut z) = self.src_frame.normalize(c);
        for step in &self.steps {
            (x, y, z) = step.apply(x, y, z, true)?;
        }
        Ok(self.dst_frame.denormalize(x, y, z, c.t))
    }

    pub(crate) fn apply_inverse(&self, c: Coordinate) -> Result<Coordinate, Error> {
        let (mut x, mut y, mut z) = self.dst_frame.normalize(c);
        for step in self.steps.iter().rev() {
            (x, y, z) = step.apply(x, y, z, false)?;
        }
        Ok(self.src_frame.denormalize(x, y, z, c.t))
    }

    /// Approximate geographic location of a source coordinate, in degrees.
    /// Used as the area hint when ranking choose-candidates.
    pub(crate) fn source_lonlat_deg(&self, c: Coordinate) -> Option<(f64, f64)> {
        let (mut x, mut y, mut z) = self.src_frame.normalize(c);
        for step in self.steps.iter().take(self.geographic_prefix) {
            (x, y, z) = step.apply(x, y, z, true).ok()?;
        }
        let _ = z;
        Some((x / DEG_TO_RAD, y / DEG_TO_RAD))
    }
}

// ---------------------------------------------------------------------------
// Geodetic step math

fn geographic_to_geocentric(e: &Ellipsoid, lon: f64, lat: f64, h: f64) -> (f64, f64, f64) {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let n = e.a / (1.0 - e.e2 * sin_lat * sin_lat).sqrt();
    (
        (n + h) * cos_lat * lon.cos(),
        (n + h) * cos_lat * lon.sin(),
        (n * (1.0 - e.e2) + h) * sin_lat,
    )
}

fn geocentric_to_geographic(e: &Ellipsoid, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let lon = y.atan2(x);
    let p = x.hypot(y);
    if p < 1e-9 {
        // On the axis; latitude is a pole.
        let lat = if z >= 0.0 {
            std::f64::consts::FRAC_PI_2
        } else {
            -std::f64::consts::FRAC_PI_2
        };
        return (lon, lat, z.abs() - e.b);
    }
    let mut lat = (z / (p * (1.0 - e.e2))).atan();
    for _ in 0..6 {
        let sin_lat = lat.sin();
        let n = e.a / (1.0 - e.e2 * sin_lat * sin_lat).sqrt();
        lat = ((z + e.e2 * n * sin_lat) / p).atan();
    }
    let sin_lat = lat.sin();
    let n = e.a / (1.0 - e.e2 * sin_lat * sin_lat).sqrt();
    let h = p / lat.cos() - n;
    (lon, lat, h)
}

fn helmert_terms(values: &[f64]) -> (f64, f64, f64, f64, f64, f64, f64) {
    let v = |i: usize| values.get(i).copied().unwrap_or(0.0);
    (
        v(0),
        v(1),
        v(2),
        v(3) * ARCSEC_TO_RAD,
        v(4) * ARCSEC_TO_RAD,
        v(5) * ARCSEC_TO_RAD,
        1.0 + v(6) * 1e-6,
    )
}

fn helmert_forward(values: &[f64], x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let (dx, dy, dz, rx, ry, rz, s) = helmert_terms(values);
    (
        dx + s * (x - rz * y + ry * z),
        dy + s * (rz * x + y - rx * z),
        dz + s * (-ry * x + rx * y + z),
    )
}

fn helmert_inverse(values: &[f64], x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let (dx, dy, dz, rx, ry, rz, s) = helmert_terms(values);
    let (xs, ys, zs) = ((x - dx) / s, (y - dy) / s, (z - dz) / s);
    // Exact inverse of the small-angle rotation (Cramer on the 3x3); the
    // transposed matrix leaves an O(r^2) residual that is visible at the
    // millimetre level for arc-second rotations.
    let det = 1.0 + rx * rx + ry * ry + rz * rz;
    (
        ((1.0 + rx * rx) * xs + (rz + rx * ry) * ys + (rx * rz - ry) * zs) / det,
        ((rx * ry - rz) * xs + (1.0 + ry * ry) * ys + (rx + ry * rz) * zs) / det,
        ((ry + rx * rz) * xs + (ry * rz - rx) * ys + (1.0 + rz * rz) * zs) / det,
    )
}

// ---------------------------------------------------------------------------
// Construction

/// How one side of a pipeline reaches WGS 84.
#[derive(Clone, Debug)]
pub(crate) enum ShiftStep {
    /// Reinterpretation only; the ballpark path.
    Null,
    /// Position-vector Helmert values towards WGS 84.
    Helmert(Vec<f64>),
    /// A named distortion grid.
    Grid(String),
}

/// Build the chain for one candidate.
///
/// `shift` is `None` when source and target share a reference frame;
/// otherwise it carries the per-side paths towards WGS 84.
pub(crate) fn build(
    source: &CrsDef,
    target: &CrsDef,
    shift: Option<(&ShiftStep, &ShiftStep)>,
    name: &str,
    accuracy: Option<f64>,
) -> Result<Pipeline, Error> {
    let mut steps = Vec::new();

    // Source down to geographic.
    reduce_to_geographic(source, &mut steps, true)?;
    let geographic_prefix = steps.len();

    if let Some((src_shift, dst_shift)) = shift {
        let src_ell = ellipsoid_of(source)?;
        let dst_ell = ellipsoid_of(target)?;
        let need_geocent = matches!(src_shift, ShiftStep::Helmert(_))
            || matches!(dst_shift, ShiftStep::Helmert(_));
        if let ShiftStep::Grid(g) = src_shift {
            steps.push(Step::GridShift(g.clone()));
        }
        if need_geocent {
            steps.push(Step::GeogToGeocent(src_ell));
        }
        if let ShiftStep::Helmert(v) = src_shift {
            steps.push(Step::Helmert {
                values: v.clone(),
                inverse: false,
            });
        }
        if let ShiftStep::Helmert(v) = dst_shift {
            steps.push(Step::Helmert {
                values: v.clone(),
                inverse: true,
            });
        }
        if need_geocent {
            steps.push(Step::GeocentToGeog(dst_ell));
        }
        if let ShiftStep::Grid(g) = dst_shift {
            steps.push(Step::GridShift(g.clone()));
        }
    }

    // Geographic up to the target.
    reduce_to_geographic(target, &mut steps, false)?;

    let method_name = method_name_of(source, target, shift.is_some());
    trace!(name, steps = steps.len(), "built pipeline");
    Ok(Pipeline {
        name: name.to_string(),
        accuracy,
        method_name,
        steps,
        src_frame: frame_of(source),
        dst_frame: frame_of(target),
        geographic_prefix,
    })
}

fn frame_of(crs: &CrsDef) -> AxisFrame {
    AxisFrame::of(&crs.cs)
}

fn ellipsoid_of(crs: &CrsDef) -> Result<Ellipsoid, Error> {
    crs.ellipsoid()
        .map(|e| e.shape())
        .ok_or_else(|| Error::NoOperationFound(format!("CRS {:?} has no ellipsoid", crs.info.name)))
}

/// Append the steps taking `crs` down to (or, with `down = false`, up from)
/// geographic longitude/latitude relative to Greenwich. Steps come out in
/// execution order either way.
fn reduce_to_geographic(crs: &CrsDef, steps: &mut Vec<Step>, down: bool) -> Result<(), Error> {
    // Bound and compound CRS delegate entirely; the recursion handles the
    // prime meridian once, on the innermost geodetic CRS.
    match crs.kind {
        CrsKind::Bound => {
            let base = crs.base.as_deref().ok_or_else(|| {
                Error::NoOperationFound(format!("bound CRS {:?} has no source", crs.info.name))
            })?;
            return reduce_to_geographic(base, steps, down);
        }
        CrsKind::Compound => {
            let horizontal = crs.geodetic_or_projected_component().ok_or_else(|| {
                Error::NoOperationFound(format!(
                    "compound CRS {:?} has no horizontal component",
                    crs.info.name
                ))
            })?;
            return reduce_to_geographic(horizontal, steps, down);
        }
        _ => {}
    }

    // Going up, a non-Greenwich prime meridian rotates longitude before the
    // CRS-specific step; going down, after it.
    let pm_offset = crs
        .prime_meridian()
        .map(|pm| pm.longitude * DEG_TO_RAD)
        .filter(|l| *l != 0.0);
    if !down {
        if let Some(offset) = pm_offset {
            steps.push(Step::LonOffset(-offset));
        }
    }

    match crs.kind {
        CrsKind::Geographic2D | CrsKind::Geographic3D => {}
        CrsKind::Geocentric => {
            let ell = ellipsoid_of(crs)?;
            if down {
                steps.push(Step::GeocentToGeog(ell));
            } else {
                steps.push(Step::GeogToGeocent(ell));
            }
        }
        CrsKind::Projected => {
            let conv = crs.conversion.as_ref().ok_or_else(|| {
                Error::NoOperationFound(format!(
                    "projected CRS {:?} has no conversion",
                    crs.info.name
                ))
            })?;
            let projection = methods::projection_for(conv, ellipsoid_of(crs)?)?;
            if down {
                steps.push(Step::InverseProject(projection));
            } else {
                steps.push(Step::ForwardProject(projection));
            }
        }
        kind => {
            return Err(Error::NoOperationFound(format!(
                "cannot transform through a {kind:?} CRS"
            )))
        }
    }

    if down {
        if let Some(offset) = pm_offset {
            steps.push(Step::LonOffset(offset));
        }
    }
    Ok(())
}

fn method_name_of(source: &CrsDef, target: &CrsDef, shifted: bool) -> String {
    if shifted {
        return "Helmert transformation".to_string();
    }
    match (source.kind, target.kind) {
        (_, CrsKind::Projected) => target
            .conversion
            .as_ref()
            .map(|c| c.method.name.clone())
            .unwrap_or_else(|| "Conversion".into()),
        (CrsKind::Projected, _) => source
            .conversion
            .as_ref()
            .map(|c| format!("Inverse of {}", c.method.name))
            .unwrap_or_else(|| "Conversion".into()),
        (CrsKind::Geocentric, _) | (_, CrsKind::Geocentric) => {
            "Geographic/geocentric conversions".into()
        }
        _ => "Axis order change".into(),
    }
}

impl CrsDef {
    /// First component of a compound CRS that can carry a horizontal
    /// position.
    pub(crate) fn geodetic_or_projected_component(&self) -> Option<&CrsDef> {
        self.components.iter().find(|c| {
            matches!(
                c.kind,
                CrsKind::Geographic2D
                    | CrsKind::Geographic3D
                    | CrsKind::Geocentric
                    | CrsKind::Projected
                    | CrsKind::Bound
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CsDef, DatumDef, DatumOrEnsemble, ObjectInfo};
    use approx::assert_relative_eq;

    fn wgs84_lonlat() -> CrsDef {
        let mut def = CrsDef::wgs84_2d();
        def.cs = CsDef::ellipsoidal_2d_lon_lat();
        def
    }

    fn utm33() -> CrsDef {
        crate::projstring::parse("+proj=utm +zone=33 +ellps=WGS84").unwrap()
    }

    #[test]
    fn test_geographic_to_projected() {
        let pipe = build(&wgs84_lonlat(), &utm33(), None, "UTM zone 33N", Some(0.0)).unwrap();
        let out = pipe.apply(Coordinate::xy(12.0, 55.0)).unwrap();
        assert_relative_eq!(out.x, 308_124.37, epsilon = 0.05);
        assert_relative_eq!(out.y, 6_098_907.83, epsilon = 0.05);

        let back = pipe.apply_inverse(out).unwrap();
        assert_relative_eq!(back.x, 12.0, epsilon = 1e-9);
        assert_relative_eq!(back.y, 55.0, epsilon = 1e-9);
    }

    #[test]
    fn test_lat_lon_axis_order_respected() {
        // EPSG:4326 axis order is latitude first.
        let pipe = build(&CrsDef::wgs84_2d(), &utm33(), None, "UTM zone 33N", Some(0.0)).unwrap();
        let out = pipe.apply(Coordinate::xy(55.0, 12.0)).unwrap();
        assert_relative_eq!(out.x, 308_124.37, epsilon = 0.05);
    }

    #[test]
    fn test_missing_target_z_is_nan() {
        let pipe = build(&wgs84_lonlat(), &utm33(), None, "UTM zone 33N", Some(0.0)).unwrap();
        let out = pipe.apply(Coordinate::xyz(12.0, 55.0, 100.0)).unwrap();
        assert!(!out.has_z());
        assert!(out.x.is_finite());
    }

    #[test]
    fn test_geographic_geocentric_round_trip() {
        let e = crate::proj::ellipsoid::WGS84;
        let lon = 0.21_f64;
        let lat = 0.96_f64;
        let h = 123.0;
        let (x, y, z) = geographic_to_geocentric(&e, lon, lat, h);
        let (lon2, lat2, h2) = geocentric_to_geographic(&e, x, y, z);
        assert_relative_eq!(lon2, lon, epsilon = 1e-12);
        assert_relative_eq!(lat2, lat, epsilon = 1e-12);
        assert_relative_eq!(h2, h, epsilon = 1e-6);
    }

    #[test]
    fn test_helmert_seven_parameter_round_trip() {
        let v = vec![598.1, 73.7, 418.2, 0.202, 0.045, -2.455, 6.7];
        let (x, y, z) = (4_000_000.0, 1_000_000.0, 4_800_000.0);
        let (xs, ys, zs) = helmert_forward(&v, x, y, z);
        let (x2, y2, z2) = helmert_inverse(&v, xs, ys, zs);
        // The inverse is exact, not a small-angle approximation.
        assert_relative_eq!(x2, x, epsilon = 1e-7);
        assert_relative_eq!(y2, y, epsilon = 1e-7);
        assert_relative_eq!(z2, z, epsilon = 1e-7);
    }

    #[test]
    fn test_helmert_three_parameter() {
        let v = vec![-87.0, -98.0, -121.0];
        let (x, y, z) = helmert_forward(&v, 100.0, 200.0, 300.0);
        assert_relative_eq!(x, 13.0);
        assert_relative_eq!(y, 102.0);
        assert_relative_eq!(z, 179.0);
    }

    #[test]
    fn test_datum_shift_moves_coordinates() {
        let ed50 =
            crate::projstring::parse("+proj=longlat +ellps=intl +towgs84=-87,-98,-121").unwrap();
        let shift = (
            ShiftStep::Helmert(vec![-87.0, -98.0, -121.0]),
            ShiftStep::Null,
        );
        let pipe = build(
            &ed50,
            &wgs84_lonlat(),
            Some((&shift.0, &shift.1)),
            "ED50 to WGS 84",
            Some(10.0),
        )
        .unwrap();
        let out = pipe.apply(Coordinate::xy(12.0, 55.0)).unwrap();
        // ED50 positions sit roughly 100 m away from WGS 84 in Europe.
        assert!((out.x - 12.0).abs() > 1e-4 || (out.y - 55.0).abs() > 1e-4);
        assert!((out.x - 12.0).abs() < 0.01 && (out.y - 55.0).abs() < 0.01);

        let back = pipe.apply_inverse(out).unwrap();
        assert_relative_eq!(back.x, 12.0, epsilon = 1e-8);
        assert_relative_eq!(back.y, 55.0, epsilon = 1e-8);
    }

    #[test]
    fn test_grid_step_reports_network_unavailable() {
        let shift = (
            ShiftStep::Grid("us_noaa_nadcon5_nad27_nad83_conus.tif".into()),
            ShiftStep::Null,
        );
        let nad27 = CrsDef::new(
            ObjectInfo::named("NAD27"),
            crate::model::CrsKind::Geographic2D,
            Some(DatumOrEnsemble::Datum(
                DatumDef::from_short_name("nad27").unwrap(),
            )),
            CsDef::ellipsoidal_2d_lon_lat(),
        );
        let pipe = build(
            &nad27,
            &wgs84_lonlat(),
            Some((&shift.0, &shift.1)),
            "NAD27 to WGS 84 (NADCON5)",
            Some(0.15),
        )
        .unwrap();
        let err = pipe.apply(Coordinate::xy(-100.0, 40.0)).unwrap_err();
        assert!(matches!(err, Error::NetworkUnavailable(_)));
    }

    #[test]
    fn test_source_location_hint() {
        let pipe = build(&utm33(), &wgs84_lonlat(), None, "Inverse UTM", Some(0.0)).unwrap();
        let (lon, lat) = pipe
            .source_lonlat_deg(Coordinate::xy(308_124.37, 6_098_907.83))
            .unwrap();
        assert_relative_eq!(lon, 12.0, epsilon = 1e-6);
        assert_relative_eq!(lat, 55.0, epsilon = 1e-6);
    }

    #[test]
    fn test_out_of_domain_propagates() {
        let pipe = build(&wgs84_lonlat(), &utm33(), None, "UTM zone 33N", Some(0.0)).unwrap();
        assert!(matches!(
            pipe.apply(Coordinate::xy(f64::NAN, 55.0)).unwrap_err(),
            Error::OutOfDomain(_)
        ));
    }
}

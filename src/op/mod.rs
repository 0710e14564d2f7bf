//! Coordinate operations: transforming coordinates between two CRS.
//!
//! An operation is either *resolved* (one pipeline, picked at creation) or a
//! *choice* among ranked candidates when several datum shifts could apply.
//! A choice re-ranks per coordinate, preferring candidates whose usage area
//! covers the input, and falls over to the next candidate when one rejects a
//! coordinate as out of its domain.

mod pipeline;
mod select;

use tracing::{debug, trace};

use crate::context::Context;
use crate::coord::Coordinate;
use crate::crs::Crs;
use crate::error::Error;
use crate::ident::{AreaOfInterest, UsageArea};
use crate::model::equivalence::canonical_name;
use crate::model::{CrsDef, CrsKind, Def, MethodDef, ObjectInfo, OperationDef, OperationKind};
use crate::object::Object;

use pipeline::{Pipeline, ShiftStep};
use select::CandidateInfo;

/// Options governing how candidate operations are gathered and filtered.
#[derive(Clone, Debug)]
pub struct OperationOptions {
    /// Restrict candidates to those usable in this area.
    pub area_of_interest: Option<AreaOfInterest>,
    /// Permit a last-resort candidate that reinterprets coordinates without
    /// any datum shift. On by default.
    pub allow_ballpark: bool,
    /// Drop candidates with unknown accuracy or worse than this, in metres.
    pub minimum_accuracy: Option<f64>,
}

impl Default for OperationOptions {
    fn default() -> Self {
        OperationOptions {
            area_of_interest: None,
            allow_ballpark: true,
            minimum_accuracy: None,
        }
    }
}

/// One way of reaching WGS 84 from one side of the transform.
struct Side {
    /// None for a null shift; omitted from composed names.
    name: Option<String>,
    accuracy: Option<f64>,
    area: Option<UsageArea>,
    step: ShiftStep,
}

impl Side {
    fn null(accuracy: Option<f64>) -> Side {
        Side {
            name: None,
            accuracy,
            area: None,
            step: ShiftStep::Null,
        }
    }

    fn from_values(name: String, accuracy: Option<f64>, area: Option<UsageArea>, values: Vec<f64>) -> Side {
        if values.iter().all(|v| *v == 0.0) {
            let mut s = Side::null(accuracy);
            s.area = area;
            s
        } else {
            Side {
                name: Some(name),
                accuracy,
                area,
                step: ShiftStep::Helmert(values),
            }
        }
    }
}

struct Candidate {
    info: CandidateInfo,
    pipeline: Pipeline,
}

enum OpInner {
    Resolved(Pipeline),
    Choose {
        candidates: Vec<Candidate>,
        area_of_interest: Option<AreaOfInterest>,
    },
}

/// A coordinate operation between a fixed source and target CRS.
///
/// Apply it through [`CoordinateOperation::apply`] or
/// [`Coordinate::transform`]; both directions are available, the inverse
/// walks the same steps backwards.
pub struct CoordinateOperation {
    object: Object,
    source: Crs,
    target: Crs,
    inner: OpInner,
}

impl CoordinateOperation {
    /// Build the operation from `source` to `target` in the source's
    /// context.
    pub fn new(source: &Crs, target: &Crs, options: OperationOptions) -> Result<Self, Error> {
        let ctx = source.as_object().context()?;
        Self::build(&ctx, source, target, options)
    }

    fn build(
        ctx: &Context,
        source: &Crs,
        target: &Crs,
        options: OperationOptions,
    ) -> Result<Self, Error> {
        let src_def = source.def()?;
        let tgt_def = target.def()?;

        if same_reference_frame(&src_def, &tgt_def) {
            let name = conversion_name(&src_def, &tgt_def);
            let pipe = pipeline::build(&src_def, &tgt_def, None, &name, Some(0.0))?;
            let kind = if src_def.kind == CrsKind::Projected || tgt_def.kind == CrsKind::Projected
            {
                OperationKind::Conversion
            } else {
                OperationKind::Other
            };
            let object = ctx.adopt(Def::Operation(operation_def(
                &name, kind, &src_def, &tgt_def, &pipe,
            )));
            debug!(name = %pipe.name, "resolved single-frame operation");
            return Ok(CoordinateOperation {
                object,
                source: source.clone(),
                target: target.clone(),
                inner: OpInner::Resolved(pipe),
            });
        }

        let src_sides = sides_to_wgs84(&src_def, ctx);
        let tgt_sides = sides_to_wgs84(&tgt_def, ctx);

        let mut candidates = Vec::new();
        for s in &src_sides {
            for t in &tgt_sides {
                let name = shift_name(s, t, &src_def, &tgt_def);
                let accuracy = match (s.accuracy, t.accuracy) {
                    (Some(a), Some(b)) => Some(a + b),
                    _ => None,
                };
                let area = tighter_area(s.area.as_ref(), t.area.as_ref());
                let pipe = pipeline::build(
                    &src_def,
                    &tgt_def,
                    Some((&s.step, &t.step)),
                    &name,
                    accuracy,
                )?;
                candidates.push(Candidate {
                    info: CandidateInfo { area, accuracy },
                    pipeline: pipe,
                });
            }
        }

        if options.allow_ballpark {
            let name = format!(
                "Ballpark geographic offset from {} to {}",
                src_def.info.name, tgt_def.info.name
            );
            let pipe = pipeline::build(
                &src_def,
                &tgt_def,
                Some((&ShiftStep::Null, &ShiftStep::Null)),
                &name,
                None,
            )?;
            candidates.push(Candidate {
                info: CandidateInfo::default(),
                pipeline: pipe,
            });
        }

        if let Some(min) = options.minimum_accuracy {
            candidates.retain(|c| c.info.accuracy.is_some_and(|a| a <= min));
        }
        if let Some(aoi) = &options.area_of_interest {
            let keep: Vec<Candidate> = {
                let infos: Vec<CandidateInfo> = candidates.iter().map(|c| c.info.clone()).collect();
                let order = select::rank(&infos, Some(aoi), None);
                let mut by_index: Vec<Option<Candidate>> =
                    candidates.into_iter().map(Some).collect();
                order
                    .into_iter()
                    .filter_map(|i| by_index[i].take())
                    .collect()
            };
            candidates = keep;
        }
        if candidates.is_empty() {
            return Err(Error::NoOperationFound(format!(
                "from {} to {}",
                src_def.info.name, tgt_def.info.name
            )));
        }

        debug!(
            count = candidates.len(),
            source = %src_def.info.name,
            target = %tgt_def.info.name,
            "gathered transformation candidates"
        );

        if candidates.len() == 1 {
            let only = candidates.remove(0);
            let object = ctx.adopt(Def::Operation(operation_def(
                &only.pipeline.name,
                OperationKind::Transformation,
                &src_def,
                &tgt_def,
                &only.pipeline,
            )));
            return Ok(CoordinateOperation {
                object,
                source: source.clone(),
                target: target.clone(),
                inner: OpInner::Resolved(only.pipeline),
            });
        }

        let mut op = OperationDef::transformation(&format!(
            "Transformation from {} to {}",
            src_def.info.name, tgt_def.info.name
        ));
        op.source = Some(Box::new(src_def));
        op.target = Some(Box::new(tgt_def));
        let object = ctx.adopt_record(Def::Operation(op), true);
        Ok(CoordinateOperation {
            object,
            source: source.clone(),
            target: target.clone(),
            inner: OpInner::Choose {
                candidates,
                area_of_interest: options.area_of_interest,
            },
        })
    }

    /// Transform one coordinate from the source CRS to the target CRS.
    pub fn apply(&self, c: Coordinate) -> Result<Coordinate, Error> {
        self.object.record()?;
        match &self.inner {
            OpInner::Resolved(p) => p.apply(c),
            OpInner::Choose {
                candidates,
                area_of_interest,
            } => {
                let point = candidates
                    .first()
                    .and_then(|cand| cand.pipeline.source_lonlat_deg(c));
                let infos: Vec<CandidateInfo> =
                    candidates.iter().map(|cand| cand.info.clone()).collect();
                let mut last_err = None;
                for i in select::rank(&infos, area_of_interest.as_ref(), point) {
                    match candidates[i].pipeline.apply(c) {
                        Ok(out) => {
                            trace!(candidate = %candidates[i].pipeline.name, "candidate applied");
                            return Ok(out);
                        }
                        Err(e) if e.allows_failover() => last_err = Some(e),
                        Err(e) => return Err(e),
                    }
                }
                Err(last_err
                    .unwrap_or_else(|| Error::NoOperationFound("no usable candidate".into())))
            }
        }
    }

    /// Transform one coordinate from the target CRS back to the source CRS.
    pub fn apply_inverse(&self, c: Coordinate) -> Result<Coordinate, Error> {
        self.object.record()?;
        match &self.inner {
            OpInner::Resolved(p) => p.apply_inverse(c),
            OpInner::Choose {
                candidates,
                area_of_interest,
            } => {
                let infos: Vec<CandidateInfo> =
                    candidates.iter().map(|cand| cand.info.clone()).collect();
                let mut last_err = None;
                for i in select::rank(&infos, area_of_interest.as_ref(), None) {
                    match candidates[i].pipeline.apply_inverse(c) {
                        Ok(out) => return Ok(out),
                        Err(e) if e.allows_failover() => last_err = Some(e),
                        Err(e) => return Err(e),
                    }
                }
                Err(last_err
                    .unwrap_or_else(|| Error::NoOperationFound("no usable candidate".into())))
            }
        }
    }

    /// Transform a batch in place; stops at the first failure.
    pub fn apply_many(&self, coords: &mut [Coordinate]) -> Result<(), Error> {
        for c in coords.iter_mut() {
            *c = self.apply(*c)?;
        }
        Ok(())
    }

    /// Declared positional accuracy in metres. `None` when unknown, for
    /// ballpark operations, and for unresolved choices.
    pub fn accuracy(&self) -> Result<Option<f64>, Error> {
        self.object.record()?;
        Ok(match &self.inner {
            OpInner::Resolved(p) => p.accuracy,
            OpInner::Choose { .. } => None,
        })
    }

    pub fn method_name(&self) -> Result<String, Error> {
        self.object.record()?;
        Ok(match &self.inner {
            OpInner::Resolved(p) => p.method_name.clone(),
            OpInner::Choose { .. } => "Choose by usage area".to_string(),
        })
    }

    /// Number of concrete pipelines behind this operation; 1 unless this is
    /// a choice.
    pub fn candidate_count(&self) -> usize {
        match &self.inner {
            OpInner::Resolved(_) => 1,
            OpInner::Choose { candidates, .. } => candidates.len(),
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self.inner, OpInner::Choose { .. })
    }

    pub fn source_crs(&self) -> Crs {
        self.source.clone()
    }

    pub fn target_crs(&self) -> Crs {
        self.target.clone()
    }

    pub fn as_object(&self) -> &Object {
        &self.object
    }
}

impl std::ops::Deref for CoordinateOperation {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.object
    }
}

impl std::fmt::Debug for CoordinateOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateOperation")
            .field("name", &self.object.name().unwrap_or_else(|_| "?".into()))
            .field("candidates", &self.candidate_count())
            .finish()
    }
}

impl Context {
    /// Find or build a coordinate operation from `source` to `target`.
    pub fn create_coordinate_operation(
        &self,
        source: &Crs,
        target: &Crs,
        options: OperationOptions,
    ) -> Result<CoordinateOperation, Error> {
        CoordinateOperation::build(self, source, target, options)
    }
}

// ---------------------------------------------------------------------------
// Candidate assembly

fn same_reference_frame(a: &CrsDef, b: &CrsDef) -> bool {
    // An ensemble and its plain datum count as the same frame.
    fn frame_name(name: &str) -> String {
        let base = name
            .trim()
            .trim_end_matches("ensemble")
            .trim_end_matches("Ensemble")
            .trim();
        canonical_name(base)
    }
    match (a.horizontal_datum(), b.horizontal_datum()) {
        (Some(da), Some(db)) => frame_name(&da.info().name) == frame_name(&db.info().name),
        (None, None) => true,
        _ => false,
    }
}

/// Declared Helmert values of a CRS, when it carries any: the transformation
/// of a bound CRS, or `+towgs84` recorded on the datum. A declaration beats
/// the registry.
fn declared_shift(def: &CrsDef) -> Option<(String, Option<f64>, Vec<f64>)> {
    if def.kind == CrsKind::Bound {
        let op = def.bound_transform.as_deref()?;
        let values = op.helmert_values()?;
        return Some((op.info.name.clone(), op.accuracy.or(Some(1.0)), values));
    }
    if let Some(datum) = def.horizontal_datum() {
        if let crate::model::DatumOrEnsemble::Datum(d) = datum {
            if let Some(values) = &d.to_wgs84 {
                let accuracy = if values.iter().all(|v| *v == 0.0) {
                    Some(0.0)
                } else {
                    Some(1.0)
                };
                return Some((
                    format!("{} to WGS 84 (declared)", d.info.name),
                    accuracy,
                    values.clone(),
                ));
            }
        }
    }
    None
}

fn sides_to_wgs84(def: &CrsDef, ctx: &Context) -> Vec<Side> {
    if let Some((name, accuracy, values)) = declared_shift(def) {
        return vec![Side::from_values(name, accuracy, None, values)];
    }
    let Some(datum) = def.horizontal_datum() else {
        return Vec::new();
    };
    let datum = datum.forced_datum();
    crate::authority::shift_candidates_to_wgs84(&datum)
        .into_iter()
        .filter_map(|c| match c.params {
            crate::authority::ShiftParams::Helmert(v) => {
                Some(Side::from_values(c.name, c.accuracy, c.area, v))
            }
            crate::authority::ShiftParams::Grid(g) => {
                if ctx.network_enabled() {
                    Some(Side {
                        name: Some(c.name),
                        accuracy: c.accuracy,
                        area: c.area,
                        step: ShiftStep::Grid(g),
                    })
                } else {
                    None
                }
            }
        })
        .collect()
}

fn shift_name(s: &Side, t: &Side, src: &CrsDef, tgt: &CrsDef) -> String {
    let mut parts = Vec::new();
    if let Some(n) = &s.name {
        parts.push(n.clone());
    }
    if let Some(n) = &t.name {
        parts.push(format!("Inverse of {n}"));
    }
    if parts.is_empty() {
        format!("Transformation from {} to {}", src.info.name, tgt.info.name)
    } else {
        parts.join(" + ")
    }
}

fn tighter_area(a: Option<&UsageArea>, b: Option<&UsageArea>) -> Option<UsageArea> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if x.extent() <= y.extent() { x.clone() } else { y.clone() }),
        (Some(x), None) => Some(x.clone()),
        (None, Some(y)) => Some(y.clone()),
        (None, None) => None,
    }
}

fn conversion_name(src: &CrsDef, tgt: &CrsDef) -> String {
    let src_conv = (src.kind == CrsKind::Projected)
        .then(|| src.conversion.as_ref())
        .flatten();
    let tgt_conv = (tgt.kind == CrsKind::Projected)
        .then(|| tgt.conversion.as_ref())
        .flatten();
    match (src_conv, tgt_conv) {
        (Some(a), Some(b)) => format!("Inverse of {} + {}", a.info.name, b.info.name),
        (None, Some(b)) => b.info.name.clone(),
        (Some(a), None) => format!("Inverse of {}", a.info.name),
        (None, None) => format!(
            "Transformation from {} to {}",
            src.info.name, tgt.info.name
        ),
    }
}

fn operation_def(
    name: &str,
    kind: OperationKind,
    src: &CrsDef,
    tgt: &CrsDef,
    pipe: &Pipeline,
) -> OperationDef {
    OperationDef {
        info: ObjectInfo::named(name),
        kind,
        source: Some(Box::new(src.clone())),
        target: Some(Box::new(tgt.clone())),
        method: Some(MethodDef::new(&pipe.method_name, None)),
        params: Vec::new(),
        accuracy: pipe.accuracy,
        steps: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;
    use approx::assert_relative_eq;

    fn crs(ctx: &Context, definition: &str) -> Crs {
        Crs::create(definition, Some(ctx)).unwrap()
    }

    #[test]
    fn test_geographic_to_utm() {
        let ctx = Context::new();
        let source = crs(&ctx, "EPSG:4326");
        let target = crs(&ctx, "EPSG:32633");
        let op = ctx
            .create_coordinate_operation(&source, &target, OperationOptions::default())
            .unwrap();
        assert!(!op.is_choice());
        assert_eq!(op.accuracy().unwrap(), Some(0.0));

        // EPSG:4326 axis order is latitude first.
        let out = op.apply(Coordinate::xy(55.0, 12.0)).unwrap();
        assert_relative_eq!(out.x, 308_124.37, epsilon = 0.05);
        assert_relative_eq!(out.y, 6_098_907.83, epsilon = 0.05);

        let back = op.apply_inverse(out).unwrap();
        assert_relative_eq!(back.x, 55.0, epsilon = 1e-9);
        assert_relative_eq!(back.y, 12.0, epsilon = 1e-9);
    }

    #[test]
    fn test_matches_proj4rs() {
        let ctx = Context::new();
        let source = crs(&ctx, "+proj=longlat +datum=WGS84");
        let target = crs(&ctx, "+proj=utm +zone=32 +ellps=WGS84");
        let op = CoordinateOperation::new(&source, &target, OperationOptions::default()).unwrap();

        let ours = op.apply(Coordinate::xy(9.05, 48.52)).unwrap();

        let src = proj4rs::Proj::from_user_string("+proj=longlat +datum=WGS84").unwrap();
        let dst = proj4rs::Proj::from_user_string("+proj=utm +zone=32 +ellps=WGS84").unwrap();
        let mut point = (9.05_f64.to_radians(), 48.52_f64.to_radians());
        proj4rs::transform::transform(&src, &dst, &mut point).unwrap();

        assert_relative_eq!(ours.x, point.0, epsilon = 1e-3);
        assert_relative_eq!(ours.y, point.1, epsilon = 1e-3);
    }

    #[test]
    fn test_declared_towgs84_is_used() {
        let ctx = Context::new();
        let source = crs(&ctx, "+proj=longlat +ellps=intl +towgs84=-87,-98,-121");
        let target = crs(&ctx, "+proj=longlat +datum=WGS84");
        let op = CoordinateOperation::new(&source, &target, OperationOptions::default()).unwrap();
        // Declared parameters beat the registry: one shift plus the ballpark.
        assert_eq!(op.candidate_count(), 2);

        let out = op.apply(Coordinate::xy(12.0, 55.0)).unwrap();
        assert!((out.x - 12.0).abs() > 1e-4 || (out.y - 55.0).abs() > 1e-4);
        assert!((out.x - 12.0).abs() < 0.01 && (out.y - 55.0).abs() < 0.01);
    }

    #[test]
    fn test_datum_shift_matches_proj4rs() {
        let ctx = Context::new();
        let source = crs(&ctx, "+proj=longlat +ellps=intl +towgs84=-84,-107,-120");
        let target = crs(&ctx, "+proj=longlat +datum=WGS84");
        let op = CoordinateOperation::new(&source, &target, OperationOptions::default()).unwrap();
        let ours = op.apply(Coordinate::xy(-4.0, 40.0)).unwrap();

        let src =
            proj4rs::Proj::from_user_string("+proj=longlat +ellps=intl +towgs84=-84,-107,-120")
                .unwrap();
        let dst = proj4rs::Proj::from_user_string("+proj=longlat +datum=WGS84").unwrap();
        let mut point = ((-4.0_f64).to_radians(), 40.0_f64.to_radians());
        proj4rs::transform::transform(&src, &dst, &mut point).unwrap();

        assert_relative_eq!(ours.x.to_radians(), point.0, epsilon = 1e-10);
        assert_relative_eq!(ours.y.to_radians(), point.1, epsilon = 1e-10);
    }

    #[test]
    fn test_registry_candidates_make_a_choice() {
        let ctx = Context::new();
        let source = crs(&ctx, "EPSG:4230"); // ED50
        let target = crs(&ctx, "EPSG:4326");
        let op = CoordinateOperation::new(&source, &target, OperationOptions::default()).unwrap();
        assert!(op.is_choice());
        // Three registry shifts for ED50 plus the ballpark.
        assert_eq!(op.candidate_count(), 4);
        assert_eq!(op.kind().unwrap(), ObjectKind::ChooseTransform);
        assert_eq!(op.accuracy().unwrap(), None);

        // A point in Spain takes the Iberia-specific shift.
        let out = op.apply(Coordinate::xy(40.0, -4.0)).unwrap();
        let src =
            proj4rs::Proj::from_user_string("+proj=longlat +ellps=intl +towgs84=-84,-107,-120")
                .unwrap();
        let dst = proj4rs::Proj::from_user_string("+proj=longlat +datum=WGS84").unwrap();
        let mut point = ((-4.0_f64).to_radians(), 40.0_f64.to_radians());
        proj4rs::transform::transform(&src, &dst, &mut point).unwrap();
        assert_relative_eq!(out.y.to_radians(), point.0, epsilon = 1e-10);
        assert_relative_eq!(out.x.to_radians(), point.1, epsilon = 1e-10);
    }

    #[test]
    fn test_grid_candidates_follow_network_setting() {
        let ctx = Context::new();
        let source = crs(&ctx, "EPSG:4267"); // NAD27
        let target = crs(&ctx, "EPSG:4326");
        let offline =
            CoordinateOperation::new(&source, &target, OperationOptions::default()).unwrap();

        ctx.set_network_enabled(true);
        let online =
            CoordinateOperation::new(&source, &target, OperationOptions::default()).unwrap();
        assert_eq!(online.candidate_count(), offline.candidate_count() + 1);
    }

    #[test]
    fn test_ballpark_can_be_disallowed() {
        let ctx = Context::new();
        let source = crs(
            &ctx,
            r#"GEOGCRS["Local",DATUM["Totally Local Datum",ELLIPSOID["WGS 84",6378137,298.257223563,LENGTHUNIT["metre",1]]],CS[ellipsoidal,2],AXIS["latitude",north,ANGLEUNIT["degree",0.0174532925199433]],AXIS["longitude",east,ANGLEUNIT["degree",0.0174532925199433]]]"#,
        );
        let target = crs(&ctx, "EPSG:4326");

        let with_ballpark =
            CoordinateOperation::new(&source, &target, OperationOptions::default()).unwrap();
        assert_eq!(with_ballpark.candidate_count(), 1);
        assert_eq!(with_ballpark.accuracy().unwrap(), None);

        let err = CoordinateOperation::new(
            &source,
            &target,
            OperationOptions {
                allow_ballpark: false,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoOperationFound(_)));
    }

    #[test]
    fn test_minimum_accuracy_filters() {
        let ctx = Context::new();
        let source = crs(&ctx, "EPSG:4230");
        let target = crs(&ctx, "EPSG:4326");
        let op = CoordinateOperation::new(
            &source,
            &target,
            OperationOptions {
                minimum_accuracy: Some(6.0),
                ..Default::default()
            },
        )
        .unwrap();
        // Only the Iberia (5 m) and Norway offshore (4 m) shifts survive;
        // the 10 m mean and the ballpark do not.
        assert_eq!(op.candidate_count(), 2);
    }

    #[test]
    fn test_area_of_interest_narrows_choice() {
        let ctx = Context::new();
        let source = crs(&ctx, "EPSG:4230");
        let target = crs(&ctx, "EPSG:4326");
        let op = CoordinateOperation::new(
            &source,
            &target,
            OperationOptions {
                area_of_interest: Some(AreaOfInterest::new(-9.0, 36.0, 3.0, 43.0, "Spain")),
                allow_ballpark: false,
                ..Default::default()
            },
        )
        .unwrap();
        // Iberia and the Europe-wide mean intersect Spain; Norway does not.
        assert_eq!(op.candidate_count(), 2);
    }

    #[test]
    fn test_operation_object_metadata() {
        let ctx = Context::new();
        let source = crs(&ctx, "EPSG:4326");
        let target = crs(&ctx, "EPSG:32633");
        let op = CoordinateOperation::new(&source, &target, OperationOptions::default()).unwrap();
        assert_eq!(op.kind().unwrap(), ObjectKind::Conversion);
        assert_eq!(op.name().unwrap(), "UTM zone 33N");
        assert_eq!(op.method_name().unwrap(), "Transverse Mercator");
        assert_eq!(op.source_crs().name().unwrap(), "WGS 84");
        assert_eq!(op.target_crs().name().unwrap(), "WGS 84 / UTM zone 33N");
    }

    #[test]
    fn test_apply_many() {
        let ctx = Context::new();
        let source = crs(&ctx, "+proj=longlat +datum=WGS84");
        let target = crs(&ctx, "EPSG:32633");
        let op = CoordinateOperation::new(&source, &target, OperationOptions::default()).unwrap();
        let mut coords = [Coordinate::xy(12.0, 55.0), Coordinate::xy(15.0, 60.0)];
        op.apply_many(&mut coords).unwrap();
        assert_relative_eq!(coords[0].x, 308_124.37, epsilon = 0.05);
        assert_relative_eq!(coords[1].x, 500_000.0, epsilon = 0.01);
    }

    #[test]
    fn test_disposed_context_blocks_apply() {
        let ctx = Context::new();
        let source = crs(&ctx, "EPSG:4326");
        let target = crs(&ctx, "EPSG:32633");
        let op = CoordinateOperation::new(&source, &target, OperationOptions::default()).unwrap();
        ctx.dispose();
        assert!(matches!(
            op.apply(Coordinate::xy(55.0, 12.0)),
            Err(Error::Disposed)
        ));
        assert!(matches!(op.accuracy(), Err(Error::Disposed)));
    }

    #[test]
    fn test_coordinate_transform_helper() {
        let ctx = Context::new();
        let source = crs(&ctx, "+proj=longlat +datum=WGS84");
        let target = crs(&ctx, "EPSG:32633");
        let op = CoordinateOperation::new(&source, &target, OperationOptions::default()).unwrap();
        let out = Coordinate::xy(12.0, 55.0).transform(&op).unwrap();
        assert_relative_eq!(out.x, 308_124.37, epsilon = 0.05);
    }
}

//! Typed CRS handles and their derivations.
//!
//! A [`Crs`] is an [`Object`] known to be a coordinate reference system.
//! Every derivation takes an optional context override: the derived object
//! is adopted there when given, and into the owning context otherwise.

use std::fmt;
use std::ops::Deref;

use tracing::trace;

use crate::context::{default_context, Context};
use crate::error::Error;
use crate::model::{
    AxisDirection, ConversionDef, CrsDef, CrsKind, CsDef, DatumOrEnsemble, Def, OperationDef,
    OperationKind,
};
use crate::object::{Object, ObjectKind};

/// A coordinate reference system handle.
#[derive(Clone)]
pub struct Crs {
    object: Object,
}

impl Crs {
    /// Parse a CRS definition (WKT, PROJ string, PROJJSON or authority
    /// code); fails with [`Error::InvalidParameter`] when the text defines
    /// something other than a CRS.
    pub fn create(definition: &str, ctx: Option<&Context>) -> Result<Crs, Error> {
        Crs::try_from(Object::create(definition, ctx)?)
    }

    /// Resolve `authority:code` through the context's authority database.
    pub fn create_from_database(
        authority: &str,
        code: &str,
        ctx: Option<&Context>,
    ) -> Result<Crs, Error> {
        let ctx = ctx.cloned().unwrap_or_else(default_context);
        Crs::try_from(ctx.create_from_database(authority, code)?)
    }

    pub fn create_from_epsg(code: u32, ctx: Option<&Context>) -> Result<Crs, Error> {
        Crs::create_from_database("EPSG", &code.to_string(), ctx)
    }

    /// The untyped view of this CRS.
    pub fn as_object(&self) -> &Object {
        &self.object
    }

    pub fn into_object(self) -> Object {
        self.object
    }

    pub(crate) fn def(&self) -> Result<CrsDef, Error> {
        let rec = self.object.record()?;
        match &rec.def {
            Def::Crs(crs) => Ok(crs.clone()),
            _ => Err(Error::InvalidParameter("object is not a CRS".into())),
        }
    }

    fn resolve_ctx(&self, ctx: Option<&Context>) -> Result<Context, Error> {
        match ctx {
            Some(c) if c.is_disposed() => Err(Error::Disposed),
            Some(c) => Ok(c.clone()),
            None => self.object.context(),
        }
    }

    fn adopt_crs(&self, ctx: Option<&Context>, def: CrsDef) -> Result<Crs, Error> {
        Ok(Crs {
            object: self.resolve_ctx(ctx)?.adopt(Def::Crs(def)),
        })
    }

    pub fn is_deprecated(&self) -> Result<bool, Error> {
        Ok(self.def()?.info.deprecated)
    }

    // -- derivations --------------------------------------------------------

    /// This CRS with its axes in GIS-friendly order (longitude/easting
    /// first). Already-normalized CRS come back as a plain copy.
    pub fn normalized(&self, ctx: Option<&Context>) -> Result<Crs, Error> {
        let mut def = self.def()?;
        normalize_axis_order(&mut def);
        trace!(name = %def.info.name, "normalized axis order");
        self.adopt_crs(ctx, def)
    }

    /// The geographic or geocentric CRS this one is built on; itself for
    /// geographic CRS, `None` for vertical/engineering/temporal CRS.
    pub fn geodetic_crs(&self, ctx: Option<&Context>) -> Result<Option<Crs>, Error> {
        let def = self.def()?;
        match def.geodetic_crs() {
            Some(geodetic) => Ok(Some(self.adopt_crs(ctx, geodetic.clone())?)),
            None => Ok(None),
        }
    }

    /// Base CRS of a projected or bound CRS.
    pub fn base_crs(&self, ctx: Option<&Context>) -> Result<Option<Crs>, Error> {
        let def = self.def()?;
        match def.base {
            Some(base) => Ok(Some(self.adopt_crs(ctx, *base)?)),
            None => Ok(None),
        }
    }

    /// Hub of a bound CRS; `None` for every other kind.
    pub fn hub_crs(&self, ctx: Option<&Context>) -> Result<Option<Crs>, Error> {
        let def = self.def()?;
        if def.kind != CrsKind::Bound {
            return Ok(None);
        }
        match def.hub {
            Some(hub) => Ok(Some(self.adopt_crs(ctx, *hub)?)),
            None => Ok(None),
        }
    }

    /// The datum or datum ensemble directly referenced by this CRS.
    pub fn datum(&self, ctx: Option<&Context>) -> Result<Option<Object>, Error> {
        let def = self.def()?;
        match def.datum {
            Some(d) => Ok(Some(self.resolve_ctx(ctx)?.adopt(datum_def(d)))),
            None => Ok(None),
        }
    }

    /// The datum (or ensemble) governing horizontal position, found through
    /// the geodetic CRS.
    pub fn horizontal_datum(&self, ctx: Option<&Context>) -> Result<Option<Object>, Error> {
        let def = self.def()?;
        match def.horizontal_datum() {
            Some(d) => Ok(Some(self.resolve_ctx(ctx)?.adopt(datum_def(d.clone())))),
            None => Ok(None),
        }
    }

    /// Every member datum: the ensemble members, or the single datum.
    pub fn datum_list(&self, ctx: Option<&Context>) -> Result<Vec<Object>, Error> {
        let def = self.def()?;
        let target = self.resolve_ctx(ctx)?;
        Ok(match def.horizontal_datum() {
            Some(DatumOrEnsemble::Ensemble(e)) => e
                .members
                .iter()
                .map(|m| target.adopt(Def::Datum(m.clone())))
                .collect(),
            Some(DatumOrEnsemble::Datum(d)) => vec![target.adopt(Def::Datum(d.clone()))],
            None => Vec::new(),
        })
    }

    /// A concrete datum, synthesized from the ensemble when needed. Unlike
    /// [`Crs::datum`] this never returns `None`; a CRS without any frame
    /// fails with [`Error::UnsupportedDerivation`].
    pub fn datum_forced(&self, ctx: Option<&Context>) -> Result<Datum, Error> {
        let def = self.def()?;
        let datum = def
            .horizontal_datum()
            .map(|d| d.forced_datum())
            .ok_or_else(|| {
                Error::UnsupportedDerivation(format!(
                    "CRS {:?} has no datum to force",
                    def.info.name
                ))
            })?;
        Ok(Datum {
            object: self.resolve_ctx(ctx)?.adopt(Def::Datum(datum)),
        })
    }

    /// The bare coordinate system of this CRS, as a no-definition object.
    /// Memoized on the record when no context override is given.
    pub fn coordinate_system(&self, ctx: Option<&Context>) -> Result<CoordinateSystem, Error> {
        let rec = self.object.record()?;
        let cs = match &rec.def {
            Def::Crs(crs) => crs.cs.clone(),
            _ => return Err(Error::InvalidParameter("object is not a CRS".into())),
        };
        if let Some(target) = ctx {
            if target.is_disposed() {
                return Err(Error::Disposed);
            }
            return Ok(CoordinateSystem {
                object: target.adopt_record(Def::CoordinateSystem(cs), true),
            });
        }
        let owner = self.object.context()?;
        let stored = rec
            .coordinate_system
            .get_or_init(|| Some(owner.adopt_record(Def::CoordinateSystem(cs), true)));
        match stored {
            Some(obj) => Ok(CoordinateSystem {
                object: obj.clone(),
            }),
            None => Err(Error::Disposed),
        }
    }

    pub fn ellipsoid(&self, ctx: Option<&Context>) -> Result<Option<Ellipsoid>, Error> {
        let def = self.def()?;
        match def.ellipsoid() {
            Some(e) => Ok(Some(Ellipsoid {
                object: self.resolve_ctx(ctx)?.adopt(Def::Ellipsoid(e.clone())),
            })),
            None => Ok(None),
        }
    }

    pub fn prime_meridian(&self, ctx: Option<&Context>) -> Result<Option<PrimeMeridian>, Error> {
        let def = self.def()?;
        match def.prime_meridian() {
            Some(pm) => Ok(Some(PrimeMeridian {
                object: self.resolve_ctx(ctx)?.adopt(Def::PrimeMeridian(pm.clone())),
            })),
            None => Ok(None),
        }
    }

    /// The conversion of a projected CRS, or the transformation of a bound
    /// CRS; `None` for other kinds.
    pub fn coordinate_operation(&self, ctx: Option<&Context>) -> Result<Option<Object>, Error> {
        let def = self.def()?;
        let op = match def.kind {
            CrsKind::Projected => def.conversion.map(conversion_operation),
            CrsKind::Bound => def.bound_transform.map(|t| *t),
            _ => None,
        };
        match op {
            Some(op) => Ok(Some(self.resolve_ctx(ctx)?.adopt(Def::Operation(op)))),
            None => Ok(None),
        }
    }
}

impl TryFrom<Object> for Crs {
    type Error = Error;

    fn try_from(object: Object) -> Result<Crs, Error> {
        let kind = object.kind()?;
        if kind.is_crs() {
            Ok(Crs { object })
        } else {
            Err(Error::InvalidParameter(format!(
                "object of kind {kind:?} is not a CRS"
            )))
        }
    }
}

impl Deref for Crs {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.object
    }
}

impl fmt::Debug for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Crs({:?})", self.object)
    }
}

fn datum_def(d: DatumOrEnsemble) -> Def {
    match d {
        DatumOrEnsemble::Datum(d) => Def::Datum(d),
        DatumOrEnsemble::Ensemble(e) => Def::DatumEnsemble(e),
    }
}

fn conversion_operation(conv: ConversionDef) -> OperationDef {
    OperationDef {
        info: conv.info,
        kind: OperationKind::Conversion,
        source: None,
        target: None,
        method: Some(conv.method),
        params: conv.params,
        accuracy: Some(0.0),
        steps: Vec::new(),
    }
}

fn normalize_axis_order(def: &mut CrsDef) {
    normalize_cs(&mut def.cs);
    if let Some(base) = def.base.as_deref_mut() {
        normalize_axis_order(base);
    }
    for component in &mut def.components {
        normalize_axis_order(component);
    }
}

fn normalize_cs(cs: &mut CsDef) {
    if cs.axes.len() >= 2
        && cs.axes[0].direction == AxisDirection::North
        && cs.axes[1].direction == AxisDirection::East
    {
        cs.axes.swap(0, 1);
    }
}

// ---------------------------------------------------------------------------
// Typed leaf handles

macro_rules! leaf_handle {
    ($name:ident, $($kind:pat_param)|+, $label:literal) => {
        #[derive(Clone)]
        pub struct $name {
            object: Object,
        }

        impl $name {
            pub fn as_object(&self) -> &Object {
                &self.object
            }

            pub fn into_object(self) -> Object {
                self.object
            }
        }

        impl TryFrom<Object> for $name {
            type Error = Error;

            fn try_from(object: Object) -> Result<$name, Error> {
                match object.kind()? {
                    $($kind)|+ => Ok($name { object }),
                    kind => Err(Error::InvalidParameter(format!(
                        concat!("object of kind {:?} is not ", $label),
                        kind
                    ))),
                }
            }
        }

        impl Deref for $name {
            type Target = Object;

            fn deref(&self) -> &Object {
                &self.object
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:?})"), self.object)
            }
        }
    };
}

leaf_handle!(Ellipsoid, ObjectKind::Ellipsoid, "an ellipsoid");
leaf_handle!(PrimeMeridian, ObjectKind::PrimeMeridian, "a prime meridian");
leaf_handle!(
    Datum,
    ObjectKind::GeodeticReferenceFrame
        | ObjectKind::DynamicGeodeticReferenceFrame
        | ObjectKind::VerticalReferenceFrame
        | ObjectKind::DynamicVerticalReferenceFrame
        | ObjectKind::TemporalDatum
        | ObjectKind::EngineeringDatum
        | ObjectKind::ParametricDatum,
    "a datum"
);
leaf_handle!(DatumEnsemble, ObjectKind::DatumEnsemble, "a datum ensemble");
leaf_handle!(
    CoordinateSystem,
    ObjectKind::CoordinateSystem,
    "a coordinate system"
);

impl Ellipsoid {
    pub fn semi_major_metre(&self) -> Result<f64, Error> {
        self.with_def(|e| e.semi_major)
    }

    pub fn semi_minor_metre(&self) -> Result<f64, Error> {
        self.with_def(|e| e.semi_minor())
    }

    pub fn inverse_flattening(&self) -> Result<f64, Error> {
        self.with_def(|e| e.inverse_flattening)
    }

    pub fn is_sphere(&self) -> Result<bool, Error> {
        self.with_def(|e| e.is_sphere())
    }

    fn with_def<T>(&self, f: impl FnOnce(&crate::model::EllipsoidDef) -> T) -> Result<T, Error> {
        let rec = self.object.record()?;
        match &rec.def {
            Def::Ellipsoid(e) => Ok(f(e)),
            _ => Err(Error::InvalidParameter("object is not an ellipsoid".into())),
        }
    }
}

impl PrimeMeridian {
    /// Longitude from the reference meridian, in degrees.
    pub fn longitude(&self) -> Result<f64, Error> {
        let rec = self.object.record()?;
        match &rec.def {
            Def::PrimeMeridian(pm) => Ok(pm.longitude),
            _ => Err(Error::InvalidParameter(
                "object is not a prime meridian".into(),
            )),
        }
    }
}

impl DatumEnsemble {
    /// Positional accuracy of treating the members as one frame, metres.
    pub fn accuracy(&self) -> Result<f64, Error> {
        let rec = self.object.record()?;
        match &rec.def {
            Def::DatumEnsemble(e) => Ok(e.accuracy),
            _ => Err(Error::InvalidParameter(
                "object is not a datum ensemble".into(),
            )),
        }
    }

    pub fn member_count(&self) -> Result<usize, Error> {
        let rec = self.object.record()?;
        match &rec.def {
            Def::DatumEnsemble(e) => Ok(e.members.len()),
            _ => Err(Error::InvalidParameter(
                "object is not a datum ensemble".into(),
            )),
        }
    }
}

/// One axis of a coordinate system, as plain data.
#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    pub name: String,
    pub abbreviation: String,
    pub direction: AxisDirection,
    pub unit_name: String,
    /// Factor to the base unit of the axis kind (radians or metres).
    pub unit_factor: f64,
}

impl CoordinateSystem {
    pub fn axis_count(&self) -> Result<usize, Error> {
        self.with_def(|cs| cs.axes.len())
    }

    pub fn axis(&self, index: usize) -> Result<Option<Axis>, Error> {
        self.with_def(|cs| {
            cs.axes.get(index).map(|a| Axis {
                name: a.name.clone(),
                abbreviation: a.abbreviation.clone(),
                direction: a.direction,
                unit_name: a.unit.name.clone(),
                unit_factor: a.unit.factor,
            })
        })
    }

    pub fn axes(&self) -> Result<Vec<Axis>, Error> {
        let count = self.axis_count()?;
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            if let Some(axis) = self.axis(i)? {
                out.push(axis);
            }
        }
        Ok(out)
    }

    fn with_def<T>(&self, f: impl FnOnce(&CsDef) -> T) -> Result<T, Error> {
        let rec = self.object.record()?;
        match &rec.def {
            Def::CoordinateSystem(cs) => Ok(f(cs)),
            _ => Err(Error::InvalidParameter(
                "object is not a coordinate system".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_try_from_rejects_non_crs() {
        let ctx = Context::new();
        let crs = Crs::create_from_epsg(4326, Some(&ctx)).unwrap();
        let ell = crs.ellipsoid(None).unwrap().unwrap();
        assert!(Crs::try_from(ell.into_object()).is_err());
    }

    #[test]
    fn test_ellipsoid_of_wgs84() {
        let ctx = Context::new();
        let crs = Crs::create("EPSG:4326", Some(&ctx)).unwrap();
        let ell = crs.ellipsoid(None).unwrap().unwrap();
        assert_eq!(ell.name().unwrap(), "WGS 84");
        assert_relative_eq!(ell.semi_major_metre().unwrap(), 6_378_137.0);
        assert_relative_eq!(
            ell.inverse_flattening().unwrap(),
            298.257_223_563,
            epsilon = 1e-9
        );
        assert!(!ell.is_sphere().unwrap());
    }

    #[test]
    fn test_prime_meridian_longitude() {
        let ctx = Context::new();
        let crs = Crs::create("EPSG:4326", Some(&ctx)).unwrap();
        let pm = crs.prime_meridian(None).unwrap().unwrap();
        assert_relative_eq!(pm.longitude().unwrap(), 0.0);
    }

    #[test]
    fn test_normalized_swaps_lat_lon() {
        let ctx = Context::new();
        let crs = Crs::create_from_epsg(4326, Some(&ctx)).unwrap();
        let cs = crs.coordinate_system(None).unwrap();
        assert_eq!(cs.axis(0).unwrap().unwrap().direction, AxisDirection::North);

        let gis = crs.normalized(None).unwrap();
        let cs = gis.coordinate_system(None).unwrap();
        assert_eq!(cs.axis(0).unwrap().unwrap().direction, AxisDirection::East);
        assert_eq!(cs.axis_count().unwrap(), 2);
        // Axis order is exactly what relaxed equivalence forgives.
        assert!(!gis.is_equivalent_to(&crs, None).unwrap());
        assert!(gis.is_equivalent_to_relaxed(&crs, None).unwrap());
    }

    #[test]
    fn test_base_crs_of_projected() {
        let ctx = Context::new();
        let utm = Crs::create_from_epsg(32633, Some(&ctx)).unwrap();
        let base = utm.base_crs(None).unwrap().unwrap();
        assert_eq!(base.kind().unwrap(), ObjectKind::Geographic2DCrs);
        let geodetic = utm.geodetic_crs(None).unwrap().unwrap();
        assert!(base.is_equivalent_to(&geodetic, None).unwrap());
    }

    #[test]
    fn test_hub_is_none_for_non_bound() {
        let ctx = Context::new();
        let crs = Crs::create_from_epsg(32633, Some(&ctx)).unwrap();
        assert!(crs.hub_crs(None).unwrap().is_none());
        assert!(crs.base_crs(None).unwrap().is_some());
    }

    #[test]
    fn test_hub_of_bound_crs() {
        let ctx = Context::new();
        let wkt = r#"BOUNDCRS[
            SOURCECRS[GEOGCRS["ED50",
                DATUM["European Datum 1950",
                    ELLIPSOID["International 1924",6378388,297]],
                CS[ellipsoidal,2],
                    AXIS["geodetic latitude (Lat)",north],
                    AXIS["geodetic longitude (Lon)",east],
                    ANGLEUNIT["degree",0.0174532925199433]]],
            TARGETCRS[GEOGCRS["WGS 84",
                DATUM["World Geodetic System 1984",
                    ELLIPSOID["WGS 84",6378137,298.257223563]],
                CS[ellipsoidal,2],
                    AXIS["geodetic latitude (Lat)",north],
                    AXIS["geodetic longitude (Lon)",east],
                    ANGLEUNIT["degree",0.0174532925199433]]],
            ABRIDGEDTRANSFORMATION["ED50 to WGS 84",
                METHOD["Geocentric translations",ID["EPSG",1031]],
                PARAMETER["X-axis translation",-87],
                PARAMETER["Y-axis translation",-98],
                PARAMETER["Z-axis translation",-121]]]"#;
        let crs = Crs::create(wkt, Some(&ctx)).unwrap();
        assert_eq!(crs.kind().unwrap(), ObjectKind::BoundCrs);
        let hub = crs.hub_crs(None).unwrap().unwrap();
        assert_eq!(hub.name().unwrap(), "WGS 84");
        let base = crs.base_crs(None).unwrap().unwrap();
        assert_eq!(base.name().unwrap(), "ED50");
        let op = crs.coordinate_operation(None).unwrap().unwrap();
        assert_eq!(op.kind().unwrap(), ObjectKind::Transformation);
    }

    #[test]
    fn test_coordinate_operation_of_projected() {
        let ctx = Context::new();
        let utm = Crs::create_from_epsg(32633, Some(&ctx)).unwrap();
        let op = utm.coordinate_operation(None).unwrap().unwrap();
        assert_eq!(op.kind().unwrap(), ObjectKind::Conversion);
    }

    #[test]
    fn test_datum_forced_from_ensemble() {
        let ctx = Context::new();
        let wkt = r#"GEOGCRS["WGS 84",
            ENSEMBLE["World Geodetic System 1984 ensemble",
                MEMBER["World Geodetic System 1984 (Transit)"],
                MEMBER["World Geodetic System 1984 (G2296)"],
                ELLIPSOID["WGS 84",6378137,298.257223563],
                ENSEMBLEACCURACY[2.0]],
            CS[ellipsoidal,2],
                AXIS["geodetic latitude (Lat)",north],
                AXIS["geodetic longitude (Lon)",east],
                ANGLEUNIT["degree",0.0174532925199433]]"#;
        let crs = Crs::create(wkt, Some(&ctx)).unwrap();
        let ensemble = crs.datum(None).unwrap().unwrap();
        assert_eq!(ensemble.kind().unwrap(), ObjectKind::DatumEnsemble);
        assert_eq!(crs.datum_list(None).unwrap().len(), 2);

        let forced = crs.datum_forced(None).unwrap();
        assert_eq!(
            forced.kind().unwrap(),
            ObjectKind::GeodeticReferenceFrame
        );
        assert_eq!(forced.name().unwrap(), "World Geodetic System 1984 ensemble");
    }

    #[test]
    fn test_coordinate_system_is_memoized_and_no_proj() {
        let ctx = Context::new();
        let crs = Crs::create_from_epsg(4326, Some(&ctx)).unwrap();
        let cs1 = crs.coordinate_system(None).unwrap();
        let cs2 = crs.coordinate_system(None).unwrap();
        assert_eq!(cs1.kind().unwrap(), ObjectKind::CoordinateSystem);
        // Bare coordinate systems have no standalone definition.
        assert_eq!(cs1.name().unwrap(), "?");
        assert!(cs1
            .as_wkt(&crate::object::WktOptions::default())
            .unwrap()
            .is_none());
        // Same memoized record behind both handles.
        assert!(cs1.object.rec.ptr_eq(&cs2.object.rec));
    }

    #[test]
    fn test_derivation_into_other_context_survives_disposal() {
        let ctx = Context::new();
        let keeper = Context::new();
        let crs = Crs::create_from_epsg(4326, Some(&ctx)).unwrap();
        let ell = crs.ellipsoid(Some(&keeper)).unwrap().unwrap();
        ctx.dispose();
        assert!(crs.ellipsoid(None).is_err());
        assert_eq!(ell.name().unwrap(), "WGS 84");
    }

    #[test]
    fn test_deprecated_flag_defaults_false() {
        let ctx = Context::new();
        let crs = Crs::create_from_epsg(4326, Some(&ctx)).unwrap();
        assert!(!crs.is_deprecated().unwrap());
    }
}

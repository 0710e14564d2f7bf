//! The common base of every geodetic object: lazy descriptive attributes,
//! serialization to the three textual forms, and equivalence comparison.

use std::cell::OnceCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::context::{default_context, Context, ContextInner};
use crate::error::Error;
use crate::ident::{Identifier, IdentifierList, UsageArea};
use crate::model::equivalence::{self, Strictness};
use crate::model::Def;

/// The closed set of geodetic object kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Unknown,
    Ellipsoid,
    PrimeMeridian,
    GeodeticReferenceFrame,
    DynamicGeodeticReferenceFrame,
    VerticalReferenceFrame,
    DynamicVerticalReferenceFrame,
    TemporalDatum,
    EngineeringDatum,
    ParametricDatum,
    DatumEnsemble,
    Geographic2DCrs,
    Geographic3DCrs,
    GeocentricCrs,
    VerticalCrs,
    ProjectedCrs,
    CompoundCrs,
    BoundCrs,
    TemporalCrs,
    EngineeringCrs,
    OtherCrs,
    Conversion,
    Transformation,
    ConcatenatedOperation,
    OtherCoordinateOperation,
    /// Lazy candidate-set operation; a local kind, never parsed from text.
    ChooseTransform,
    /// Derived bare coordinate system; a local kind, never parsed from text.
    CoordinateSystem,
}

impl ObjectKind {
    pub fn is_crs(&self) -> bool {
        matches!(
            self,
            ObjectKind::Geographic2DCrs
                | ObjectKind::Geographic3DCrs
                | ObjectKind::GeocentricCrs
                | ObjectKind::VerticalCrs
                | ObjectKind::ProjectedCrs
                | ObjectKind::CompoundCrs
                | ObjectKind::BoundCrs
                | ObjectKind::TemporalCrs
                | ObjectKind::EngineeringCrs
                | ObjectKind::OtherCrs
        )
    }
}

/// One arena slot: the immutable definition plus its derived-data caches.
pub(crate) struct ObjectRecord {
    pub(crate) def: Def,
    /// True when the object has no true geodetic definition.
    pub(crate) no_proj: bool,
    name: OnceCell<String>,
    remarks: OnceCell<String>,
    scope: OnceCell<String>,
    celestial_body: OnceCell<String>,
    identifiers: OnceCell<IdentifierList>,
    usage_area: OnceCell<Option<UsageArea>>,
    pub(crate) coordinate_system: OnceCell<Option<Object>>,
}

impl ObjectRecord {
    pub(crate) fn new(def: Def, no_proj: bool) -> Self {
        ObjectRecord {
            def,
            no_proj,
            name: OnceCell::new(),
            remarks: OnceCell::new(),
            scope: OnceCell::new(),
            celestial_body: OnceCell::new(),
            identifiers: OnceCell::new(),
            usage_area: OnceCell::new(),
            coordinate_system: OnceCell::new(),
        }
    }
}

/// Handle to a geodetic object owned by a [`Context`].
///
/// The handle stays valid exactly as long as the owning context; any access
/// after the context is disposed fails with [`Error::Disposed`].
#[derive(Clone)]
pub struct Object {
    pub(crate) ctx: Weak<ContextInner>,
    pub(crate) rec: Weak<ObjectRecord>,
    /// Strong hold on a context created just for this handle (clones made
    /// without a target context). `None` for ordinary arena handles, so the
    /// context stays the sole owner.
    pub(crate) owner: Option<Rc<ContextInner>>,
}

impl Object {
    pub(crate) fn record(&self) -> Result<Rc<ObjectRecord>, Error> {
        let ctx = self.ctx.upgrade().ok_or(Error::Disposed)?;
        if ctx.is_disposed() {
            return Err(Error::Disposed);
        }
        self.rec.upgrade().ok_or(Error::Disposed)
    }

    /// The owning context.
    pub fn context(&self) -> Result<Context, Error> {
        let inner = self.ctx.upgrade().ok_or(Error::Disposed)?;
        if inner.is_disposed() {
            return Err(Error::Disposed);
        }
        Ok(Context::from_inner(inner))
    }

    pub fn kind(&self) -> Result<ObjectKind, Error> {
        let rec = self.record()?;
        if rec.no_proj {
            // Local kinds keep their identity; everything else is opaque.
            return Ok(match rec.def {
                Def::CoordinateSystem(_) => ObjectKind::CoordinateSystem,
                Def::Operation(_) => ObjectKind::ChooseTransform,
                _ => ObjectKind::Unknown,
            });
        }
        Ok(rec.def.kind())
    }

    pub(crate) fn is_no_proj(&self) -> Result<bool, Error> {
        Ok(self.record()?.no_proj)
    }

    /// Object name; `"?"` for objects without a true definition.
    pub fn name(&self) -> Result<String, Error> {
        let rec = self.record()?;
        if let Some(v) = rec.name.get() {
            return Ok(v.clone());
        }
        let value = if rec.no_proj {
            "?".to_string()
        } else {
            rec.def
                .info()
                .map(|i| i.name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "?".to_string())
        };
        Ok(rec.name.get_or_init(|| value).clone())
    }

    pub fn remarks(&self) -> Result<String, Error> {
        let rec = self.record()?;
        if let Some(v) = rec.remarks.get() {
            return Ok(v.clone());
        }
        let value = if rec.no_proj {
            "?".to_string()
        } else {
            rec.def
                .info()
                .and_then(|i| i.remarks.clone())
                .unwrap_or_default()
        };
        Ok(rec.remarks.get_or_init(|| value).clone())
    }

    pub fn scope(&self) -> Result<String, Error> {
        let rec = self.record()?;
        if let Some(v) = rec.scope.get() {
            return Ok(v.clone());
        }
        let value = if rec.no_proj {
            "?".to_string()
        } else {
            rec.def
                .info()
                .and_then(|i| i.scope.clone())
                .unwrap_or_default()
        };
        Ok(rec.scope.get_or_init(|| value).clone())
    }

    /// Body on which this applies. Usually "Earth".
    pub fn celestial_body_name(&self) -> Result<String, Error> {
        let rec = self.record()?;
        if let Some(v) = rec.celestial_body.get() {
            return Ok(v.clone());
        }
        let value = if rec.no_proj {
            "?".to_string()
        } else {
            match rec.def.info().and_then(|i| i.celestial_body.clone()) {
                Some(body) => body,
                None => self.context()?.default_celestial_body(),
            }
        };
        Ok(rec.celestial_body.get_or_init(|| value).clone())
    }

    /// Declared identifiers; the first is the primary one.
    pub fn identifiers(&self) -> Result<IdentifierList, Error> {
        let rec = self.record()?;
        if let Some(v) = rec.identifiers.get() {
            return Ok(v.clone());
        }
        let value = IdentifierList::new(
            rec.def
                .info()
                .map(|i| i.identifiers.clone())
                .unwrap_or_default(),
        );
        Ok(rec.identifiers.get_or_init(|| value).clone())
    }

    /// The primary identifier, when any is declared.
    pub fn identifier(&self) -> Result<Option<Identifier>, Error> {
        Ok(self.identifiers()?.primary().cloned())
    }

    /// Area of applicability, when declared.
    pub fn usage_area(&self) -> Result<Option<UsageArea>, Error> {
        let rec = self.record()?;
        if let Some(v) = rec.usage_area.get() {
            return Ok(v.clone());
        }
        let value = rec.def.info().and_then(|i| i.usage_area.clone());
        Ok(rec.usage_area.get_or_init(|| value).clone())
    }

    /// Deep copy into `ctx`, or into a fresh clone of the owning context
    /// when none is given.
    pub fn clone_into(&self, ctx: Option<&Context>) -> Result<Object, Error> {
        let rec = self.record()?;
        trace!(kind = ?rec.def.kind(), "cloning object into context");
        match ctx {
            Some(c) => Ok(c.adopt_record(rec.def.clone(), rec.no_proj)),
            None => {
                // Nothing else holds the fresh context, so the handle itself
                // must keep its arena alive.
                let target = self.context()?.clone_context();
                let mut copy = target.adopt_record(rec.def.clone(), rec.no_proj);
                copy.owner = Some(target.into_inner());
                Ok(copy)
            }
        }
    }

    // -- serialization ------------------------------------------------------

    /// Well-known text; `None` for objects without a true definition.
    pub fn as_wkt(&self, options: &WktOptions) -> Result<Option<String>, Error> {
        let rec = self.record()?;
        if rec.no_proj {
            return Ok(None);
        }
        crate::wkt::write::write_def(&rec.def, options)
    }

    /// PROJ string; `None` for objects a PROJ string cannot express.
    pub fn as_proj_string(&self, options: &ProjStringOptions) -> Result<Option<String>, Error> {
        let rec = self.record()?;
        if rec.no_proj {
            return Ok(None);
        }
        match &rec.def {
            Def::Crs(crs) => Ok(Some(crate::projstring::write_crs(crs, options)?)),
            _ => Ok(None),
        }
    }

    /// PROJJSON; `None` for objects without a true definition.
    pub fn as_proj_json(&self, options: &ProjJsonOptions) -> Result<Option<String>, Error> {
        let rec = self.record()?;
        if rec.no_proj {
            return Ok(None);
        }
        crate::projjson::write_def(&rec.def, options)
    }

    // -- equivalence --------------------------------------------------------

    /// Structural equivalence. `false` (never an error) when either side
    /// lacks a true definition; `Err(Disposed)` when either side is dead.
    pub fn is_equivalent_to(&self, other: &Object, ctx: Option<&Context>) -> Result<bool, Error> {
        self.equivalence(other, ctx, Strictness::Strict)
    }

    /// Like [`Object::is_equivalent_to`] but ignoring the axis ordering of
    /// geographic CRS.
    pub fn is_equivalent_to_relaxed(
        &self,
        other: &Object,
        ctx: Option<&Context>,
    ) -> Result<bool, Error> {
        self.equivalence(other, ctx, Strictness::RelaxedAxisOrder)
    }

    fn equivalence(
        &self,
        other: &Object,
        _ctx: Option<&Context>,
        strictness: Strictness,
    ) -> Result<bool, Error> {
        let a = self.record()?;
        let b = other.record()?;
        if a.no_proj || b.no_proj {
            return Ok(false);
        }
        Ok(equivalence::equivalent(&a.def, &b.def, strictness))
    }

    // -- construction -------------------------------------------------------

    /// Parse any supported definition text (WKT, PROJ string, PROJJSON or
    /// authority:code) into the matching object kind.
    pub fn create(definition: &str, ctx: Option<&Context>) -> Result<Object, Error> {
        let ctx = ctx.cloned().unwrap_or_else(default_context);
        ctx.create(definition)
    }

    /// As [`Object::create`], from a definition split over several lines.
    pub fn create_from_definition_lines(
        lines: &[&str],
        ctx: Option<&Context>,
    ) -> Result<Object, Error> {
        let ctx = ctx.cloned().unwrap_or_else(default_context);
        ctx.create(&lines.join(" "))
    }

    /// Parse WKT, additionally reporting recoverable parse warnings.
    pub fn create_from_wkt(
        text: &str,
        ctx: Option<&Context>,
    ) -> Result<(Object, Vec<String>), Error> {
        let ctx = ctx.cloned().unwrap_or_else(default_context);
        ctx.create_from_wkt(text)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.record() {
            Ok(rec) => write!(
                f,
                "Object[{:?}] {}",
                rec.def.kind(),
                self.name().unwrap_or_else(|_| "?".into())
            ),
            Err(_) => write!(f, "Object[disposed]"),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Ok(name) => write!(f, "{name}"),
            Err(_) => write!(f, "<disposed>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Serialization options

/// WKT revision/flavor to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WktVariant {
    Wkt2_2015,
    Wkt2_2015Simplified,
    #[default]
    Wkt2_2019,
    Wkt2_2019Simplified,
    Wkt1Gdal,
    Wkt1Esri,
}

#[derive(Clone, Debug, Default)]
pub struct WktOptions {
    pub variant: WktVariant,
    pub single_line: bool,
    pub no_indentation: bool,
    /// Tri-state axis output override for WKT1: `None` = flavor default.
    pub output_axis: Option<bool>,
    /// Strict mode refuses definitions the chosen flavor cannot represent;
    /// the default relaxed mode degrades them and keeps going.
    pub strict: bool,
    pub allow_ellipsoidal_height_as_vertical_crs: bool,
}

/// PROJ string generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ProjStringVariant {
    /// Legacy "Proj4" form.
    Proj4,
    /// Current form.
    #[default]
    Proj5,
}

#[derive(Clone, Debug, Default)]
pub struct ProjStringOptions {
    pub variant: ProjStringVariant,
    pub multi_line: bool,
    pub no_indentation: bool,
    /// Emit `+approx` on methods computed with approximate formulas.
    pub write_approx_flag: bool,
}

/// PROJJSON schema version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ProjJsonVariant {
    SchemaV0_2,
    #[default]
    SchemaV0_4,
}

impl ProjJsonVariant {
    pub fn schema_url(&self) -> &'static str {
        match self {
            ProjJsonVariant::SchemaV0_2 => SCHEMA_V0_2_URL,
            ProjJsonVariant::SchemaV0_4 => SCHEMA_V0_4_URL,
        }
    }
}

pub const SCHEMA_V0_2_URL: &str = "https://proj.org/schemas/v0.2/projjson.schema.json";
pub const SCHEMA_V0_4_URL: &str = "https://proj.org/schemas/v0.4/projjson.schema.json";

#[derive(Clone, Debug, Default)]
pub struct ProjJsonOptions {
    pub variant: ProjJsonVariant,
    pub no_multi_line: bool,
    pub no_indentation: bool,
}

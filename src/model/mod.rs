//! Internal definitions backing every geodetic object.
//!
//! The object taxonomy is closed and stable, so the whole hierarchy is a
//! tagged union dispatched with `match` rather than trait objects. Handles
//! (`Object`, `Crs`, …) reference these definitions through the context
//! arena; the definitions themselves are plain immutable data.

pub(crate) mod equivalence;

use crate::ident::{Identifier, UsageArea};
use crate::object::ObjectKind;

/// Descriptive attributes shared by every definition.
#[derive(Clone, Debug, Default)]
pub(crate) struct ObjectInfo {
    pub name: String,
    pub remarks: Option<String>,
    pub scope: Option<String>,
    pub celestial_body: Option<String>,
    pub identifiers: Vec<Identifier>,
    pub usage_area: Option<UsageArea>,
    pub deprecated: bool,
}

impl ObjectInfo {
    pub fn named(name: impl Into<String>) -> Self {
        ObjectInfo {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, authority: &str, code: impl ToString) -> Self {
        self.identifiers.push(Identifier::new(authority, code.to_string()));
        self
    }
}

/// The native definition of one geodetic object.
#[derive(Clone, Debug)]
pub(crate) enum Def {
    /// A placeholder with no true geodetic definition ("no-proj" object).
    Placeholder,
    Ellipsoid(EllipsoidDef),
    PrimeMeridian(PrimeMeridianDef),
    Datum(DatumDef),
    DatumEnsemble(DatumEnsembleDef),
    CoordinateSystem(CsDef),
    Crs(CrsDef),
    Operation(OperationDef),
}

impl Def {
    pub fn info(&self) -> Option<&ObjectInfo> {
        match self {
            Def::Placeholder | Def::CoordinateSystem(_) => None,
            Def::Ellipsoid(d) => Some(&d.info),
            Def::PrimeMeridian(d) => Some(&d.info),
            Def::Datum(d) => Some(&d.info),
            Def::DatumEnsemble(d) => Some(&d.info),
            Def::Crs(d) => Some(&d.info),
            Def::Operation(d) => Some(&d.info),
        }
    }

    pub fn info_mut(&mut self) -> Option<&mut ObjectInfo> {
        match self {
            Def::Placeholder | Def::CoordinateSystem(_) => None,
            Def::Ellipsoid(d) => Some(&mut d.info),
            Def::PrimeMeridian(d) => Some(&mut d.info),
            Def::Datum(d) => Some(&mut d.info),
            Def::DatumEnsemble(d) => Some(&mut d.info),
            Def::Crs(d) => Some(&mut d.info),
            Def::Operation(d) => Some(&mut d.info),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Def::Placeholder => ObjectKind::Unknown,
            Def::Ellipsoid(_) => ObjectKind::Ellipsoid,
            Def::PrimeMeridian(_) => ObjectKind::PrimeMeridian,
            Def::Datum(d) => match d.kind {
                DatumKind::Geodetic => ObjectKind::GeodeticReferenceFrame,
                DatumKind::DynamicGeodetic => ObjectKind::DynamicGeodeticReferenceFrame,
                DatumKind::Vertical => ObjectKind::VerticalReferenceFrame,
                DatumKind::DynamicVertical => ObjectKind::DynamicVerticalReferenceFrame,
                DatumKind::Temporal => ObjectKind::TemporalDatum,
                DatumKind::Engineering => ObjectKind::EngineeringDatum,
                DatumKind::Parametric => ObjectKind::ParametricDatum,
            },
            Def::DatumEnsemble(_) => ObjectKind::DatumEnsemble,
            Def::CoordinateSystem(_) => ObjectKind::CoordinateSystem,
            Def::Crs(d) => match d.kind {
                CrsKind::Geographic2D => ObjectKind::Geographic2DCrs,
                CrsKind::Geographic3D => ObjectKind::Geographic3DCrs,
                CrsKind::Geocentric => ObjectKind::GeocentricCrs,
                CrsKind::Vertical => ObjectKind::VerticalCrs,
                CrsKind::Projected => ObjectKind::ProjectedCrs,
                CrsKind::Compound => ObjectKind::CompoundCrs,
                CrsKind::Bound => ObjectKind::BoundCrs,
                CrsKind::Temporal => ObjectKind::TemporalCrs,
                CrsKind::Engineering => ObjectKind::EngineeringCrs,
                CrsKind::Other => ObjectKind::OtherCrs,
            },
            Def::Operation(d) => match d.kind {
                OperationKind::Conversion => ObjectKind::Conversion,
                OperationKind::Transformation => ObjectKind::Transformation,
                OperationKind::Concatenated => ObjectKind::ConcatenatedOperation,
                OperationKind::Other => ObjectKind::OtherCoordinateOperation,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Leaf objects

#[derive(Clone, Debug)]
pub(crate) struct EllipsoidDef {
    pub info: ObjectInfo,
    /// Semi-major axis in metres.
    pub semi_major: f64,
    /// Inverse flattening; 0 means a sphere.
    pub inverse_flattening: f64,
}

impl EllipsoidDef {
    pub fn new(name: &str, semi_major: f64, inverse_flattening: f64) -> Self {
        EllipsoidDef {
            info: ObjectInfo::named(name),
            semi_major,
            inverse_flattening,
        }
    }

    pub fn flattening(&self) -> f64 {
        if self.inverse_flattening == 0.0 {
            0.0
        } else {
            1.0 / self.inverse_flattening
        }
    }

    pub fn semi_minor(&self) -> f64 {
        self.semi_major * (1.0 - self.flattening())
    }

    pub fn is_sphere(&self) -> bool {
        self.inverse_flattening == 0.0
    }

    /// The precomputed form used by projection math.
    pub fn shape(&self) -> crate::proj::ellipsoid::Ellipsoid {
        crate::proj::ellipsoid::Ellipsoid::new(self.semi_major, self.flattening())
    }

    pub fn wgs84() -> Self {
        let mut e = EllipsoidDef::new("WGS 84", 6_378_137.0, 298.257_223_563);
        e.info = e.info.with_id("EPSG", 7030);
        e
    }

    pub fn grs80() -> Self {
        let mut e = EllipsoidDef::new("GRS 1980", 6_378_137.0, 298.257_222_101);
        e.info = e.info.with_id("EPSG", 7019);
        e
    }

    /// Ellipsoid by PROJ short name (`ellps=` values).
    pub fn from_short_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "wgs84" => Some(EllipsoidDef::wgs84()),
            "grs80" => Some(EllipsoidDef::grs80()),
            "intl" => Some(EllipsoidDef::new("International 1924", 6_378_388.0, 297.0)),
            "clrk66" => Some(EllipsoidDef::new("Clarke 1866", 6_378_206.4, 294.978_698_213_898)),
            "clrk80" => Some(EllipsoidDef::new("Clarke 1880 (RGS)", 6_378_249.145, 293.465)),
            "bessel" => Some(EllipsoidDef::new("Bessel 1841", 6_377_397.155, 299.152_812_8)),
            "krass" => Some(EllipsoidDef::new("Krassowsky 1940", 6_378_245.0, 298.3)),
            "airy" => Some(EllipsoidDef::new("Airy 1830", 6_377_563.396, 299.324_964_6)),
            "sphere" => Some(EllipsoidDef::new("Normal Sphere", 6_370_997.0, 0.0)),
            _ => None,
        }
    }

    /// Reverse mapping for PROJ-string output.
    pub fn short_name(&self) -> Option<&'static str> {
        for short in ["WGS84", "GRS80", "intl", "clrk66", "clrk80", "bessel", "krass", "airy"] {
            if let Some(known) = EllipsoidDef::from_short_name(short) {
                if (known.semi_major - self.semi_major).abs() < 1e-6
                    && (known.inverse_flattening - self.inverse_flattening).abs() < 1e-9
                {
                    return Some(match short {
                        "WGS84" => "WGS84",
                        "GRS80" => "GRS80",
                        "intl" => "intl",
                        "clrk66" => "clrk66",
                        "clrk80" => "clrk80",
                        "bessel" => "bessel",
                        "krass" => "krass",
                        _ => "airy",
                    });
                }
            }
        }
        None
    }
}

#[derive(Clone, Debug)]
pub(crate) struct PrimeMeridianDef {
    pub info: ObjectInfo,
    /// Longitude from the reference meridian, in degrees.
    pub longitude: f64,
}

impl PrimeMeridianDef {
    pub fn greenwich() -> Self {
        PrimeMeridianDef {
            info: ObjectInfo::named("Greenwich").with_id("EPSG", 8901),
            longitude: 0.0,
        }
    }

    pub fn from_short_name(name: &str) -> Option<Self> {
        let (title, lon) = match name.to_ascii_lowercase().as_str() {
            "greenwich" => ("Greenwich", 0.0),
            "paris" => ("Paris", 2.337_229_166_666_67),
            "lisbon" => ("Lisbon", -9.131_906_111_111_11),
            "rome" => ("Rome", 12.452_333_333_333_33),
            "oslo" => ("Oslo", 10.722_916_666_666_67),
            _ => return None,
        };
        Some(PrimeMeridianDef {
            info: ObjectInfo::named(title),
            longitude: lon,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatumKind {
    Geodetic,
    DynamicGeodetic,
    Vertical,
    DynamicVertical,
    Temporal,
    Engineering,
    Parametric,
}

#[derive(Clone, Debug)]
pub(crate) struct DatumDef {
    pub info: ObjectInfo,
    pub kind: DatumKind,
    pub ellipsoid: Option<EllipsoidDef>,
    pub prime_meridian: Option<PrimeMeridianDef>,
    /// Declared Helmert parameters towards WGS 84: 3 (dx dy dz) or
    /// 7 (dx dy dz rx ry rz s) values.
    pub to_wgs84: Option<Vec<f64>>,
}

impl DatumDef {
    pub fn geodetic(name: &str, ellipsoid: EllipsoidDef) -> Self {
        DatumDef {
            info: ObjectInfo::named(name),
            kind: DatumKind::Geodetic,
            ellipsoid: Some(ellipsoid),
            prime_meridian: Some(PrimeMeridianDef::greenwich()),
            to_wgs84: None,
        }
    }

    pub fn wgs84() -> Self {
        let mut d = DatumDef::geodetic("World Geodetic System 1984", EllipsoidDef::wgs84());
        d.info = d.info.with_id("EPSG", 6326);
        d.to_wgs84 = Some(vec![0.0, 0.0, 0.0]);
        d
    }

    /// Datum by PROJ short name (`datum=` values).
    pub fn from_short_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "wgs84" => Some(DatumDef::wgs84()),
            "nad83" => {
                let mut d = DatumDef::geodetic("North American Datum 1983", EllipsoidDef::grs80());
                d.info = d.info.with_id("EPSG", 6269);
                d.to_wgs84 = Some(vec![0.0, 0.0, 0.0]);
                Some(d)
            }
            "nad27" => {
                let mut d = DatumDef::geodetic(
                    "North American Datum 1927",
                    EllipsoidDef::from_short_name("clrk66")?,
                );
                d.info = d.info.with_id("EPSG", 6267);
                Some(d)
            }
            "potsdam" => {
                let mut d = DatumDef::geodetic(
                    "Deutsches Hauptdreiecksnetz",
                    EllipsoidDef::from_short_name("bessel")?,
                );
                d.to_wgs84 = Some(vec![598.1, 73.7, 418.2, 0.202, 0.045, -2.455, 6.7]);
                Some(d)
            }
            _ => None,
        }
    }

    pub fn short_name(&self) -> Option<&'static str> {
        let n = equivalence::normalize_name(&self.info.name);
        match n.as_str() {
            "wgs1984" | "wgs84" | "worldgeodeticsystem1984" => Some("WGS84"),
            "northamericandatum1983" | "nad83" => Some("NAD83"),
            "northamericandatum1927" | "nad27" => Some("NAD27"),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct DatumEnsembleDef {
    pub info: ObjectInfo,
    pub members: Vec<DatumDef>,
    /// Positional accuracy of treating the members as one frame, metres.
    pub accuracy: f64,
}

/// A CRS references either a single datum or an ensemble of realizations.
#[derive(Clone, Debug)]
pub(crate) enum DatumOrEnsemble {
    Datum(DatumDef),
    Ensemble(DatumEnsembleDef),
}

impl DatumOrEnsemble {
    /// A concrete datum standing for this reference frame: the datum itself,
    /// or a datum synthesized from the ensemble (its name, the first
    /// member's geometry).
    pub fn forced_datum(&self) -> DatumDef {
        match self {
            DatumOrEnsemble::Datum(d) => d.clone(),
            DatumOrEnsemble::Ensemble(e) => {
                let mut d = e
                    .members
                    .first()
                    .cloned()
                    .unwrap_or_else(|| DatumDef::wgs84());
                d.info.name = e.info.name.clone();
                d
            }
        }
    }

    pub fn info(&self) -> &ObjectInfo {
        match self {
            DatumOrEnsemble::Datum(d) => &d.info,
            DatumOrEnsemble::Ensemble(e) => &e.info,
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinate systems

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsKind {
    Ellipsoidal,
    Cartesian,
    Vertical,
    Spherical,
    Temporal,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisDirection {
    North,
    South,
    East,
    West,
    Up,
    Down,
    GeocentricX,
    GeocentricY,
    GeocentricZ,
    Future,
    Unspecified,
}

impl AxisDirection {
    pub fn as_wkt(&self) -> &'static str {
        match self {
            AxisDirection::North => "north",
            AxisDirection::South => "south",
            AxisDirection::East => "east",
            AxisDirection::West => "west",
            AxisDirection::Up => "up",
            AxisDirection::Down => "down",
            AxisDirection::GeocentricX => "geocentricX",
            AxisDirection::GeocentricY => "geocentricY",
            AxisDirection::GeocentricZ => "geocentricZ",
            AxisDirection::Future => "future",
            AxisDirection::Unspecified => "unspecified",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_lowercase().as_str() {
            "north" => AxisDirection::North,
            "south" => AxisDirection::South,
            "east" => AxisDirection::East,
            "west" => AxisDirection::West,
            "up" => AxisDirection::Up,
            "down" => AxisDirection::Down,
            "geocentricx" | "other" => AxisDirection::GeocentricX,
            "geocentricy" => AxisDirection::GeocentricY,
            "geocentricz" => AxisDirection::GeocentricZ,
            "future" => AxisDirection::Future,
            "unspecified" => AxisDirection::Unspecified,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitKind {
    Angular,
    Linear,
    Scale,
    Time,
    Unknown,
}

/// A unit of measure with its factor to the base unit of its kind
/// (radians, metres, unity, seconds).
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct UnitDef {
    pub name: String,
    pub kind: UnitKind,
    pub factor: f64,
}

pub(crate) const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

impl UnitDef {
    pub fn degree() -> Self {
        UnitDef {
            name: "degree".into(),
            kind: UnitKind::Angular,
            factor: DEG_TO_RAD,
        }
    }

    pub fn radian() -> Self {
        UnitDef {
            name: "radian".into(),
            kind: UnitKind::Angular,
            factor: 1.0,
        }
    }

    pub fn metre() -> Self {
        UnitDef {
            name: "metre".into(),
            kind: UnitKind::Linear,
            factor: 1.0,
        }
    }

    pub fn unity() -> Self {
        UnitDef {
            name: "unity".into(),
            kind: UnitKind::Scale,
            factor: 1.0,
        }
    }

    pub fn linear(name: &str, to_metre: f64) -> Self {
        UnitDef {
            name: name.into(),
            kind: UnitKind::Linear,
            factor: to_metre,
        }
    }

    /// Linear unit by PROJ short name (`units=` values).
    pub fn from_linear_short_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "m" => Some(UnitDef::metre()),
            "ft" => Some(UnitDef::linear("foot", 0.3048)),
            "us-ft" => Some(UnitDef::linear("US survey foot", 1200.0 / 3937.0)),
            "km" => Some(UnitDef::linear("kilometre", 1000.0)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct AxisDef {
    pub name: String,
    pub abbreviation: String,
    pub direction: AxisDirection,
    pub unit: UnitDef,
}

impl AxisDef {
    pub fn new(name: &str, abbreviation: &str, direction: AxisDirection, unit: UnitDef) -> Self {
        AxisDef {
            name: name.into(),
            abbreviation: abbreviation.into(),
            direction,
            unit,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct CsDef {
    pub kind: CsKind,
    pub axes: Vec<AxisDef>,
}

impl CsDef {
    /// Ellipsoidal 2D in EPSG order: latitude, longitude (degrees).
    pub fn ellipsoidal_2d() -> Self {
        CsDef {
            kind: CsKind::Ellipsoidal,
            axes: vec![
                AxisDef::new("Geodetic latitude", "Lat", AxisDirection::North, UnitDef::degree()),
                AxisDef::new("Geodetic longitude", "Lon", AxisDirection::East, UnitDef::degree()),
            ],
        }
    }

    /// Ellipsoidal 2D in GIS-friendly order: longitude, latitude.
    pub fn ellipsoidal_2d_lon_lat() -> Self {
        CsDef {
            kind: CsKind::Ellipsoidal,
            axes: vec![
                AxisDef::new("Geodetic longitude", "Lon", AxisDirection::East, UnitDef::degree()),
                AxisDef::new("Geodetic latitude", "Lat", AxisDirection::North, UnitDef::degree()),
            ],
        }
    }

    pub fn ellipsoidal_3d() -> Self {
        let mut cs = CsDef::ellipsoidal_2d();
        cs.axes.push(AxisDef::new(
            "Ellipsoidal height",
            "h",
            AxisDirection::Up,
            UnitDef::metre(),
        ));
        cs
    }

    /// Cartesian easting/northing in metres.
    pub fn cartesian_east_north() -> Self {
        CsDef {
            kind: CsKind::Cartesian,
            axes: vec![
                AxisDef::new("Easting", "E", AxisDirection::East, UnitDef::metre()),
                AxisDef::new("Northing", "N", AxisDirection::North, UnitDef::metre()),
            ],
        }
    }

    pub fn geocentric() -> Self {
        CsDef {
            kind: CsKind::Cartesian,
            axes: vec![
                AxisDef::new("Geocentric X", "X", AxisDirection::GeocentricX, UnitDef::metre()),
                AxisDef::new("Geocentric Y", "Y", AxisDirection::GeocentricY, UnitDef::metre()),
                AxisDef::new("Geocentric Z", "Z", AxisDirection::GeocentricZ, UnitDef::metre()),
            ],
        }
    }

    pub fn vertical_up() -> Self {
        CsDef {
            kind: CsKind::Vertical,
            axes: vec![AxisDef::new(
                "Gravity-related height",
                "H",
                AxisDirection::Up,
                UnitDef::metre(),
            )],
        }
    }

    pub fn dimension(&self) -> usize {
        self.axes.len()
    }
}

// ---------------------------------------------------------------------------
// CRS

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrsKind {
    Geographic2D,
    Geographic3D,
    Geocentric,
    Vertical,
    Projected,
    Compound,
    Bound,
    Temporal,
    Engineering,
    Other,
}

#[derive(Clone, Debug)]
pub(crate) struct MethodDef {
    pub name: String,
    /// EPSG method code when known (e.g. 9807 for Transverse Mercator).
    pub code: Option<u32>,
}

impl MethodDef {
    pub fn new(name: &str, code: Option<u32>) -> Self {
        MethodDef {
            name: name.into(),
            code,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ParamDef {
    pub name: String,
    pub value: f64,
    pub unit: UnitDef,
}

impl ParamDef {
    pub fn angular(name: &str, degrees: f64) -> Self {
        ParamDef {
            name: name.into(),
            value: degrees,
            unit: UnitDef::degree(),
        }
    }

    pub fn linear(name: &str, metres: f64) -> Self {
        ParamDef {
            name: name.into(),
            value: metres,
            unit: UnitDef::metre(),
        }
    }

    pub fn scale(name: &str, value: f64) -> Self {
        ParamDef {
            name: name.into(),
            value,
            unit: UnitDef::unity(),
        }
    }

    /// Value converted to the base unit of the parameter's unit kind
    /// (radians for angles, metres for lengths).
    pub fn base_value(&self) -> f64 {
        self.value * self.unit.factor
    }
}

/// A map projection (or other derived-CRS conversion).
#[derive(Clone, Debug)]
pub(crate) struct ConversionDef {
    pub info: ObjectInfo,
    pub method: MethodDef,
    pub params: Vec<ParamDef>,
}

impl ConversionDef {
    /// Look a parameter up under any of several names, in base units.
    pub fn param(&self, names: &[&str]) -> Option<f64> {
        let wanted: Vec<String> = names.iter().map(|n| equivalence::normalize_name(n)).collect();
        self.params
            .iter()
            .find(|p| wanted.contains(&equivalence::normalize_name(&p.name)))
            .map(|p| p.base_value())
    }
}

#[derive(Clone, Debug)]
pub(crate) struct CrsDef {
    pub info: ObjectInfo,
    pub kind: CrsKind,
    pub datum: Option<DatumOrEnsemble>,
    pub cs: CsDef,
    /// Base CRS of a projected or bound CRS.
    pub base: Option<Box<CrsDef>>,
    /// Hub CRS of a bound CRS.
    pub hub: Option<Box<CrsDef>>,
    /// Projection of a projected CRS.
    pub conversion: Option<ConversionDef>,
    /// Transformation of a bound CRS towards its hub.
    pub bound_transform: Option<Box<OperationDef>>,
    /// Components of a compound CRS.
    pub components: Vec<CrsDef>,
}

impl CrsDef {
    pub fn new(info: ObjectInfo, kind: CrsKind, datum: Option<DatumOrEnsemble>, cs: CsDef) -> Self {
        CrsDef {
            info,
            kind,
            datum,
            cs,
            base: None,
            hub: None,
            conversion: None,
            bound_transform: None,
            components: Vec::new(),
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self.kind, CrsKind::Geographic2D | CrsKind::Geographic3D)
    }

    /// The geodetic CRS this one is built on: itself for geographic and
    /// geocentric CRS, the base for projected/bound, the horizontal
    /// component for compound. None for vertical/temporal/engineering.
    pub fn geodetic_crs(&self) -> Option<&CrsDef> {
        match self.kind {
            CrsKind::Geographic2D | CrsKind::Geographic3D | CrsKind::Geocentric => Some(self),
            CrsKind::Projected | CrsKind::Bound => {
                self.base.as_deref().and_then(|b| b.geodetic_crs())
            }
            CrsKind::Compound => self.components.iter().find_map(|c| c.geodetic_crs()),
            _ => None,
        }
    }

    /// The datum (or ensemble) governing horizontal position.
    pub fn horizontal_datum(&self) -> Option<&DatumOrEnsemble> {
        self.geodetic_crs().and_then(|g| g.datum.as_ref())
    }

    pub fn ellipsoid(&self) -> Option<&EllipsoidDef> {
        match self.horizontal_datum()? {
            DatumOrEnsemble::Datum(d) => d.ellipsoid.as_ref(),
            DatumOrEnsemble::Ensemble(e) => e.members.first().and_then(|m| m.ellipsoid.as_ref()),
        }
    }

    pub fn prime_meridian(&self) -> Option<&PrimeMeridianDef> {
        match self.horizontal_datum()? {
            DatumOrEnsemble::Datum(d) => d.prime_meridian.as_ref(),
            DatumOrEnsemble::Ensemble(e) => {
                e.members.first().and_then(|m| m.prime_meridian.as_ref())
            }
        }
    }

    /// Geographic WGS 84, latitude/longitude order (EPSG:4326 shape).
    pub fn wgs84_2d() -> Self {
        let mut info = ObjectInfo::named("WGS 84").with_id("EPSG", 4326);
        info.usage_area = Some(UsageArea::world());
        info.scope = Some("Horizontal component of 3D system.".into());
        CrsDef::new(
            info,
            CrsKind::Geographic2D,
            Some(DatumOrEnsemble::Datum(DatumDef::wgs84())),
            CsDef::ellipsoidal_2d(),
        )
    }
}

// ---------------------------------------------------------------------------
// Operations

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Conversion,
    Transformation,
    Concatenated,
    Other,
}

#[derive(Clone, Debug)]
pub(crate) struct OperationDef {
    pub info: ObjectInfo,
    pub kind: OperationKind,
    pub source: Option<Box<CrsDef>>,
    pub target: Option<Box<CrsDef>>,
    pub method: Option<MethodDef>,
    pub params: Vec<ParamDef>,
    /// Declared positional accuracy in metres; None = unknown.
    pub accuracy: Option<f64>,
    /// Component steps of a concatenated operation.
    pub steps: Vec<OperationDef>,
}

impl OperationDef {
    pub fn transformation(name: &str) -> Self {
        OperationDef {
            info: ObjectInfo::named(name),
            kind: OperationKind::Transformation,
            source: None,
            target: None,
            method: None,
            params: Vec::new(),
            accuracy: None,
            steps: Vec::new(),
        }
    }

    /// Helmert parameter vector (3 or 7 values) when this operation is a
    /// position-vector style geocentric transformation.
    pub fn helmert_values(&self) -> Option<Vec<f64>> {
        let names3 = ["X-axis translation", "Y-axis translation", "Z-axis translation"];
        let names_rot = ["X-axis rotation", "Y-axis rotation", "Z-axis rotation"];
        let mut out = Vec::new();
        for n in names3 {
            out.push(self.find_param(n)?);
        }
        let rots: Vec<Option<f64>> = names_rot.iter().map(|n| self.find_param(n)).collect();
        if rots.iter().all(|r| r.is_some()) {
            for r in rots {
                out.push(r.unwrap_or(0.0));
            }
            out.push(self.find_param("Scale difference").unwrap_or(0.0));
        }
        Some(out)
    }

    fn find_param(&self, name: &str) -> Option<f64> {
        let wanted = equivalence::normalize_name(name);
        self.params
            .iter()
            .find(|p| equivalence::normalize_name(&p.name) == wanted)
            .map(|p| p.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipsoid_derived_quantities() {
        let e = EllipsoidDef::wgs84();
        assert!((e.semi_minor() - 6_356_752.314_245).abs() < 1e-3);
        assert!(!e.is_sphere());
        assert!(EllipsoidDef::new("Normal Sphere", 6_370_997.0, 0.0).is_sphere());
    }

    #[test]
    fn test_short_name_round_trip() {
        let e = EllipsoidDef::from_short_name("intl").unwrap();
        assert_eq!(e.short_name(), Some("intl"));
        assert_eq!(DatumDef::wgs84().short_name(), Some("WGS84"));
    }

    #[test]
    fn test_geodetic_crs_of_projected() {
        let mut projected = CrsDef::new(
            ObjectInfo::named("test"),
            CrsKind::Projected,
            None,
            CsDef::cartesian_east_north(),
        );
        projected.base = Some(Box::new(CrsDef::wgs84_2d()));
        let geodetic = projected.geodetic_crs().unwrap();
        assert_eq!(geodetic.kind, CrsKind::Geographic2D);
        assert_eq!(projected.ellipsoid().unwrap().semi_major, 6_378_137.0);
    }

    #[test]
    fn test_forced_datum_from_ensemble() {
        let ensemble = DatumOrEnsemble::Ensemble(DatumEnsembleDef {
            info: ObjectInfo::named("World Geodetic System 1984 ensemble"),
            members: vec![DatumDef::wgs84()],
            accuracy: 2.0,
        });
        let forced = ensemble.forced_datum();
        assert_eq!(forced.info.name, "World Geodetic System 1984 ensemble");
        assert!(forced.ellipsoid.is_some());
    }

    #[test]
    fn test_conversion_param_lookup() {
        let conv = ConversionDef {
            info: ObjectInfo::named("UTM zone 33N"),
            method: MethodDef::new("Transverse Mercator", Some(9807)),
            params: vec![
                ParamDef::angular("Longitude of natural origin", 15.0),
                ParamDef::scale("Scale factor at natural origin", 0.9996),
            ],
        };
        let lon0 = conv.param(&["Longitude of natural origin", "central_meridian"]);
        assert!((lon0.unwrap() - 15f64.to_radians()).abs() < 1e-12);
        assert_eq!(conv.param(&["False easting"]), None);
    }
}

//! WKT export for every supported revision and flavor.

use crate::error::Error;
use crate::model::equivalence::normalize_name;
use crate::model::{
    ConversionDef, CrsDef, CrsKind, CsKind, DatumDef, DatumEnsembleDef, DatumOrEnsemble, Def,
    EllipsoidDef, ObjectInfo, OperationDef, PrimeMeridianDef, UnitDef, UnitKind,
};
use crate::object::{WktOptions, WktVariant};

use super::{Node, Value};

pub(crate) fn write_def(def: &Def, options: &WktOptions) -> Result<Option<String>, Error> {
    let w = Writer {
        options: options.clone(),
    };
    let node = match def {
        Def::Placeholder | Def::CoordinateSystem(_) => return Ok(None),
        Def::Crs(crs) => {
            if w.wkt1() {
                match w.wkt1_crs(crs)? {
                    Some(n) => n,
                    None => return Ok(None),
                }
            } else {
                w.wkt2_crs(crs)?
            }
        }
        Def::Ellipsoid(e) => {
            if w.wkt1() {
                w.wkt1_spheroid(e)
            } else {
                w.wkt2_ellipsoid(e)
            }
        }
        Def::PrimeMeridian(pm) => w.primem(pm, !w.wkt1()),
        Def::Datum(d) => {
            if w.wkt1() {
                w.wkt1_datum(d)
            } else {
                w.wkt2_datum(d)
            }
        }
        Def::DatumEnsemble(e) => {
            if w.wkt1() {
                if w.options.strict {
                    return Err(Error::InvalidParameter(
                        "datum ensembles cannot be written as WKT1".into(),
                    ));
                }
                w.wkt1_datum(&DatumOrEnsemble::Ensemble(e.clone()).forced_datum())
            } else {
                w.wkt2_ensemble(e)
            }
        }
        Def::Operation(op) => {
            if w.wkt1() {
                if w.options.strict {
                    return Err(Error::InvalidParameter(
                        "coordinate operations cannot be written as WKT1".into(),
                    ));
                }
                return Ok(None);
            }
            w.wkt2_operation(op)?
        }
    };
    Ok(Some(render(&node, options)))
}

struct Writer {
    options: WktOptions,
}

impl Writer {
    fn wkt1(&self) -> bool {
        matches!(
            self.options.variant,
            WktVariant::Wkt1Gdal | WktVariant::Wkt1Esri
        )
    }

    fn esri(&self) -> bool {
        self.options.variant == WktVariant::Wkt1Esri
    }

    fn simplified(&self) -> bool {
        matches!(
            self.options.variant,
            WktVariant::Wkt2_2015Simplified | WktVariant::Wkt2_2019Simplified
        )
    }

    fn wkt2_2019(&self) -> bool {
        matches!(
            self.options.variant,
            WktVariant::Wkt2_2019 | WktVariant::Wkt2_2019Simplified
        )
    }

    // -- shared pieces ------------------------------------------------------

    fn deg_unit(&self) -> Node {
        Node::new("ANGLEUNIT")
            .push_text("degree")
            .push_number(0.0174532925199433)
    }

    fn unit_node(&self, unit: &UnitDef) -> Node {
        let keyword = match unit.kind {
            UnitKind::Angular => "ANGLEUNIT",
            UnitKind::Linear => "LENGTHUNIT",
            UnitKind::Scale => "SCALEUNIT",
            UnitKind::Time => "TIMEUNIT",
            UnitKind::Unknown => "UNIT",
        };
        Node::new(keyword)
            .push_text(&unit.name)
            .push_number(unit.factor)
    }

    fn ids(&self, info: &ObjectInfo, node: Node) -> Node {
        let mut node = node;
        for id in &info.identifiers {
            let mut id_node = Node::new(if self.wkt1() { "AUTHORITY" } else { "ID" })
                .push_text(id.authority());
            if self.wkt1() {
                id_node = id_node.push_text(id.code());
            } else if let Ok(code) = id.code().parse::<f64>() {
                id_node = id_node.push_number(code);
            } else {
                id_node = id_node.push_text(id.code());
            }
            node = node.push_node(id_node);
        }
        node
    }

    fn usage(&self, info: &ObjectInfo, node: Node) -> Node {
        if self.wkt1() || self.simplified() {
            return node;
        }
        let mut pieces = Vec::new();
        if let Some(scope) = &info.scope {
            pieces.push(Node::new("SCOPE").push_text(scope));
        }
        if let Some(area) = &info.usage_area {
            if !area.name.is_empty() {
                pieces.push(Node::new("AREA").push_text(&area.name));
            }
            pieces.push(
                Node::new("BBOX")
                    .push_number(area.south)
                    .push_number(area.west)
                    .push_number(area.north)
                    .push_number(area.east),
            );
        }
        if pieces.is_empty() {
            return node;
        }
        let mut node = node;
        if self.wkt2_2019() {
            let mut usage = Node::new("USAGE");
            if info.scope.is_none() {
                // USAGE requires a scope in 2019.
                usage = usage.push_node(Node::new("SCOPE").push_text("unknown"));
            }
            for p in pieces {
                usage = usage.push_node(p);
            }
            node = node.push_node(usage);
        } else {
            for p in pieces {
                node = node.push_node(p);
            }
        }
        node
    }

    fn primem(&self, pm: &PrimeMeridianDef, with_unit: bool) -> Node {
        let mut node = Node::new("PRIMEM")
            .push_text(self.mangle(&pm.info.name))
            .push_number(pm.longitude);
        if with_unit && !self.simplified() {
            node = node.push_node(self.deg_unit());
        }
        self.ids(&pm.info, node)
    }

    // -- WKT2 ---------------------------------------------------------------

    fn wkt2_ellipsoid(&self, e: &EllipsoidDef) -> Node {
        let mut node = Node::new("ELLIPSOID")
            .push_text(&e.info.name)
            .push_number(e.semi_major)
            .push_number(e.inverse_flattening);
        if !self.simplified() {
            node = node.push_node(self.unit_node(&UnitDef::metre()));
        }
        self.ids(&e.info, node)
    }

    fn wkt2_datum(&self, d: &DatumDef) -> Node {
        let mut node = Node::new("DATUM").push_text(&d.info.name);
        if let Some(e) = &d.ellipsoid {
            node = node.push_node(self.wkt2_ellipsoid(e));
        }
        self.ids(&d.info, node)
    }

    fn wkt2_ensemble(&self, e: &DatumEnsembleDef) -> Node {
        if !self.wkt2_2019() {
            // 2015 has no ensemble construct.
            return self.wkt2_datum(&DatumOrEnsemble::Ensemble(e.clone()).forced_datum());
        }
        let mut node = Node::new("ENSEMBLE").push_text(&e.info.name);
        for m in &e.members {
            node = node.push_node(self.ids(&m.info, Node::new("MEMBER").push_text(&m.info.name)));
        }
        if let Some(ellipsoid) = e.members.first().and_then(|m| m.ellipsoid.as_ref()) {
            node = node.push_node(self.wkt2_ellipsoid(ellipsoid));
        }
        node = node.push_node(Node::new("ENSEMBLEACCURACY").push_number(e.accuracy));
        self.ids(&e.info, node)
    }

    fn wkt2_cs(&self, crs: &CrsDef, mut node: Node) -> Node {
        let kind_word = match crs.cs.kind {
            CsKind::Ellipsoidal => "ellipsoidal",
            CsKind::Cartesian => "Cartesian",
            CsKind::Vertical => "vertical",
            CsKind::Spherical => "spherical",
            CsKind::Temporal => "temporal",
            CsKind::Other => "ordinal",
        };
        node = node.push_node(
            Node::new("CS")
                .push_word(kind_word)
                .push_number(crs.cs.dimension() as f64),
        );
        let uniform_unit = crs
            .cs
            .axes
            .split_first()
            .filter(|(first, rest)| rest.iter().all(|a| a.unit == first.unit))
            .map(|(first, _)| first.unit.clone());
        for (i, axis) in crs.cs.axes.iter().enumerate() {
            let label = if axis.name.is_empty() {
                format!("({})", axis.abbreviation)
            } else if axis.abbreviation.is_empty() {
                axis.name.clone()
            } else {
                format!("{} ({})", axis.name, axis.abbreviation)
            };
            let mut a = Node::new("AXIS")
                .push_text(label)
                .push_word(axis.direction.as_wkt());
            if !self.simplified() {
                a = a.push_node(Node::new("ORDER").push_number((i + 1) as f64));
                if uniform_unit.is_none() {
                    a = a.push_node(self.unit_node(&axis.unit));
                }
            }
            node = node.push_node(a);
        }
        if let Some(unit) = uniform_unit {
            node = node.push_node(self.unit_node(&unit));
        }
        node
    }

    fn wkt2_geodetic_body(&self, crs: &CrsDef, mut node: Node) -> Node {
        match &crs.datum {
            Some(DatumOrEnsemble::Ensemble(e)) => {
                node = node.push_node(self.wkt2_ensemble(e));
            }
            Some(DatumOrEnsemble::Datum(d)) => {
                node = node.push_node(self.wkt2_datum(d));
            }
            None => {}
        }
        let pm = crs.prime_meridian().cloned().unwrap_or_else(PrimeMeridianDef::greenwich);
        if pm.longitude != 0.0 || !self.simplified() {
            node = node.push_node(self.primem(&pm, true));
        }
        node
    }

    fn wkt2_conversion(&self, conv: &ConversionDef) -> Node {
        let mut method = Node::new("METHOD").push_text(&conv.method.name);
        if let Some(code) = conv.method.code {
            method = method.push_node(Node::new("ID").push_text("EPSG").push_number(code as f64));
        }
        let mut node = Node::new("CONVERSION")
            .push_text(&conv.info.name)
            .push_node(method);
        for p in &conv.params {
            let mut pn = Node::new("PARAMETER")
                .push_text(&p.name)
                .push_number(p.value);
            if !self.simplified() {
                pn = pn.push_node(self.unit_node(&p.unit));
            }
            node = node.push_node(pn);
        }
        self.ids(&conv.info, node)
    }

    fn wkt2_crs(&self, crs: &CrsDef) -> Result<Node, Error> {
        let node = match crs.kind {
            CrsKind::Geographic2D | CrsKind::Geographic3D => {
                let keyword = if self.wkt2_2019() { "GEOGCRS" } else { "GEODCRS" };
                let node = Node::new(keyword).push_text(&crs.info.name);
                self.wkt2_geodetic_body(crs, node)
            }
            CrsKind::Geocentric => {
                let node = Node::new("GEODCRS").push_text(&crs.info.name);
                self.wkt2_geodetic_body(crs, node)
            }
            CrsKind::Projected => {
                let base = crs
                    .base
                    .as_deref()
                    .ok_or_else(|| Error::InvalidParameter("projected CRS without a base".into()))?;
                let base_kw = if self.wkt2_2019() { "BASEGEOGCRS" } else { "BASEGEODCRS" };
                let base_node =
                    self.wkt2_geodetic_body(base, Node::new(base_kw).push_text(&base.info.name));
                let mut node = Node::new("PROJCRS")
                    .push_text(&crs.info.name)
                    .push_node(base_node);
                if let Some(conv) = &crs.conversion {
                    node = node.push_node(self.wkt2_conversion(conv));
                }
                node
            }
            CrsKind::Vertical => {
                let mut node = Node::new("VERTCRS").push_text(&crs.info.name);
                if let Some(DatumOrEnsemble::Datum(d)) = &crs.datum {
                    node = node
                        .push_node(self.ids(&d.info, Node::new("VDATUM").push_text(&d.info.name)));
                }
                node
            }
            CrsKind::Compound => {
                let mut node = Node::new("COMPOUNDCRS").push_text(&crs.info.name);
                for c in &crs.components {
                    node = node.push_node(self.wkt2_crs(c)?);
                }
                return Ok(self.ids(&crs.info, self.usage(&crs.info, node)));
            }
            CrsKind::Bound => {
                let base = crs
                    .base
                    .as_deref()
                    .ok_or_else(|| Error::InvalidParameter("bound CRS without a source".into()))?;
                let hub = crs
                    .hub
                    .as_deref()
                    .ok_or_else(|| Error::InvalidParameter("bound CRS without a hub".into()))?;
                let mut node = Node::new("BOUNDCRS")
                    .push_node(Node::new("SOURCECRS").push_node(self.wkt2_crs(base)?))
                    .push_node(Node::new("TARGETCRS").push_node(self.wkt2_crs(hub)?));
                if let Some(tr) = &crs.bound_transform {
                    node = node.push_node(self.wkt2_operation_body(
                        tr,
                        Node::new("ABRIDGEDTRANSFORMATION").push_text(&tr.info.name),
                        false,
                    ));
                }
                return Ok(node);
            }
            CrsKind::Temporal | CrsKind::Engineering | CrsKind::Other => {
                let keyword = match crs.kind {
                    CrsKind::Temporal => "TIMECRS",
                    CrsKind::Engineering => "ENGCRS",
                    _ => "GEODCRS",
                };
                Node::new(keyword).push_text(&crs.info.name)
            }
        };
        let node = self.wkt2_cs(crs, node);
        Ok(self.ids(&crs.info, self.usage(&crs.info, node)))
    }

    fn wkt2_operation_body(&self, op: &OperationDef, mut node: Node, with_crs: bool) -> Node {
        if with_crs {
            if let Some(n) = op.source.as_deref().and_then(|c| self.wkt2_crs(c).ok()) {
                node = node.push_node(Node::new("SOURCECRS").push_node(n));
            }
            if let Some(n) = op.target.as_deref().and_then(|c| self.wkt2_crs(c).ok()) {
                node = node.push_node(Node::new("TARGETCRS").push_node(n));
            }
        }
        if let Some(m) = &op.method {
            let mut mn = Node::new("METHOD").push_text(&m.name);
            if let Some(code) = m.code {
                mn = mn.push_node(Node::new("ID").push_text("EPSG").push_number(code as f64));
            }
            node = node.push_node(mn);
        }
        for p in &op.params {
            let mut pn = Node::new("PARAMETER")
                .push_text(&p.name)
                .push_number(p.value);
            if !self.simplified() && p.unit.kind != UnitKind::Unknown {
                pn = pn.push_node(self.unit_node(&p.unit));
            }
            node = node.push_node(pn);
        }
        if let Some(acc) = op.accuracy {
            node = node.push_node(Node::new("OPERATIONACCURACY").push_number(acc));
        }
        self.ids(&op.info, node)
    }

    fn wkt2_operation(&self, op: &OperationDef) -> Result<Node, Error> {
        let node = Node::new("COORDINATEOPERATION").push_text(&op.info.name);
        Ok(self.usage(&op.info, self.wkt2_operation_body(op, node, true)))
    }

    // -- WKT1 ---------------------------------------------------------------

    fn mangle(&self, name: &str) -> String {
        if !self.esri() {
            return name.to_string();
        }
        let mut out: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        while out.contains("__") {
            out = out.replace("__", "_");
        }
        out.trim_matches('_').to_string()
    }

    fn wkt1_spheroid(&self, e: &EllipsoidDef) -> Node {
        let node = Node::new("SPHEROID")
            .push_text(self.mangle(&e.info.name))
            .push_number(e.semi_major)
            .push_number(e.inverse_flattening);
        if self.esri() {
            node
        } else {
            self.ids(&e.info, node)
        }
    }

    fn wkt1_datum(&self, d: &DatumDef) -> Node {
        let name = if self.esri() {
            format!("D_{}", self.mangle(&d.info.name))
        } else {
            d.info.name.replace(' ', "_")
        };
        let mut node = Node::new("DATUM").push_text(name);
        if let Some(e) = &d.ellipsoid {
            node = node.push_node(self.wkt1_spheroid(e));
        }
        if !self.esri() {
            if let Some(tw) = &d.to_wgs84 {
                let mut t = Node::new("TOWGS84");
                for v in tw {
                    t = t.push_number(*v);
                }
                node = node.push_node(t);
            }
        }
        if self.esri() {
            node
        } else {
            self.ids(&d.info, node)
        }
    }

    fn write_axes(&self) -> bool {
        self.options.output_axis.unwrap_or(!self.esri())
    }

    fn wkt1_geogcs(&self, crs: &CrsDef) -> Result<Node, Error> {
        let name = if self.esri() {
            format!("GCS_{}", self.mangle(&crs.info.name))
        } else {
            crs.info.name.clone()
        };
        let datum = crs
            .horizontal_datum()
            .map(DatumOrEnsemble::forced_datum)
            .ok_or_else(|| Error::InvalidParameter("geographic CRS without a datum".into()))?;
        let pm = crs
            .prime_meridian()
            .cloned()
            .unwrap_or_else(PrimeMeridianDef::greenwich);
        let mut node = Node::new("GEOGCS")
            .push_text(name)
            .push_node(self.wkt1_datum(&datum))
            .push_node(self.primem(&pm, false))
            .push_node(
                Node::new("UNIT")
                    .push_text(if self.esri() { "Degree" } else { "degree" })
                    .push_number(0.0174532925199433),
            );
        if self.write_axes() {
            node = node
                .push_node(Node::new("AXIS").push_text("Latitude").push_word("NORTH"))
                .push_node(Node::new("AXIS").push_text("Longitude").push_word("EAST"));
        }
        if self.esri() {
            Ok(node)
        } else {
            Ok(self.ids(&crs.info, node))
        }
    }

    fn wkt1_crs(&self, crs: &CrsDef) -> Result<Option<Node>, Error> {
        match crs.kind {
            CrsKind::Geographic2D => Ok(Some(self.wkt1_geogcs(crs)?)),
            CrsKind::Geographic3D => {
                if self.options.allow_ellipsoidal_height_as_vertical_crs {
                    let mut flat = crs.clone();
                    flat.kind = CrsKind::Geographic2D;
                    flat.cs.axes.truncate(2);
                    let vert = Node::new("VERT_CS")
                        .push_text("Ellipsoid (metre)")
                        .push_node(Node::new("VERT_DATUM").push_text("Ellipsoid").push_number(2002.0))
                        .push_node(Node::new("UNIT").push_text("metre").push_number(1.0))
                        .push_node(Node::new("AXIS").push_text("Up").push_word("UP"));
                    Ok(Some(
                        Node::new("COMPD_CS")
                            .push_text(&crs.info.name)
                            .push_node(self.wkt1_geogcs(&flat)?)
                            .push_node(vert),
                    ))
                } else if self.options.strict {
                    Err(Error::InvalidParameter(
                        "a geographic 3D CRS cannot be written as WKT1".into(),
                    ))
                } else {
                    let mut flat = crs.clone();
                    flat.kind = CrsKind::Geographic2D;
                    flat.cs.axes.truncate(2);
                    Ok(Some(self.wkt1_geogcs(&flat)?))
                }
            }
            CrsKind::Geocentric => {
                let datum = crs
                    .horizontal_datum()
                    .map(DatumOrEnsemble::forced_datum)
                    .ok_or_else(|| {
                        Error::InvalidParameter("geocentric CRS without a datum".into())
                    })?;
                let node = Node::new("GEOCCS")
                    .push_text(self.mangle(&crs.info.name))
                    .push_node(self.wkt1_datum(&datum))
                    .push_node(self.primem(&PrimeMeridianDef::greenwich(), false))
                    .push_node(Node::new("UNIT").push_text("metre").push_number(1.0));
                Ok(Some(self.ids(&crs.info, node)))
            }
            CrsKind::Projected => {
                let base = crs
                    .base
                    .as_deref()
                    .ok_or_else(|| Error::InvalidParameter("projected CRS without a base".into()))?;
                let conv = crs.conversion.as_ref().ok_or_else(|| {
                    Error::InvalidParameter("projected CRS without a conversion".into())
                })?;
                let (method, params) = wkt1_projection(conv, self.esri()).ok_or_else(|| {
                    Error::InvalidParameter(format!(
                        "method {:?} has no WKT1 form",
                        conv.method.name
                    ))
                })?;
                let name = self.mangle(&crs.info.name);
                let mut node = Node::new("PROJCS")
                    .push_text(name)
                    .push_node(self.wkt1_geogcs(base)?)
                    .push_node(Node::new("PROJECTION").push_text(method));
                for (pname, value) in params {
                    node = node
                        .push_node(Node::new("PARAMETER").push_text(pname).push_number(value));
                }
                let unit = crs
                    .cs
                    .axes
                    .first()
                    .map(|a| a.unit.clone())
                    .unwrap_or_else(UnitDef::metre);
                node = node.push_node(
                    Node::new("UNIT")
                        .push_text(if self.esri() { "Meter" } else { unit.name.as_str() })
                        .push_number(unit.factor),
                );
                if self.write_axes() {
                    node = node
                        .push_node(Node::new("AXIS").push_text("Easting").push_word("EAST"))
                        .push_node(Node::new("AXIS").push_text("Northing").push_word("NORTH"));
                }
                if self.esri() {
                    Ok(Some(node))
                } else {
                    Ok(Some(self.ids(&crs.info, node)))
                }
            }
            CrsKind::Vertical => {
                let mut node = Node::new("VERT_CS").push_text(self.mangle(&crs.info.name));
                if let Some(DatumOrEnsemble::Datum(d)) = &crs.datum {
                    node = node.push_node(
                        Node::new("VERT_DATUM")
                            .push_text(self.mangle(&d.info.name))
                            .push_number(2005.0),
                    );
                }
                node = node.push_node(Node::new("UNIT").push_text("metre").push_number(1.0));
                Ok(Some(self.ids(&crs.info, node)))
            }
            CrsKind::Compound => {
                let mut node = Node::new("COMPD_CS").push_text(self.mangle(&crs.info.name));
                for c in &crs.components {
                    match self.wkt1_crs(c)? {
                        Some(n) => node = node.push_node(n),
                        None => {
                            return Err(Error::InvalidParameter(
                                "compound component has no WKT1 form".into(),
                            ))
                        }
                    }
                }
                Ok(Some(self.ids(&crs.info, node)))
            }
            CrsKind::Bound => {
                // WKT1 folds the shift into TOWGS84 on the source datum.
                let base = crs
                    .base
                    .as_deref()
                    .ok_or_else(|| Error::InvalidParameter("bound CRS without a source".into()))?;
                let helmert = crs
                    .bound_transform
                    .as_ref()
                    .and_then(|t| t.helmert_values());
                match helmert {
                    Some(values) => {
                        let mut flat = base.clone();
                        if let Some(DatumOrEnsemble::Datum(d)) = &mut flat.datum {
                            d.to_wgs84 = Some(values);
                        }
                        self.wkt1_crs(&flat)
                    }
                    None if self.options.strict => Err(Error::InvalidParameter(
                        "bound CRS transformation has no TOWGS84 form".into(),
                    )),
                    None => self.wkt1_crs(base),
                }
            }
            CrsKind::Temporal | CrsKind::Engineering | CrsKind::Other => {
                if self.options.strict {
                    Err(Error::InvalidParameter(format!(
                        "{:?} CRS cannot be written as WKT1",
                        crs.kind
                    )))
                } else {
                    Ok(None)
                }
            }
        }
    }
}

/// WKT1 method and parameter spellings for the supported projections.
fn wkt1_projection(conv: &ConversionDef, esri: bool) -> Option<(&'static str, Vec<(&'static str, f64)>)> {
    let deg = std::f64::consts::PI / 180.0;
    let p = |names: &[&str], default: f64| conv.param(names).map(|v| v / deg).unwrap_or(default);
    let lin = |names: &[&str], default: f64| conv.param(names).unwrap_or(default);
    let scale = |names: &[&str], default: f64| {
        conv.param(names).unwrap_or(default)
    };

    let lat0 = p(&["Latitude of natural origin", "Latitude of false origin", "latitude_of_origin", "lat_0"], 0.0);
    let lon0 = p(&["Longitude of natural origin", "Longitude of false origin", "central_meridian", "lon_0"], 0.0);
    let k0 = scale(&["Scale factor at natural origin", "scale_factor", "k_0"], 1.0);
    let fe = lin(&["False easting", "Easting at false origin", "false_easting", "x_0"], 0.0);
    let fn_ = lin(&["False northing", "Northing at false origin", "false_northing", "y_0"], 0.0);

    let (lat_name, lon_name, scale_name, fe_name, fn_name) = if esri {
        ("Latitude_Of_Origin", "Central_Meridian", "Scale_Factor", "False_Easting", "False_Northing")
    } else {
        ("latitude_of_origin", "central_meridian", "scale_factor", "false_easting", "false_northing")
    };

    match normalize_name(&conv.method.name).as_str() {
        "transversemercator" | "gausskruger" => Some((
            "Transverse_Mercator",
            vec![
                (lat_name, lat0),
                (lon_name, lon0),
                (scale_name, k0),
                (fe_name, fe),
                (fn_name, fn_),
            ],
        )),
        "mercatorvarianta" | "mercator1sp" => Some((
            "Mercator_1SP",
            vec![(lon_name, lon0), (scale_name, k0), (fe_name, fe), (fn_name, fn_)],
        )),
        "mercatorvariantb" | "mercator2sp" => Some((
            "Mercator_2SP",
            vec![
                (
                    if esri { "Standard_Parallel_1" } else { "standard_parallel_1" },
                    p(&["Latitude of 1st standard parallel", "standard_parallel_1", "lat_ts"], 0.0),
                ),
                (lon_name, lon0),
                (fe_name, fe),
                (fn_name, fn_),
            ],
        )),
        "popularvisualisationpseudomercator" | "popularvisualizationpseudomercator"
        | "webmercator" => Some((
            if esri { "Mercator_Auxiliary_Sphere" } else { "Mercator_1SP" },
            vec![(lon_name, lon0), (scale_name, 1.0), (fe_name, fe), (fn_name, fn_)],
        )),
        "lambertconicconformal1sp" | "lambertconformalconic1sp" => Some((
            "Lambert_Conformal_Conic_1SP",
            vec![
                (lat_name, lat0),
                (lon_name, lon0),
                (scale_name, k0),
                (fe_name, fe),
                (fn_name, fn_),
            ],
        )),
        "lambertconicconformal2sp" | "lambertconformalconic2sp" | "lambertconformalconic" => {
            let sp1 = if esri { "Standard_Parallel_1" } else { "standard_parallel_1" };
            let sp2 = if esri { "Standard_Parallel_2" } else { "standard_parallel_2" };
            Some((
                "Lambert_Conformal_Conic_2SP",
                vec![
                    (sp1, p(&["Latitude of 1st standard parallel", "standard_parallel_1"], 0.0)),
                    (sp2, p(&["Latitude of 2nd standard parallel", "standard_parallel_2"], 0.0)),
                    (lat_name, lat0),
                    (lon_name, lon0),
                    (fe_name, fe),
                    (fn_name, fn_),
                ],
            ))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Rendering

fn render(node: &Node, options: &WktOptions) -> String {
    let mut out = String::new();
    render_node(node, options, 0, &mut out);
    out
}

fn render_node(node: &Node, options: &WktOptions, depth: usize, out: &mut String) {
    out.push_str(&node.keyword);
    out.push('[');
    let multiline = !options.single_line
        && node
            .values
            .iter()
            .any(|v| matches!(v, Value::Node(n) if !n.values.iter().all(value_is_scalar)));
    for (i, value) in node.values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        match value {
            Value::Text(t) => {
                out.push('"');
                out.push_str(&t.replace('"', "\"\""));
                out.push('"');
            }
            Value::Number(n) => out.push_str(&fmt_number(*n)),
            Value::Word(w) => out.push_str(w),
            Value::Node(child) => {
                if multiline {
                    out.push('\n');
                    if !options.no_indentation {
                        for _ in 0..=depth {
                            out.push_str("    ");
                        }
                    }
                }
                render_node(child, options, depth + 1, out);
            }
        }
    }
    out.push(']');
}

fn value_is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Node(_))
}

fn fmt_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CsDef, DatumDef, ObjectInfo};
    use crate::object::WktOptions;

    fn wgs84() -> CrsDef {
        CrsDef::wgs84_2d()
    }

    fn opts(variant: WktVariant) -> WktOptions {
        WktOptions {
            variant,
            single_line: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_wkt2_2019_geographic() {
        let text = write_def(&Def::Crs(wgs84()), &opts(WktVariant::Wkt2_2019))
            .unwrap()
            .unwrap();
        assert!(text.starts_with("GEOGCRS[\"WGS 84\""));
        assert!(text.contains("DATUM[\"World Geodetic System 1984\""));
        assert!(text.contains("CS[ellipsoidal,2]"));
        assert!(text.contains("USAGE["));
        assert!(text.ends_with("ID[\"EPSG\",4326]]"));
    }

    #[test]
    fn test_wkt2_2015_uses_geodcrs() {
        let text = write_def(&Def::Crs(wgs84()), &opts(WktVariant::Wkt2_2015))
            .unwrap()
            .unwrap();
        assert!(text.starts_with("GEODCRS["));
        assert!(!text.contains("USAGE["));
        assert!(text.contains("SCOPE["));
    }

    #[test]
    fn test_simplified_drops_order_and_units() {
        let text = write_def(&Def::Crs(wgs84()), &opts(WktVariant::Wkt2_2019Simplified))
            .unwrap()
            .unwrap();
        assert!(!text.contains("ORDER["));
        assert!(!text.contains("USAGE["));
        // The shared axis unit is still written once.
        assert_eq!(text.matches("ANGLEUNIT[").count(), 1);
    }

    #[test]
    fn test_wkt1_gdal_geographic() {
        let text = write_def(&Def::Crs(wgs84()), &opts(WktVariant::Wkt1Gdal))
            .unwrap()
            .unwrap();
        assert!(text.starts_with("GEOGCS[\"WGS 84\""));
        assert!(text.contains("DATUM[\"World_Geodetic_System_1984\""));
        assert!(text.contains("SPHEROID[\"WGS 84\",6378137,298.257223563"));
        assert!(text.contains("TOWGS84[0,0,0]"));
        assert!(text.contains("AUTHORITY[\"EPSG\",\"4326\"]"));
        assert!(text.contains("AXIS[\"Latitude\",NORTH]"));
    }

    #[test]
    fn test_wkt1_esri_name_mangling() {
        let text = write_def(&Def::Crs(wgs84()), &opts(WktVariant::Wkt1Esri))
            .unwrap()
            .unwrap();
        assert!(text.starts_with("GEOGCS[\"GCS_WGS_84\""));
        assert!(text.contains("DATUM[\"D_World_Geodetic_System_1984\""));
        assert!(!text.contains("TOWGS84"));
        assert!(!text.contains("AXIS["));
    }

    #[test]
    fn test_output_axis_override() {
        let mut o = opts(WktVariant::Wkt1Gdal);
        o.output_axis = Some(false);
        let text = write_def(&Def::Crs(wgs84()), &o).unwrap().unwrap();
        assert!(!text.contains("AXIS["));
    }

    #[test]
    fn test_geographic_3d_strict_wkt1_fails() {
        let mut crs = wgs84();
        crs.kind = crate::model::CrsKind::Geographic3D;
        crs.cs = CsDef::ellipsoidal_3d();
        let mut o = opts(WktVariant::Wkt1Gdal);
        o.strict = true;
        assert!(matches!(
            write_def(&Def::Crs(crs.clone()), &o),
            Err(Error::InvalidParameter(_))
        ));
        // Relaxed mode degrades to 2D.
        o.strict = false;
        let text = write_def(&Def::Crs(crs.clone()), &o).unwrap().unwrap();
        assert!(text.starts_with("GEOGCS["));
        // The compound escape hatch keeps the height.
        o.allow_ellipsoidal_height_as_vertical_crs = true;
        let text = write_def(&Def::Crs(crs), &o).unwrap().unwrap();
        assert!(text.starts_with("COMPD_CS["));
        assert!(text.contains("VERT_CS["));
    }

    #[test]
    fn test_multiline_indents() {
        let text = write_def(
            &Def::Crs(wgs84()),
            &WktOptions {
                variant: WktVariant::Wkt2_2019,
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert!(text.contains("\n    DATUM["));
        let flat = write_def(
            &Def::Crs(wgs84()),
            &WktOptions {
                variant: WktVariant::Wkt2_2019,
                no_indentation: true,
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert!(flat.contains("\nDATUM["));
    }

    #[test]
    fn test_standalone_datum() {
        let text = write_def(&Def::Datum(DatumDef::wgs84()), &opts(WktVariant::Wkt2_2019))
            .unwrap()
            .unwrap();
        assert!(text.starts_with("DATUM[\"World Geodetic System 1984\""));
        assert!(text.contains("ELLIPSOID["));
    }

    #[test]
    fn test_operation_has_no_wkt1_form() {
        let op = crate::model::OperationDef::transformation("ED50 to WGS 84");
        assert!(write_def(&Def::Operation(op.clone()), &opts(WktVariant::Wkt1Gdal))
            .unwrap()
            .is_none());
        let mut o = opts(WktVariant::Wkt1Gdal);
        o.strict = true;
        assert!(write_def(&Def::Operation(op), &o).is_err());
    }

    #[test]
    fn test_round_trip_through_parser() {
        let text = write_def(&Def::Crs(wgs84()), &opts(WktVariant::Wkt2_2019))
            .unwrap()
            .unwrap();
        let (def, warnings) = crate::wkt::parse::parse(&text).unwrap();
        match def {
            Def::Crs(c) => {
                assert_eq!(c.info.name, "WGS 84");
                assert_eq!(c.kind, crate::model::CrsKind::Geographic2D);
            }
            other => panic!("expected a CRS, got {other:?}"),
        }
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_projected_wkt1() {
        let mut conv = ConversionDef {
            info: ObjectInfo::named("UTM zone 33N"),
            method: crate::model::MethodDef::new("Transverse Mercator", Some(9807)),
            params: vec![
                crate::model::ParamDef::angular("Latitude of natural origin", 0.0),
                crate::model::ParamDef::angular("Longitude of natural origin", 15.0),
                crate::model::ParamDef::scale("Scale factor at natural origin", 0.9996),
                crate::model::ParamDef::linear("False easting", 500000.0),
                crate::model::ParamDef::linear("False northing", 0.0),
            ],
        };
        conv.info = conv.info.with_id("EPSG", 16033);
        let mut crs = CrsDef::new(
            ObjectInfo::named("WGS 84 / UTM zone 33N").with_id("EPSG", 32633),
            crate::model::CrsKind::Projected,
            wgs84().datum.clone(),
            CsDef::cartesian_east_north(),
        );
        crs.base = Some(Box::new(wgs84()));
        crs.conversion = Some(conv);
        let text = write_def(&Def::Crs(crs), &opts(WktVariant::Wkt1Gdal))
            .unwrap()
            .unwrap();
        assert!(text.contains("PROJECTION[\"Transverse_Mercator\"]"));
        assert!(text.contains("PARAMETER[\"central_meridian\",15]"));
        assert!(text.contains("PARAMETER[\"scale_factor\",0.9996]"));
        assert!(text.contains("UNIT[\"metre\",1]"));
    }
}

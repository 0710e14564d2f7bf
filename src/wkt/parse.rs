//! WKT import: keyword tree to native definitions.
//!
//! Accepts both WKT2 (2015 and 2019 vocabulary) and WKT1 (GDAL/ESRI).
//! Recoverable oddities (assumed axis order, unknown directions, ignored
//! nodes) are reported as warnings rather than failures.

use crate::error::Error;
use crate::ident::{Identifier, UsageArea};
use crate::model::{
    AxisDef, AxisDirection, ConversionDef, CrsDef, CrsKind, CsDef, CsKind, DatumDef,
    DatumEnsembleDef, DatumKind, DatumOrEnsemble, Def, EllipsoidDef, MethodDef, ObjectInfo,
    OperationDef, OperationKind, ParamDef, PrimeMeridianDef, UnitDef, UnitKind, DEG_TO_RAD,
};

use super::Node;

pub(crate) fn parse(text: &str) -> Result<(Def, Vec<String>), Error> {
    let node = super::parse_tree(text)?;
    let mut p = Parser {
        text,
        warnings: Vec::new(),
    };
    let def = p.def_from(&node)?;
    Ok((def, p.warnings))
}

struct Parser<'a> {
    text: &'a str,
    warnings: Vec<String>,
}

impl<'a> Parser<'a> {
    fn err(&self, message: impl Into<String>) -> Error {
        Error::parse(self.text, message)
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn def_from(&mut self, node: &Node) -> Result<Def, Error> {
        let kw = node.keyword.to_ascii_uppercase();
        match kw.as_str() {
            "GEOGCRS" | "GEOGRAPHICCRS" | "GEODCRS" | "GEODETICCRS" | "GEOGCS" | "GEOCCS" => {
                Ok(Def::Crs(self.geodetic_crs(node)?))
            }
            "PROJCRS" | "PROJECTEDCRS" | "PROJCS" => Ok(Def::Crs(self.projected_crs(node)?)),
            "VERTCRS" | "VERTICALCRS" | "VERT_CS" => Ok(Def::Crs(self.vertical_crs(node)?)),
            "COMPOUNDCRS" | "COMPD_CS" => Ok(Def::Crs(self.compound_crs(node)?)),
            "BOUNDCRS" => Ok(Def::Crs(self.bound_crs(node)?)),
            "ENGCRS" | "ENGINEERINGCRS" | "LOCAL_CS" => {
                let info = self.info_from(node);
                let cs = self.coordinate_system(node, CsKind::Other)?;
                Ok(Def::Crs(CrsDef::new(info, CrsKind::Engineering, None, cs)))
            }
            "TIMECRS" => {
                let info = self.info_from(node);
                let cs = self.coordinate_system(node, CsKind::Temporal)?;
                Ok(Def::Crs(CrsDef::new(info, CrsKind::Temporal, None, cs)))
            }
            "ELLIPSOID" | "SPHEROID" => Ok(Def::Ellipsoid(self.ellipsoid(node)?)),
            "PRIMEM" | "PRIMEMERIDIAN" => Ok(Def::PrimeMeridian(self.prime_meridian(node)?)),
            "DATUM" | "TRF" | "GEODETICDATUM" => {
                Ok(Def::Datum(self.datum(node, DatumKind::Geodetic)?))
            }
            "VDATUM" | "VRF" | "VERTICALDATUM" | "VERT_DATUM" => {
                Ok(Def::Datum(self.datum(node, DatumKind::Vertical)?))
            }
            "ENSEMBLE" => Ok(Def::DatumEnsemble(self.ensemble(node)?)),
            "COORDINATEOPERATION" => Ok(Def::Operation(self.operation(node)?)),
            "CONVERSION" => {
                let conv = self.conversion(node)?;
                Ok(Def::Operation(OperationDef {
                    info: conv.info.clone(),
                    kind: OperationKind::Conversion,
                    source: None,
                    target: None,
                    method: Some(conv.method),
                    params: conv.params,
                    accuracy: None,
                    steps: Vec::new(),
                }))
            }
            other => Err(self.err(format!("unsupported WKT keyword {other}"))),
        }
    }

    // -- metadata -----------------------------------------------------------

    fn info_from(&mut self, node: &Node) -> ObjectInfo {
        let mut info = ObjectInfo::named(node.name().unwrap_or_default());
        for id in node.find_all("ID").chain(node.find_all("AUTHORITY")) {
            if let (Some(auth), Some(code)) = (id.text_at(0), id_code(id)) {
                info.identifiers.push(Identifier::new(auth, code));
            }
        }
        if let Some(remark) = node.find("REMARK").and_then(|n| n.text_at(0)) {
            info.remarks = Some(remark.to_string());
        }
        // WKT2-2019 wraps scope/area in USAGE; 2015 puts them at this level.
        let usage_holder = node.find("USAGE").unwrap_or(node);
        if let Some(scope) = usage_holder.find("SCOPE").and_then(|n| n.text_at(0)) {
            info.scope = Some(scope.to_string());
        }
        let area_name = usage_holder
            .find("AREA")
            .and_then(|n| n.text_at(0))
            .unwrap_or_default()
            .to_string();
        if let Some(bbox) = usage_holder.find("BBOX") {
            // BBOX stores south, west, north, east.
            if let (Some(s), Some(w), Some(n), Some(e)) = (
                bbox.number_at(0),
                bbox.number_at(1),
                bbox.number_at(2),
                bbox.number_at(3),
            ) {
                info.usage_area = Some(UsageArea::new(w, s, e, n, area_name));
            } else {
                self.warn("BBOX with fewer than four numbers ignored".to_string());
            }
        }
        info
    }

    // -- units --------------------------------------------------------------

    fn unit_from(&mut self, node: &Node, kind: UnitKind) -> UnitDef {
        let name = node.name().unwrap_or("unknown").to_string();
        let factor = node.number_at(1).unwrap_or_else(|| {
            self.warn(format!("unit {name} without a conversion factor"));
            1.0
        });
        UnitDef { name, kind, factor }
    }

    fn angular_unit(&mut self, parent: &Node) -> Option<UnitDef> {
        parent
            .find_any(&["ANGLEUNIT", "UNIT"])
            .cloned()
            .map(|n| self.unit_from(&n, UnitKind::Angular))
    }

    fn linear_unit(&mut self, parent: &Node) -> Option<UnitDef> {
        parent
            .find_any(&["LENGTHUNIT", "UNIT"])
            .cloned()
            .map(|n| self.unit_from(&n, UnitKind::Linear))
    }

    // -- leaf objects -------------------------------------------------------

    fn ellipsoid(&mut self, node: &Node) -> Result<EllipsoidDef, Error> {
        let a = node
            .number_at(1)
            .ok_or_else(|| self.err("ellipsoid without a semi-major axis"))?;
        let rf = node
            .number_at(2)
            .ok_or_else(|| self.err("ellipsoid without an inverse flattening"))?;
        let to_metre = self.linear_unit(node).map(|u| u.factor).unwrap_or(1.0);
        let mut def = EllipsoidDef::new(node.name().unwrap_or_default(), a * to_metre, rf);
        def.info = self.info_from(node);
        Ok(def)
    }

    fn prime_meridian(&mut self, node: &Node) -> Result<PrimeMeridianDef, Error> {
        let value = node
            .number_at(1)
            .ok_or_else(|| self.err("prime meridian without a longitude"))?;
        let factor = self.angular_unit(node).map(|u| u.factor).unwrap_or(DEG_TO_RAD);
        Ok(PrimeMeridianDef {
            info: self.info_from(node),
            longitude: value * factor / DEG_TO_RAD,
        })
    }

    fn datum(&mut self, node: &Node, default_kind: DatumKind) -> Result<DatumDef, Error> {
        let ellipsoid = node
            .find_any(&["ELLIPSOID", "SPHEROID"])
            .cloned()
            .map(|n| self.ellipsoid(&n))
            .transpose()?;
        let to_wgs84 = node.find("TOWGS84").map(|tw| {
            (0..tw.values.len())
                .filter_map(|i| tw.number_at(i))
                .collect::<Vec<f64>>()
        });
        Ok(DatumDef {
            info: self.info_from(node),
            kind: default_kind,
            ellipsoid,
            prime_meridian: None,
            to_wgs84,
        })
    }

    fn ensemble(&mut self, node: &Node) -> Result<DatumEnsembleDef, Error> {
        let ellipsoid = node
            .find_any(&["ELLIPSOID", "SPHEROID"])
            .cloned()
            .map(|n| self.ellipsoid(&n))
            .transpose()?;
        let members = node
            .find_all("MEMBER")
            .map(|m| {
                let mut d = DatumDef {
                    info: self.info_from(m),
                    kind: DatumKind::Geodetic,
                    ellipsoid: ellipsoid.clone(),
                    prime_meridian: Some(PrimeMeridianDef::greenwich()),
                    to_wgs84: None,
                };
                d.info.name = m.name().unwrap_or_default().to_string();
                d
            })
            .collect::<Vec<_>>();
        let accuracy = node
            .find("ENSEMBLEACCURACY")
            .and_then(|n| n.number_at(0))
            .unwrap_or(0.0);
        Ok(DatumEnsembleDef {
            info: self.info_from(node),
            members,
            accuracy,
        })
    }

    // -- coordinate systems -------------------------------------------------

    fn coordinate_system(&mut self, parent: &Node, default_kind: CsKind) -> Result<CsDef, Error> {
        let (kind, declared_dim) = match parent.find("CS") {
            Some(cs) => {
                let kind = match cs.text_at(0).unwrap_or("").to_ascii_lowercase().as_str() {
                    "ellipsoidal" => CsKind::Ellipsoidal,
                    "cartesian" => CsKind::Cartesian,
                    "vertical" => CsKind::Vertical,
                    "spherical" => CsKind::Spherical,
                    "temporal" | "temporalcount" | "temporalmeasure" | "datetime" => {
                        CsKind::Temporal
                    }
                    other => {
                        self.warn(format!("unknown CS type {other:?}"));
                        CsKind::Other
                    }
                };
                (kind, cs.number_at(1).map(|d| d as usize))
            }
            None => (default_kind, None),
        };

        // The unit written once after the axis list applies to all of them.
        let common_unit = parent
            .find_any(&["ANGLEUNIT", "LENGTHUNIT", "UNIT"])
            .cloned()
            .map(|n| {
                let k = match n.keyword.to_ascii_uppercase().as_str() {
                    "ANGLEUNIT" => UnitKind::Angular,
                    "LENGTHUNIT" => UnitKind::Linear,
                    _ if kind == CsKind::Ellipsoidal => UnitKind::Angular,
                    _ => UnitKind::Linear,
                };
                self.unit_from(&n, k)
            });

        let mut axes = Vec::new();
        for axis in parent.find_all("AXIS") {
            axes.push(self.axis(axis, kind, common_unit.clone())?);
        }
        if axes.is_empty() {
            match kind {
                CsKind::Ellipsoidal => {
                    self.warn("no axes declared; assuming latitude/longitude order".to_string());
                    axes = CsDef::ellipsoidal_2d().axes;
                    if let Some(u) = common_unit {
                        for a in &mut axes {
                            a.unit = u.clone();
                        }
                    }
                }
                CsKind::Cartesian => {
                    axes = CsDef::cartesian_east_north().axes;
                    if let Some(u) = common_unit {
                        for a in &mut axes {
                            a.unit = u.clone();
                        }
                    }
                }
                CsKind::Vertical => axes = CsDef::vertical_up().axes,
                _ => {}
            }
        }
        if let Some(dim) = declared_dim {
            if dim != axes.len() && !axes.is_empty() {
                self.warn(format!(
                    "CS declares {dim} dimensions but {} axes follow",
                    axes.len()
                ));
            }
        }
        Ok(CsDef { kind, axes })
    }

    fn axis(
        &mut self,
        node: &Node,
        cs_kind: CsKind,
        common_unit: Option<UnitDef>,
    ) -> Result<AxisDef, Error> {
        let raw_name = node.name().unwrap_or_default();
        let (name, abbreviation) = split_axis_name(raw_name);
        let direction = match node.text_at(1).map(AxisDirection::parse) {
            Some(Some(d)) => d,
            _ => {
                self.warn(format!(
                    "axis {raw_name:?} has an unknown direction; treating as unspecified"
                ));
                AxisDirection::Unspecified
            }
        };
        let own_unit = node.find_any(&["ANGLEUNIT", "LENGTHUNIT", "UNIT"]).cloned();
        let unit = match own_unit {
            Some(n) => {
                let k = match n.keyword.to_ascii_uppercase().as_str() {
                    "ANGLEUNIT" => UnitKind::Angular,
                    "LENGTHUNIT" => UnitKind::Linear,
                    _ if cs_kind == CsKind::Ellipsoidal => UnitKind::Angular,
                    _ => UnitKind::Linear,
                };
                self.unit_from(&n, k)
            }
            None => common_unit.unwrap_or_else(|| {
                if cs_kind == CsKind::Ellipsoidal {
                    UnitDef::degree()
                } else {
                    UnitDef::metre()
                }
            }),
        };
        Ok(AxisDef {
            name,
            abbreviation,
            direction,
            unit,
        })
    }

    // -- CRS ----------------------------------------------------------------

    fn geodetic_crs(&mut self, node: &Node) -> Result<CrsDef, Error> {
        let info = self.info_from(node);
        let is_wkt1 = node.is("GEOGCS") || node.is("GEOCCS");
        let default_cs = if node.is("GEOCCS") {
            CsKind::Cartesian
        } else {
            CsKind::Ellipsoidal
        };
        let cs = self.coordinate_system(node, default_cs)?;

        let prime_meridian = node
            .find_any(&["PRIMEM", "PRIMEMERIDIAN"])
            .cloned()
            .map(|n| self.prime_meridian(&n))
            .transpose()?
            .unwrap_or_else(PrimeMeridianDef::greenwich);

        let datum = if let Some(ens) = node.find("ENSEMBLE").cloned() {
            let mut e = self.ensemble(&ens)?;
            for m in &mut e.members {
                m.prime_meridian = Some(prime_meridian.clone());
            }
            DatumOrEnsemble::Ensemble(e)
        } else {
            let datum_node = node
                .find_any(&["DATUM", "TRF", "GEODETICDATUM"])
                .cloned()
                .ok_or_else(|| self.err("geodetic CRS without a datum"))?;
            let mut kind = DatumKind::Geodetic;
            if node.find("DYNAMIC").is_some() {
                kind = DatumKind::DynamicGeodetic;
            }
            let mut d = self.datum(&datum_node, kind)?;
            d.prime_meridian = Some(prime_meridian);
            DatumOrEnsemble::Datum(d)
        };

        let kind = match cs.kind {
            CsKind::Cartesian => CrsKind::Geocentric,
            CsKind::Ellipsoidal if cs.dimension() == 3 => CrsKind::Geographic3D,
            _ => CrsKind::Geographic2D,
        };
        // WKT1 has no unambiguous geographic axis declaration.
        if is_wkt1 && node.find("AXIS").is_none() && kind != CrsKind::Geocentric {
            self.warn("WKT1 geographic CRS without AXIS nodes; assuming latitude/longitude");
        }
        Ok(CrsDef::new(info, kind, Some(datum), cs))
    }

    fn projected_crs(&mut self, node: &Node) -> Result<CrsDef, Error> {
        let info = self.info_from(node);
        let base_node = node
            .find_any(&["BASEGEOGCRS", "BASEGEODCRS", "GEOGCS"])
            .cloned()
            .ok_or_else(|| self.err("projected CRS without a base CRS"))?;
        let base = self.geodetic_crs(&base_node)?;

        let cs = self.coordinate_system(node, CsKind::Cartesian)?;
        let conversion = if let Some(conv) = node.find("CONVERSION").cloned() {
            self.conversion(&conv)?
        } else {
            self.wkt1_conversion(node, &base)?
        };

        let mut crs = CrsDef::new(info, CrsKind::Projected, base.datum.clone(), cs);
        crs.base = Some(Box::new(base));
        crs.conversion = Some(conversion);
        Ok(crs)
    }

    fn conversion(&mut self, node: &Node) -> Result<ConversionDef, Error> {
        let method_node = node
            .find("METHOD")
            .ok_or_else(|| self.err("conversion without a method"))?;
        let code = method_node.find("ID").and_then(id_code_u32);
        let method = MethodDef::new(method_node.name().unwrap_or_default(), code);
        let mut params = Vec::new();
        for p in node.find_all("PARAMETER") {
            let name = p.name().unwrap_or_default().to_string();
            let value = p
                .number_at(1)
                .ok_or_else(|| self.err(format!("parameter {name:?} without a value")))?;
            let unit = p
                .find_any(&["ANGLEUNIT", "LENGTHUNIT", "SCALEUNIT", "UNIT"])
                .cloned()
                .map(|n| {
                    let k = match n.keyword.to_ascii_uppercase().as_str() {
                        "ANGLEUNIT" => UnitKind::Angular,
                        "LENGTHUNIT" => UnitKind::Linear,
                        "SCALEUNIT" => UnitKind::Scale,
                        _ => UnitKind::Unknown,
                    };
                    self.unit_from(&n, k)
                })
                .unwrap_or_else(|| guess_param_unit(&name));
            params.push(ParamDef { name, value, unit });
        }
        Ok(ConversionDef {
            info: self.info_from(node),
            method,
            params,
        })
    }

    /// WKT1 spells the conversion as PROJECTION + bare PARAMETER nodes whose
    /// units come from the surrounding CRS.
    fn wkt1_conversion(&mut self, node: &Node, base: &CrsDef) -> Result<ConversionDef, Error> {
        let projection = node
            .find("PROJECTION")
            .ok_or_else(|| self.err("projected CRS without CONVERSION or PROJECTION"))?;
        let method = MethodDef::new(projection.name().unwrap_or_default(), None);
        let angular = base
            .cs
            .axes
            .first()
            .map(|a| a.unit.clone())
            .unwrap_or_else(UnitDef::degree);
        let linear = self.linear_unit(node).unwrap_or_else(UnitDef::metre);
        let mut params = Vec::new();
        for p in node.find_all("PARAMETER") {
            let name = p.name().unwrap_or_default().to_string();
            let value = p
                .number_at(1)
                .ok_or_else(|| self.err(format!("parameter {name:?} without a value")))?;
            let unit = match wkt1_param_kind(&name) {
                UnitKind::Angular => angular.clone(),
                UnitKind::Scale => UnitDef::unity(),
                _ => linear.clone(),
            };
            params.push(ParamDef { name, value, unit });
        }
        Ok(ConversionDef {
            info: ObjectInfo::named("unnamed"),
            method,
            params,
        })
    }

    fn vertical_crs(&mut self, node: &Node) -> Result<CrsDef, Error> {
        let info = self.info_from(node);
        let datum = node
            .find_any(&["VDATUM", "VRF", "VERTICALDATUM", "VERT_DATUM"])
            .cloned()
            .map(|n| self.datum(&n, DatumKind::Vertical))
            .transpose()?;
        let cs = self.coordinate_system(node, CsKind::Vertical)?;
        Ok(CrsDef::new(
            info,
            CrsKind::Vertical,
            datum.map(DatumOrEnsemble::Datum),
            cs,
        ))
    }

    fn compound_crs(&mut self, node: &Node) -> Result<CrsDef, Error> {
        let info = self.info_from(node);
        let mut components = Vec::new();
        for child in node.child_nodes() {
            if matches!(
                child.keyword.to_ascii_uppercase().as_str(),
                "GEOGCRS" | "GEOGRAPHICCRS" | "GEODCRS" | "GEODETICCRS" | "GEOGCS" | "GEOCCS"
                    | "PROJCRS" | "PROJECTEDCRS" | "PROJCS" | "VERTCRS" | "VERTICALCRS"
                    | "VERT_CS" | "TIMECRS" | "ENGCRS" | "LOCAL_CS" | "BOUNDCRS"
            ) {
                match self.def_from(child)? {
                    Def::Crs(c) => components.push(c),
                    _ => unreachable!("CRS keywords parse to CRS definitions"),
                }
            }
        }
        if components.len() < 2 {
            return Err(self.err("compound CRS needs at least two components"));
        }
        let cs = CsDef {
            kind: CsKind::Other,
            axes: components.iter().flat_map(|c| c.cs.axes.clone()).collect(),
        };
        let mut crs = CrsDef::new(info, CrsKind::Compound, components[0].datum.clone(), cs);
        crs.components = components;
        Ok(crs)
    }

    fn bound_crs(&mut self, node: &Node) -> Result<CrsDef, Error> {
        let source = node
            .find("SOURCECRS")
            .and_then(|n| n.child_nodes().next())
            .ok_or_else(|| self.err("bound CRS without a source CRS"))?;
        let target = node
            .find("TARGETCRS")
            .and_then(|n| n.child_nodes().next())
            .ok_or_else(|| self.err("bound CRS without a target CRS"))?;
        let source = match self.def_from(source)? {
            Def::Crs(c) => c,
            _ => return Err(self.err("bound CRS source is not a CRS")),
        };
        let target = match self.def_from(target)? {
            Def::Crs(c) => c,
            _ => return Err(self.err("bound CRS target is not a CRS")),
        };
        let transform = node
            .find("ABRIDGEDTRANSFORMATION")
            .cloned()
            .map(|n| self.operation(&n))
            .transpose()?;

        let mut info = self.info_from(node);
        if info.name.is_empty() {
            info.name = source.info.name.clone();
        }
        let mut crs = CrsDef::new(info, CrsKind::Bound, source.datum.clone(), source.cs.clone());
        crs.base = Some(Box::new(source));
        crs.hub = Some(Box::new(target));
        crs.bound_transform = transform.map(Box::new);
        Ok(crs)
    }

    fn operation(&mut self, node: &Node) -> Result<OperationDef, Error> {
        let info = self.info_from(node);
        let source = node
            .find("SOURCECRS")
            .and_then(|n| n.child_nodes().next())
            .cloned()
            .map(|n| self.def_from(&n))
            .transpose()?
            .and_then(|d| match d {
                Def::Crs(c) => Some(Box::new(c)),
                _ => None,
            });
        let target = node
            .find("TARGETCRS")
            .and_then(|n| n.child_nodes().next())
            .cloned()
            .map(|n| self.def_from(&n))
            .transpose()?
            .and_then(|d| match d {
                Def::Crs(c) => Some(Box::new(c)),
                _ => None,
            });
        let method = node.find("METHOD").map(|m| {
            MethodDef::new(m.name().unwrap_or_default(), m.find("ID").and_then(id_code_u32))
        });
        let mut params = Vec::new();
        for p in node.find_all("PARAMETER") {
            let name = p.name().unwrap_or_default().to_string();
            let value = p
                .number_at(1)
                .ok_or_else(|| self.err(format!("parameter {name:?} without a value")))?;
            let unit = p
                .find_any(&["ANGLEUNIT", "LENGTHUNIT", "SCALEUNIT", "UNIT"])
                .cloned()
                .map(|n| self.unit_from(&n, UnitKind::Unknown))
                .unwrap_or_else(|| guess_param_unit(&name));
            params.push(ParamDef { name, value, unit });
        }
        let accuracy = node.find("OPERATIONACCURACY").and_then(|n| n.number_at(0));
        Ok(OperationDef {
            info,
            kind: OperationKind::Transformation,
            source,
            target,
            method,
            params,
            accuracy,
            steps: Vec::new(),
        })
    }
}

// ---------------------------------------------------------------------------

fn id_code(node: &Node) -> Option<String> {
    match node.values.get(1)? {
        super::Value::Number(n) => {
            if n.fract() == 0.0 {
                Some(format!("{}", *n as i64))
            } else {
                Some(n.to_string())
            }
        }
        super::Value::Text(t) => Some(t.clone()),
        _ => None,
    }
}

fn id_code_u32(node: &Node) -> Option<u32> {
    id_code(node)?.parse().ok()
}

/// `"geodetic latitude (Lat)"` carries both a name and an abbreviation.
fn split_axis_name(raw: &str) -> (String, String) {
    if let Some(open) = raw.rfind('(') {
        if let Some(close) = raw[open..].find(')') {
            let abbrev = raw[open + 1..open + close].to_string();
            let name = raw[..open].trim().to_string();
            return (name, abbrev);
        }
    }
    (raw.to_string(), String::new())
}

fn guess_param_unit(name: &str) -> UnitDef {
    match wkt1_param_kind(name) {
        UnitKind::Angular => UnitDef::degree(),
        UnitKind::Scale => UnitDef::unity(),
        _ => UnitDef::metre(),
    }
}

fn wkt1_param_kind(name: &str) -> UnitKind {
    let n = name.to_ascii_lowercase();
    if n.contains("scale") {
        UnitKind::Scale
    } else if n.contains("latitude")
        || n.contains("longitude")
        || n.contains("meridian")
        || n.contains("parallel")
        || n.contains("azimuth")
        || n.contains("rotation")
    {
        UnitKind::Angular
    } else {
        UnitKind::Linear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WGS84_WKT2: &str = r#"GEOGCRS["WGS 84",DATUM["World Geodetic System 1984",ELLIPSOID["WGS 84",6378137,298.257223563,LENGTHUNIT["metre",1]]],PRIMEM["Greenwich",0,ANGLEUNIT["degree",0.0174532925199433]],CS[ellipsoidal,2],AXIS["geodetic latitude (Lat)",north,ORDER[1],ANGLEUNIT["degree",0.0174532925199433]],AXIS["geodetic longitude (Lon)",east,ORDER[2],ANGLEUNIT["degree",0.0174532925199433]],ID["EPSG",4326]]"#;

    const WGS84_WKT1: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563],TOWGS84[0,0,0,0,0,0,0]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]]"#;

    #[test]
    fn test_parse_wkt2_geographic() {
        let (def, warnings) = parse(WGS84_WKT2).unwrap();
        let crs = match def {
            Def::Crs(c) => c,
            other => panic!("expected a CRS, got {other:?}"),
        };
        assert_eq!(crs.kind, CrsKind::Geographic2D);
        assert_eq!(crs.info.name, "WGS 84");
        assert_eq!(crs.info.identifiers[0].code(), "4326");
        assert_eq!(crs.cs.axes[0].abbreviation, "Lat");
        assert_eq!(crs.cs.axes[0].direction, AxisDirection::North);
        assert!((crs.ellipsoid().unwrap().semi_major - 6378137.0).abs() < 1e-9);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_parse_wkt1_geographic_warns_about_axes() {
        let (def, warnings) = parse(WGS84_WKT1).unwrap();
        let crs = match def {
            Def::Crs(c) => c,
            other => panic!("expected a CRS, got {other:?}"),
        };
        assert_eq!(crs.kind, CrsKind::Geographic2D);
        let datum = match crs.horizontal_datum().unwrap() {
            DatumOrEnsemble::Datum(d) => d.clone(),
            _ => panic!("expected a plain datum"),
        };
        assert_eq!(datum.to_wgs84.as_deref(), Some(&[0.0; 7][..]));
        assert!(warnings.iter().any(|w| w.contains("assuming latitude")));
    }

    #[test]
    fn test_parse_projected_wkt2() {
        let text = r#"PROJCRS["WGS 84 / UTM zone 33N",BASEGEOGCRS["WGS 84",DATUM["World Geodetic System 1984",ELLIPSOID["WGS 84",6378137,298.257223563,LENGTHUNIT["metre",1]]],PRIMEM["Greenwich",0,ANGLEUNIT["degree",0.0174532925199433]]],CONVERSION["UTM zone 33N",METHOD["Transverse Mercator",ID["EPSG",9807]],PARAMETER["Latitude of natural origin",0,ANGLEUNIT["degree",0.0174532925199433]],PARAMETER["Longitude of natural origin",15,ANGLEUNIT["degree",0.0174532925199433]],PARAMETER["Scale factor at natural origin",0.9996,SCALEUNIT["unity",1]],PARAMETER["False easting",500000,LENGTHUNIT["metre",1]],PARAMETER["False northing",0,LENGTHUNIT["metre",1]]],CS[Cartesian,2],AXIS["(E)",east,ORDER[1],LENGTHUNIT["metre",1]],AXIS["(N)",north,ORDER[2],LENGTHUNIT["metre",1]],ID["EPSG",32633]]"#;
        let (def, _) = parse(text).unwrap();
        let crs = match def {
            Def::Crs(c) => c,
            other => panic!("expected a CRS, got {other:?}"),
        };
        assert_eq!(crs.kind, CrsKind::Projected);
        let conv = crs.conversion.as_ref().unwrap();
        assert_eq!(conv.method.code, Some(9807));
        let lon0 = conv.param(&["Longitude of natural origin"]).unwrap();
        assert!((lon0 - 15f64.to_radians()).abs() < 1e-12);
        assert_eq!(crs.base.as_ref().unwrap().kind, CrsKind::Geographic2D);
    }

    #[test]
    fn test_parse_projected_wkt1() {
        let text = r#"PROJCS["WGS 84 / UTM zone 33N",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",15],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],PARAMETER["false_northing",0],UNIT["metre",1],AUTHORITY["EPSG","32633"]]"#;
        let (def, _) = parse(text).unwrap();
        let crs = match def {
            Def::Crs(c) => c,
            other => panic!("expected a CRS, got {other:?}"),
        };
        let conv = crs.conversion.as_ref().unwrap();
        let lon0 = conv.param(&["central_meridian"]).unwrap();
        assert!((lon0 - 15f64.to_radians()).abs() < 1e-12);
        let fe = conv.param(&["false_easting"]).unwrap();
        assert_eq!(fe, 500_000.0);
    }

    #[test]
    fn test_parse_ensemble() {
        let text = r#"GEOGCRS["WGS 84",ENSEMBLE["World Geodetic System 1984 ensemble",MEMBER["World Geodetic System 1984 (Transit)"],MEMBER["World Geodetic System 1984 (G2296)"],ELLIPSOID["WGS 84",6378137,298.257223563,LENGTHUNIT["metre",1]],ENSEMBLEACCURACY[2.0]],PRIMEM["Greenwich",0,ANGLEUNIT["degree",0.0174532925199433]],CS[ellipsoidal,2],AXIS["geodetic latitude (Lat)",north,ORDER[1],ANGLEUNIT["degree",0.0174532925199433]],AXIS["geodetic longitude (Lon)",east,ORDER[2],ANGLEUNIT["degree",0.0174532925199433]]]"#;
        let (def, _) = parse(text).unwrap();
        let crs = match def {
            Def::Crs(c) => c,
            other => panic!("expected a CRS, got {other:?}"),
        };
        match crs.datum.as_ref().unwrap() {
            DatumOrEnsemble::Ensemble(e) => {
                assert_eq!(e.members.len(), 2);
                assert_eq!(e.accuracy, 2.0);
                assert!(e.members[0].ellipsoid.is_some());
            }
            _ => panic!("expected an ensemble"),
        }
    }

    #[test]
    fn test_parse_usage_bbox() {
        let text = r#"GEOGCRS["ETRS89",DATUM["European Terrestrial Reference System 1989",ELLIPSOID["GRS 1980",6378137,298.257222101,LENGTHUNIT["metre",1]]],PRIMEM["Greenwich",0,ANGLEUNIT["degree",0.0174532925199433]],CS[ellipsoidal,2],AXIS["geodetic latitude (Lat)",north,ORDER[1],ANGLEUNIT["degree",0.0174532925199433]],AXIS["geodetic longitude (Lon)",east,ORDER[2],ANGLEUNIT["degree",0.0174532925199433]],USAGE[SCOPE["Geodesy."],AREA["Europe"],BBOX[32.88,-16.1,84.73,40.18]]]"#;
        let (def, _) = parse(text).unwrap();
        let info = def.info().unwrap();
        let area = info.usage_area.as_ref().unwrap();
        assert_eq!(area.south, 32.88);
        assert_eq!(area.west, -16.1);
        assert_eq!(info.scope.as_deref(), Some("Geodesy."));
    }

    #[test]
    fn test_parse_compound() {
        let text = r#"COMPD_CS["NAD83 + NAVD88",GEOGCS["NAD83",DATUM["North_American_Datum_1983",SPHEROID["GRS 1980",6378137,298.257222101]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],VERT_CS["NAVD88 height",VERT_DATUM["North American Vertical Datum 1988",2005],UNIT["metre",1],AXIS["Gravity-related height",UP]]]"#;
        let (def, _) = parse(text).unwrap();
        let crs = match def {
            Def::Crs(c) => c,
            other => panic!("expected a CRS, got {other:?}"),
        };
        assert_eq!(crs.kind, CrsKind::Compound);
        assert_eq!(crs.components.len(), 2);
        assert_eq!(crs.components[1].kind, CrsKind::Vertical);
    }

    #[test]
    fn test_parse_bound_crs() {
        let text = r#"BOUNDCRS[SOURCECRS[GEOGCRS["ED50",DATUM["European Datum 1950",ELLIPSOID["International 1924",6378388,297,LENGTHUNIT["metre",1]]],PRIMEM["Greenwich",0,ANGLEUNIT["degree",0.0174532925199433]],CS[ellipsoidal,2],AXIS["geodetic latitude (Lat)",north,ORDER[1],ANGLEUNIT["degree",0.0174532925199433]],AXIS["geodetic longitude (Lon)",east,ORDER[2],ANGLEUNIT["degree",0.0174532925199433]]]],TARGETCRS[GEOGCRS["WGS 84",DATUM["World Geodetic System 1984",ELLIPSOID["WGS 84",6378137,298.257223563,LENGTHUNIT["metre",1]]],PRIMEM["Greenwich",0,ANGLEUNIT["degree",0.0174532925199433]],CS[ellipsoidal,2],AXIS["geodetic latitude (Lat)",north,ORDER[1],ANGLEUNIT["degree",0.0174532925199433]],AXIS["geodetic longitude (Lon)",east,ORDER[2],ANGLEUNIT["degree",0.0174532925199433]]]],ABRIDGEDTRANSFORMATION["ED50 to WGS 84",METHOD["Geocentric translations",ID["EPSG",1031]],PARAMETER["X-axis translation",-87],PARAMETER["Y-axis translation",-98],PARAMETER["Z-axis translation",-121]]]"#;
        let (def, _) = parse(text).unwrap();
        let crs = match def {
            Def::Crs(c) => c,
            other => panic!("expected a CRS, got {other:?}"),
        };
        assert_eq!(crs.kind, CrsKind::Bound);
        assert_eq!(crs.base.as_ref().unwrap().info.name, "ED50");
        assert_eq!(crs.hub.as_ref().unwrap().info.name, "WGS 84");
        let tr = crs.bound_transform.as_ref().unwrap();
        assert_eq!(tr.helmert_values().unwrap(), vec![-87.0, -98.0, -121.0]);
    }

    #[test]
    fn test_parse_standalone_ellipsoid() {
        let (def, _) =
            parse(r#"ELLIPSOID["GRS 1980",6378137,298.257222101,LENGTHUNIT["metre",1]]"#).unwrap();
        match def {
            Def::Ellipsoid(e) => assert!((e.inverse_flattening - 298.257222101).abs() < 1e-9),
            other => panic!("expected an ellipsoid, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_keyword_is_error() {
        assert!(parse("FOO[\"bar\"]").is_err());
    }
}

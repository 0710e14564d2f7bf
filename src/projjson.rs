//! PROJJSON import and export (schema v0.2 and v0.4).

use serde_json::{json, Map, Value};

use crate::error::Error;
use crate::ident::{Identifier, UsageArea};
use crate::model::{
    AxisDef, AxisDirection, ConversionDef, CrsDef, CrsKind, CsDef, CsKind, DatumDef,
    DatumEnsembleDef, DatumKind, DatumOrEnsemble, Def, EllipsoidDef, MethodDef, ObjectInfo,
    OperationDef, OperationKind, ParamDef, PrimeMeridianDef, UnitDef, UnitKind,
};
use crate::object::ProjJsonOptions;

// ---------------------------------------------------------------------------
// Import

pub(crate) fn parse(text: &str) -> Result<Def, Error> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| Error::parse(text, e.to_string()))?;
    def_from(&value).map_err(|message| Error::parse(text, message))
}

type JResult<T> = Result<T, String>;

fn def_from(v: &Value) -> JResult<Def> {
    let ty = v
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing \"type\"".to_string())?;
    match ty {
        "GeographicCRS" | "GeodeticCRS" | "ProjectedCRS" | "VerticalCRS" | "CompoundCRS"
        | "BoundCRS" | "EngineeringCRS" | "TemporalCRS" => Ok(Def::Crs(crs_from(v)?)),
        "Ellipsoid" => Ok(Def::Ellipsoid(ellipsoid_from(v)?)),
        "PrimeMeridian" => Ok(Def::PrimeMeridian(prime_meridian_from(v)?)),
        "GeodeticReferenceFrame" | "DynamicGeodeticReferenceFrame" => {
            Ok(Def::Datum(datum_from(v, DatumKind::Geodetic)?))
        }
        "VerticalReferenceFrame" | "DynamicVerticalReferenceFrame" => {
            Ok(Def::Datum(datum_from(v, DatumKind::Vertical)?))
        }
        "DatumEnsemble" => Ok(Def::DatumEnsemble(ensemble_from(v)?)),
        "Transformation" | "Conversion" | "ConcatenatedOperation" => {
            Ok(Def::Operation(operation_from(v)?))
        }
        other => Err(format!("unsupported PROJJSON type {other:?}")),
    }
}

fn info_from(v: &Value) -> ObjectInfo {
    let mut info = ObjectInfo::named(v.get("name").and_then(Value::as_str).unwrap_or_default());
    for id in ids_of(v) {
        info.identifiers.push(id);
    }
    if let Some(scope) = v.get("scope").and_then(Value::as_str) {
        info.scope = Some(scope.to_string());
    }
    if let Some(remarks) = v.get("remarks").and_then(Value::as_str) {
        info.remarks = Some(remarks.to_string());
    }
    let area_name = v.get("area").and_then(Value::as_str).unwrap_or_default();
    if let Some(bbox) = v.get("bbox") {
        if let (Some(s), Some(w), Some(n), Some(e)) = (
            bbox.get("south_latitude").and_then(Value::as_f64),
            bbox.get("west_longitude").and_then(Value::as_f64),
            bbox.get("north_latitude").and_then(Value::as_f64),
            bbox.get("east_longitude").and_then(Value::as_f64),
        ) {
            info.usage_area = Some(UsageArea::new(w, s, e, n, area_name));
        }
    }
    info
}

fn ids_of(v: &Value) -> Vec<Identifier> {
    let mut out = Vec::new();
    let mut push = |id: &Value| {
        let auth = id.get("authority").and_then(Value::as_str);
        let code = id.get("code").map(|c| match c {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        if let (Some(auth), Some(code)) = (auth, code) {
            out.push(Identifier::new(auth, code));
        }
    };
    if let Some(id) = v.get("id") {
        push(id);
    }
    if let Some(ids) = v.get("ids").and_then(Value::as_array) {
        for id in ids {
            push(id);
        }
    }
    out
}

fn ellipsoid_from(v: &Value) -> JResult<EllipsoidDef> {
    let a = v
        .get("semi_major_axis")
        .and_then(Value::as_f64)
        .ok_or_else(|| "ellipsoid without semi_major_axis".to_string())?;
    let rf = v
        .get("inverse_flattening")
        .and_then(Value::as_f64)
        .unwrap_or_else(|| {
            match v.get("semi_minor_axis").and_then(Value::as_f64) {
                Some(b) if b != a => a / (a - b),
                _ => 0.0,
            }
        });
    let mut e = EllipsoidDef::new("", a, rf);
    e.info = info_from(v);
    Ok(e)
}

fn prime_meridian_from(v: &Value) -> JResult<PrimeMeridianDef> {
    Ok(PrimeMeridianDef {
        info: info_from(v),
        longitude: v
            .get("longitude")
            .and_then(Value::as_f64)
            .ok_or_else(|| "prime meridian without longitude".to_string())?,
    })
}

fn datum_from(v: &Value, default_kind: DatumKind) -> JResult<DatumDef> {
    let kind = match v.get("type").and_then(Value::as_str) {
        Some("DynamicGeodeticReferenceFrame") => DatumKind::DynamicGeodetic,
        Some("DynamicVerticalReferenceFrame") => DatumKind::DynamicVertical,
        Some("VerticalReferenceFrame") => DatumKind::Vertical,
        _ => default_kind,
    };
    Ok(DatumDef {
        info: info_from(v),
        kind,
        ellipsoid: v.get("ellipsoid").map(ellipsoid_from).transpose()?,
        prime_meridian: v
            .get("prime_meridian")
            .map(prime_meridian_from)
            .transpose()?,
        to_wgs84: None,
    })
}

fn ensemble_from(v: &Value) -> JResult<DatumEnsembleDef> {
    let ellipsoid = v.get("ellipsoid").map(ellipsoid_from).transpose()?;
    let members = v
        .get("members")
        .and_then(Value::as_array)
        .map(|ms| {
            ms.iter()
                .map(|m| DatumDef {
                    info: info_from(m),
                    kind: DatumKind::Geodetic,
                    ellipsoid: ellipsoid.clone(),
                    prime_meridian: Some(PrimeMeridianDef::greenwich()),
                    to_wgs84: None,
                })
                .collect()
        })
        .unwrap_or_default();
    let accuracy = match v.get("accuracy") {
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(DatumEnsembleDef {
        info: info_from(v),
        members,
        accuracy,
    })
}

fn unit_from(v: &Value, fallback: UnitKind) -> UnitDef {
    match v {
        Value::String(s) => match s.as_str() {
            "degree" => UnitDef::degree(),
            "metre" => UnitDef::metre(),
            "unity" => UnitDef::unity(),
            other => UnitDef {
                name: other.to_string(),
                kind: fallback,
                factor: 1.0,
            },
        },
        Value::Object(_) => {
            let kind = match v.get("type").and_then(Value::as_str) {
                Some("AngularUnit") => UnitKind::Angular,
                Some("LinearUnit") => UnitKind::Linear,
                Some("ScaleUnit") => UnitKind::Scale,
                Some("TimeUnit") => UnitKind::Time,
                _ => fallback,
            };
            UnitDef {
                name: v
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                kind,
                factor: v
                    .get("conversion_factor")
                    .and_then(Value::as_f64)
                    .unwrap_or(1.0),
            }
        }
        _ => UnitDef::metre(),
    }
}

fn cs_from(v: &Value) -> JResult<CsDef> {
    let kind = match v.get("subtype").and_then(Value::as_str) {
        Some("ellipsoidal") => CsKind::Ellipsoidal,
        Some("Cartesian") => CsKind::Cartesian,
        Some("vertical") => CsKind::Vertical,
        Some("spherical") => CsKind::Spherical,
        Some(s) if s.starts_with("temporal") || s == "TemporalDateTime" => CsKind::Temporal,
        _ => CsKind::Other,
    };
    let fallback_unit = if kind == CsKind::Ellipsoidal {
        UnitKind::Angular
    } else {
        UnitKind::Linear
    };
    let axes = v
        .get("axis")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .map(|a| AxisDef {
                    name: a.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                    abbreviation: a
                        .get("abbreviation")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    direction: a
                        .get("direction")
                        .and_then(Value::as_str)
                        .and_then(AxisDirection::parse)
                        .unwrap_or(AxisDirection::Unspecified),
                    unit: a
                        .get("unit")
                        .map(|u| unit_from(u, fallback_unit))
                        .unwrap_or_else(|| {
                            if kind == CsKind::Ellipsoidal {
                                UnitDef::degree()
                            } else {
                                UnitDef::metre()
                            }
                        }),
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(CsDef { kind, axes })
}

fn conversion_from(v: &Value) -> JResult<ConversionDef> {
    let method_v = v
        .get("method")
        .ok_or_else(|| "conversion without method".to_string())?;
    let code = ids_of(method_v)
        .first()
        .and_then(|id| id.code().parse().ok());
    Ok(ConversionDef {
        info: info_from(v),
        method: MethodDef::new(
            method_v.get("name").and_then(Value::as_str).unwrap_or_default(),
            code,
        ),
        params: params_from(v)?,
    })
}

fn params_from(v: &Value) -> JResult<Vec<ParamDef>> {
    let mut params = Vec::new();
    if let Some(list) = v.get("parameters").and_then(Value::as_array) {
        for p in list {
            let name = p
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| "parameter without name".to_string())?;
            let value = p
                .get("value")
                .and_then(Value::as_f64)
                .ok_or_else(|| format!("parameter {name:?} without numeric value"))?;
            let unit = p
                .get("unit")
                .map(|u| unit_from(u, UnitKind::Unknown))
                .unwrap_or_else(UnitDef::unity);
            params.push(ParamDef {
                name: name.to_string(),
                value,
                unit,
            });
        }
    }
    Ok(params)
}

fn operation_from(v: &Value) -> JResult<OperationDef> {
    let kind = match v.get("type").and_then(Value::as_str) {
        Some("Conversion") => OperationKind::Conversion,
        Some("ConcatenatedOperation") => OperationKind::Concatenated,
        _ => OperationKind::Transformation,
    };
    let accuracy = match v.get("accuracy") {
        Some(Value::String(s)) => s.parse().ok(),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    };
    let method = v.get("method").map(|m| {
        MethodDef::new(
            m.get("name").and_then(Value::as_str).unwrap_or_default(),
            ids_of(m).first().and_then(|id| id.code().parse().ok()),
        )
    });
    Ok(OperationDef {
        info: info_from(v),
        kind,
        source: v.get("source_crs").map(crs_from).transpose()?.map(Box::new),
        target: v.get("target_crs").map(crs_from).transpose()?.map(Box::new),
        method,
        params: params_from(v)?,
        accuracy,
        steps: Vec::new(),
    })
}

fn crs_from(v: &Value) -> JResult<CrsDef> {
    let ty = v.get("type").and_then(Value::as_str).unwrap_or_default();
    let info = info_from(v);
    match ty {
        "GeographicCRS" | "GeodeticCRS" => {
            let cs = v.get("coordinate_system").map(cs_from).transpose()?.unwrap_or_else(
                || CsDef {
                    kind: CsKind::Ellipsoidal,
                    axes: Vec::new(),
                },
            );
            let datum = if let Some(e) = v.get("datum_ensemble") {
                Some(DatumOrEnsemble::Ensemble(ensemble_from(e)?))
            } else if let Some(d) = v.get("datum") {
                Some(DatumOrEnsemble::Datum(datum_from(d, DatumKind::Geodetic)?))
            } else {
                None
            };
            let kind = if cs.kind == CsKind::Cartesian {
                CrsKind::Geocentric
            } else if cs.dimension() == 3 {
                CrsKind::Geographic3D
            } else {
                CrsKind::Geographic2D
            };
            Ok(CrsDef::new(info, kind, datum, cs))
        }
        "ProjectedCRS" => {
            let base = v
                .get("base_crs")
                .map(crs_from)
                .transpose()?
                .ok_or_else(|| "projected CRS without base_crs".to_string())?;
            let cs = v
                .get("coordinate_system")
                .map(cs_from)
                .transpose()?
                .unwrap_or_else(CsDef::cartesian_east_north);
            let mut crs = CrsDef::new(info, CrsKind::Projected, base.datum.clone(), cs);
            crs.conversion = v.get("conversion").map(conversion_from).transpose()?;
            crs.base = Some(Box::new(base));
            Ok(crs)
        }
        "VerticalCRS" => {
            let datum = v
                .get("datum")
                .map(|d| datum_from(d, DatumKind::Vertical))
                .transpose()?;
            let cs = v
                .get("coordinate_system")
                .map(cs_from)
                .transpose()?
                .unwrap_or_else(CsDef::vertical_up);
            Ok(CrsDef::new(
                info,
                CrsKind::Vertical,
                datum.map(DatumOrEnsemble::Datum),
                cs,
            ))
        }
        "CompoundCRS" => {
            let components = v
                .get("components")
                .and_then(Value::as_array)
                .map(|list| list.iter().map(crs_from).collect::<JResult<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            if components.len() < 2 {
                return Err("compound CRS needs at least two components".to_string());
            }
            let cs = CsDef {
                kind: CsKind::Other,
                axes: components.iter().flat_map(|c| c.cs.axes.clone()).collect(),
            };
            let mut crs = CrsDef::new(info, CrsKind::Compound, components[0].datum.clone(), cs);
            crs.components = components;
            Ok(crs)
        }
        "BoundCRS" => {
            let base = v
                .get("source_crs")
                .map(crs_from)
                .transpose()?
                .ok_or_else(|| "bound CRS without source_crs".to_string())?;
            let hub = v
                .get("target_crs")
                .map(crs_from)
                .transpose()?
                .ok_or_else(|| "bound CRS without target_crs".to_string())?;
            let transform = v
                .get("transformation")
                .map(operation_from)
                .transpose()?;
            let mut crs = CrsDef::new(info, CrsKind::Bound, base.datum.clone(), base.cs.clone());
            crs.base = Some(Box::new(base));
            crs.hub = Some(Box::new(hub));
            crs.bound_transform = transform.map(Box::new);
            Ok(crs)
        }
        "EngineeringCRS" => {
            let cs = v
                .get("coordinate_system")
                .map(cs_from)
                .transpose()?
                .unwrap_or_else(CsDef::cartesian_east_north);
            Ok(CrsDef::new(info, CrsKind::Engineering, None, cs))
        }
        "TemporalCRS" => {
            let cs = v
                .get("coordinate_system")
                .map(cs_from)
                .transpose()?
                .unwrap_or(CsDef {
                    kind: CsKind::Temporal,
                    axes: Vec::new(),
                });
            Ok(CrsDef::new(info, CrsKind::Temporal, None, cs))
        }
        other => Err(format!("unsupported CRS type {other:?}")),
    }
}

// ---------------------------------------------------------------------------
// Export

pub(crate) fn write_def(def: &Def, options: &ProjJsonOptions) -> Result<Option<String>, Error> {
    let mut value = match def {
        Def::Placeholder | Def::CoordinateSystem(_) => return Ok(None),
        Def::Crs(crs) => crs_json(crs),
        Def::Ellipsoid(e) => ellipsoid_json(e),
        Def::PrimeMeridian(pm) => {
            with_info(&pm.info, json!({"type": "PrimeMeridian", "longitude": pm.longitude}))
        }
        Def::Datum(d) => datum_json(d),
        Def::DatumEnsemble(e) => ensemble_json(e),
        Def::Operation(op) => operation_json(op),
    };
    if let Value::Object(map) = &mut value {
        let mut with_schema = Map::new();
        with_schema.insert(
            "$schema".to_string(),
            Value::String(options.variant.schema_url().to_string()),
        );
        with_schema.append(map);
        value = Value::Object(with_schema);
    }
    let text = if options.no_multi_line {
        serde_json::to_string(&value)
    } else if options.no_indentation {
        let mut out = Vec::new();
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, fmt);
        serde::Serialize::serialize(&value, &mut ser)
            .map(|_| String::from_utf8_lossy(&out).into_owned())
    } else {
        serde_json::to_string_pretty(&value)
    }
    .map_err(|e| Error::InvalidParameter(e.to_string()))?;
    Ok(Some(text))
}

fn with_info(info: &ObjectInfo, mut value: Value) -> Value {
    if let Value::Object(map) = &mut value {
        map.insert("name".into(), Value::String(info.name.clone()));
        if let Some(scope) = &info.scope {
            map.insert("scope".into(), Value::String(scope.clone()));
        }
        if let Some(area) = &info.usage_area {
            if !area.name.is_empty() {
                map.insert("area".into(), Value::String(area.name.clone()));
            }
            map.insert(
                "bbox".into(),
                json!({
                    "south_latitude": area.south,
                    "west_longitude": area.west,
                    "north_latitude": area.north,
                    "east_longitude": area.east,
                }),
            );
        }
        if let Some(remarks) = &info.remarks {
            map.insert("remarks".into(), Value::String(remarks.clone()));
        }
        if let Some(id) = info.identifiers.first() {
            let code: Value = match id.code().parse::<i64>() {
                Ok(n) => json!(n),
                Err(_) => Value::String(id.code().to_string()),
            };
            map.insert("id".into(), json!({"authority": id.authority(), "code": code}));
        }
    }
    value
}

fn unit_json(unit: &UnitDef) -> Value {
    let standard = matches!(
        (unit.kind, unit.name.as_str()),
        (UnitKind::Angular, "degree") | (UnitKind::Linear, "metre") | (UnitKind::Scale, "unity")
    );
    if standard {
        Value::String(unit.name.clone())
    } else {
        let ty = match unit.kind {
            UnitKind::Angular => "AngularUnit",
            UnitKind::Linear => "LinearUnit",
            UnitKind::Scale => "ScaleUnit",
            UnitKind::Time => "TimeUnit",
            UnitKind::Unknown => "Unit",
        };
        json!({"type": ty, "name": unit.name, "conversion_factor": unit.factor})
    }
}

fn ellipsoid_json(e: &EllipsoidDef) -> Value {
    let mut v = json!({
        "type": "Ellipsoid",
        "semi_major_axis": e.semi_major,
    });
    if let Value::Object(map) = &mut v {
        if e.is_sphere() {
            map.insert("radius".into(), json!(e.semi_major));
        } else {
            map.insert("inverse_flattening".into(), json!(e.inverse_flattening));
        }
    }
    with_info(&e.info, v)
}

fn datum_json(d: &DatumDef) -> Value {
    let ty = match d.kind {
        DatumKind::Geodetic => "GeodeticReferenceFrame",
        DatumKind::DynamicGeodetic => "DynamicGeodeticReferenceFrame",
        DatumKind::Vertical => "VerticalReferenceFrame",
        DatumKind::DynamicVertical => "DynamicVerticalReferenceFrame",
        DatumKind::Temporal => "TemporalDatum",
        DatumKind::Engineering => "EngineeringDatum",
        DatumKind::Parametric => "ParametricDatum",
    };
    let mut v = json!({"type": ty});
    if let Value::Object(map) = &mut v {
        if let Some(e) = &d.ellipsoid {
            map.insert("ellipsoid".into(), ellipsoid_json(e));
        }
        if let Some(pm) = &d.prime_meridian {
            if pm.longitude != 0.0 {
                map.insert(
                    "prime_meridian".into(),
                    with_info(&pm.info, json!({"longitude": pm.longitude})),
                );
            }
        }
    }
    with_info(&d.info, v)
}

fn ensemble_json(e: &DatumEnsembleDef) -> Value {
    let members: Vec<Value> = e
        .members
        .iter()
        .map(|m| with_info(&m.info, json!({})))
        .collect();
    let mut v = json!({
        "type": "DatumEnsemble",
        "members": members,
        "accuracy": format!("{}", e.accuracy),
    });
    if let Value::Object(map) = &mut v {
        if let Some(ellipsoid) = e.members.first().and_then(|m| m.ellipsoid.as_ref()) {
            map.insert("ellipsoid".into(), ellipsoid_json(ellipsoid));
        }
    }
    with_info(&e.info, v)
}

fn cs_json(cs: &CsDef) -> Value {
    let subtype = match cs.kind {
        CsKind::Ellipsoidal => "ellipsoidal",
        CsKind::Cartesian => "Cartesian",
        CsKind::Vertical => "vertical",
        CsKind::Spherical => "spherical",
        CsKind::Temporal => "temporal",
        CsKind::Other => "ordinal",
    };
    let axes: Vec<Value> = cs
        .axes
        .iter()
        .map(|a| {
            json!({
                "name": a.name,
                "abbreviation": a.abbreviation,
                "direction": a.direction.as_wkt(),
                "unit": unit_json(&a.unit),
            })
        })
        .collect();
    json!({"subtype": subtype, "axis": axes})
}

fn conversion_json(conv: &ConversionDef) -> Value {
    let mut method = json!({"name": conv.method.name});
    if let (Value::Object(map), Some(code)) = (&mut method, conv.method.code) {
        map.insert("id".into(), json!({"authority": "EPSG", "code": code}));
    }
    let params: Vec<Value> = conv
        .params
        .iter()
        .map(|p| json!({"name": p.name, "value": p.value, "unit": unit_json(&p.unit)}))
        .collect();
    with_info(
        &conv.info,
        json!({"type": "Conversion", "method": method, "parameters": params}),
    )
}

fn operation_json(op: &OperationDef) -> Value {
    let ty = match op.kind {
        OperationKind::Conversion => "Conversion",
        OperationKind::Concatenated => "ConcatenatedOperation",
        _ => "Transformation",
    };
    let mut v = json!({"type": ty});
    if let Value::Object(map) = &mut v {
        if let Some(src) = &op.source {
            map.insert("source_crs".into(), crs_json(src));
        }
        if let Some(dst) = &op.target {
            map.insert("target_crs".into(), crs_json(dst));
        }
        if let Some(m) = &op.method {
            let mut method = json!({"name": m.name});
            if let (Value::Object(mm), Some(code)) = (&mut method, m.code) {
                mm.insert("id".into(), json!({"authority": "EPSG", "code": code}));
            }
            map.insert("method".into(), method);
        }
        let params: Vec<Value> = op
            .params
            .iter()
            .map(|p| json!({"name": p.name, "value": p.value, "unit": unit_json(&p.unit)}))
            .collect();
        if !params.is_empty() {
            map.insert("parameters".into(), Value::Array(params));
        }
        if let Some(acc) = op.accuracy {
            map.insert("accuracy".into(), Value::String(format!("{acc}")));
        }
    }
    with_info(&op.info, v)
}

fn crs_json(crs: &CrsDef) -> Value {
    match crs.kind {
        CrsKind::Geographic2D | CrsKind::Geographic3D | CrsKind::Geocentric => {
            let ty = if crs.kind == CrsKind::Geocentric {
                "GeodeticCRS"
            } else {
                "GeographicCRS"
            };
            let mut v = json!({"type": ty, "coordinate_system": cs_json(&crs.cs)});
            if let Value::Object(map) = &mut v {
                match &crs.datum {
                    Some(DatumOrEnsemble::Ensemble(e)) => {
                        map.insert("datum_ensemble".into(), ensemble_json(e));
                    }
                    Some(DatumOrEnsemble::Datum(d)) => {
                        map.insert("datum".into(), datum_json(d));
                    }
                    None => {}
                }
            }
            with_info(&crs.info, v)
        }
        CrsKind::Projected => {
            let mut v = json!({
                "type": "ProjectedCRS",
                "coordinate_system": cs_json(&crs.cs),
            });
            if let Value::Object(map) = &mut v {
                if let Some(base) = &crs.base {
                    map.insert("base_crs".into(), crs_json(base));
                }
                if let Some(conv) = &crs.conversion {
                    map.insert("conversion".into(), conversion_json(conv));
                }
            }
            with_info(&crs.info, v)
        }
        CrsKind::Vertical => {
            let mut v = json!({"type": "VerticalCRS", "coordinate_system": cs_json(&crs.cs)});
            if let (Value::Object(map), Some(DatumOrEnsemble::Datum(d))) = (&mut v, &crs.datum) {
                map.insert("datum".into(), datum_json(d));
            }
            with_info(&crs.info, v)
        }
        CrsKind::Compound => {
            let components: Vec<Value> = crs.components.iter().map(crs_json).collect();
            with_info(&crs.info, json!({"type": "CompoundCRS", "components": components}))
        }
        CrsKind::Bound => {
            let mut v = json!({"type": "BoundCRS"});
            if let Value::Object(map) = &mut v {
                if let Some(base) = &crs.base {
                    map.insert("source_crs".into(), crs_json(base));
                }
                if let Some(hub) = &crs.hub {
                    map.insert("target_crs".into(), crs_json(hub));
                }
                if let Some(tr) = &crs.bound_transform {
                    map.insert("transformation".into(), operation_json(tr));
                }
            }
            with_info(&crs.info, v)
        }
        CrsKind::Temporal => with_info(
            &crs.info,
            json!({"type": "TemporalCRS", "coordinate_system": cs_json(&crs.cs)}),
        ),
        CrsKind::Engineering | CrsKind::Other => with_info(
            &crs.info,
            json!({"type": "EngineeringCRS", "coordinate_system": cs_json(&crs.cs)}),
        ),
    }
}

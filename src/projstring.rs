//! PROJ string import and export.
//!
//! Covers the `+key=value` dialect for the supported projection methods;
//! pipelines are not expressed in this form.

use std::collections::HashMap;

use crate::error::Error;
use crate::model::{
    ConversionDef, CrsDef, CrsKind, CsDef, DatumDef, DatumOrEnsemble, EllipsoidDef, MethodDef,
    ObjectInfo, ParamDef, PrimeMeridianDef, UnitDef,
};
use crate::object::{ProjStringOptions, ProjStringVariant};
use crate::proj::methods;

pub(crate) fn parse(text: &str) -> Result<CrsDef, Error> {
    let mut keys: HashMap<String, String> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for token in text.split_whitespace() {
        let token = token.strip_prefix('+').unwrap_or(token);
        if token.is_empty() {
            continue;
        }
        let (key, value) = match token.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (token.to_string(), String::new()),
        };
        if !keys.contains_key(&key) {
            order.push(key.clone());
        }
        keys.insert(key, value);
    }

    let proj = keys
        .get("proj")
        .cloned()
        .ok_or_else(|| Error::parse(text, "missing +proj"))?;

    let num = |key: &str| -> Result<Option<f64>, Error> {
        keys.get(key)
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|_| Error::parse(text, format!("bad number for +{key}={v}")))
            })
            .transpose()
    };

    // Reference frame.
    let mut datum = match keys.get("datum") {
        Some(name) => DatumDef::from_short_name(name)
            .ok_or_else(|| Error::parse(text, format!("unknown +datum={name}")))?,
        None => {
            let ellipsoid = match keys.get("ellps") {
                Some(name) => EllipsoidDef::from_short_name(name)
                    .ok_or_else(|| Error::parse(text, format!("unknown +ellps={name}")))?,
                None => match (num("a")?, num("b")?, num("rf")?) {
                    (Some(a), _, Some(rf)) => EllipsoidDef::new("unknown", a, rf),
                    (Some(a), Some(b), None) => {
                        let rf = if a == b { 0.0 } else { a / (a - b) };
                        EllipsoidDef::new("unknown", a, rf)
                    }
                    (Some(a), None, None) => EllipsoidDef::new("unknown", a, 0.0),
                    _ => EllipsoidDef::wgs84(),
                },
            };
            let mut d = DatumDef::geodetic("unknown", ellipsoid);
            d.info.name = "unknown".into();
            d
        }
    };
    if let Some(tw) = keys.get("towgs84") {
        let values: Result<Vec<f64>, _> = tw.split(',').map(|v| v.trim().parse::<f64>()).collect();
        let values = values.map_err(|_| Error::parse(text, "bad +towgs84 list"))?;
        if values.len() != 3 && values.len() != 7 {
            return Err(Error::parse(text, "+towgs84 needs 3 or 7 values"));
        }
        datum.to_wgs84 = Some(values);
    }
    if let Some(pm) = keys.get("pm") {
        let meridian = PrimeMeridianDef::from_short_name(pm).or_else(|| {
            pm.parse::<f64>().ok().map(|lon| PrimeMeridianDef {
                info: ObjectInfo::named("unknown"),
                longitude: lon,
            })
        });
        datum.prime_meridian =
            Some(meridian.ok_or_else(|| Error::parse(text, format!("unknown +pm={pm}")))?);
    }

    let geographic = |datum: DatumDef| {
        CrsDef::new(
            ObjectInfo::named("unknown"),
            CrsKind::Geographic2D,
            Some(DatumOrEnsemble::Datum(datum)),
            CsDef::ellipsoidal_2d_lon_lat(),
        )
    };

    match proj.as_str() {
        "longlat" | "latlong" | "latlon" | "lonlat" => Ok(geographic(datum)),
        "geocent" => Ok(CrsDef::new(
            ObjectInfo::named("unknown"),
            CrsKind::Geocentric,
            Some(DatumOrEnsemble::Datum(datum)),
            CsDef::geocentric(),
        )),
        "utm" => {
            let zone = num("zone")?
                .ok_or_else(|| Error::parse(text, "+proj=utm needs +zone"))?
                as u32;
            if !(1..=60).contains(&zone) {
                return Err(Error::parse(text, format!("UTM zone {zone} out of range")));
            }
            let south = keys.contains_key("south");
            let conv = ConversionDef {
                info: ObjectInfo::named(format!(
                    "UTM zone {zone}{}",
                    if south { "S" } else { "N" }
                )),
                method: MethodDef::new("Transverse Mercator", Some(methods::METHOD_TRANSVERSE_MERCATOR)),
                params: vec![
                    ParamDef::angular("Latitude of natural origin", 0.0),
                    ParamDef::angular("Longitude of natural origin", -183.0 + 6.0 * zone as f64),
                    ParamDef::scale("Scale factor at natural origin", 0.9996),
                    ParamDef::linear("False easting", 500_000.0),
                    ParamDef::linear("False northing", if south { 10_000_000.0 } else { 0.0 }),
                ],
            };
            Ok(projected(datum, conv, linear_unit(&keys, text)?))
        }
        "tmerc" | "merc" | "webmerc" | "lcc" => {
            let lat0 = num("lat_0")?.unwrap_or(0.0);
            let lon0 = num("lon_0")?.unwrap_or(0.0);
            let k0 = num("k_0")?.or(num("k")?).unwrap_or(1.0);
            let x0 = num("x_0")?.unwrap_or(0.0);
            let y0 = num("y_0")?.unwrap_or(0.0);
            let conv = match proj.as_str() {
                "tmerc" => ConversionDef {
                    info: ObjectInfo::named("unknown"),
                    method: MethodDef::new(
                        "Transverse Mercator",
                        Some(methods::METHOD_TRANSVERSE_MERCATOR),
                    ),
                    params: vec![
                        ParamDef::angular("Latitude of natural origin", lat0),
                        ParamDef::angular("Longitude of natural origin", lon0),
                        ParamDef::scale("Scale factor at natural origin", k0),
                        ParamDef::linear("False easting", x0),
                        ParamDef::linear("False northing", y0),
                    ],
                },
                "merc" => match num("lat_ts")? {
                    Some(lat_ts) => ConversionDef {
                        info: ObjectInfo::named("unknown"),
                        method: MethodDef::new(
                            "Mercator (variant B)",
                            Some(methods::METHOD_MERCATOR_B),
                        ),
                        params: vec![
                            ParamDef::angular("Latitude of 1st standard parallel", lat_ts),
                            ParamDef::angular("Longitude of natural origin", lon0),
                            ParamDef::linear("False easting", x0),
                            ParamDef::linear("False northing", y0),
                        ],
                    },
                    None => ConversionDef {
                        info: ObjectInfo::named("unknown"),
                        method: MethodDef::new(
                            "Mercator (variant A)",
                            Some(methods::METHOD_MERCATOR_A),
                        ),
                        params: vec![
                            ParamDef::angular("Longitude of natural origin", lon0),
                            ParamDef::scale("Scale factor at natural origin", k0),
                            ParamDef::linear("False easting", x0),
                            ParamDef::linear("False northing", y0),
                        ],
                    },
                },
                "webmerc" => ConversionDef {
                    info: ObjectInfo::named("unknown"),
                    method: MethodDef::new(
                        "Popular Visualisation Pseudo Mercator",
                        Some(methods::METHOD_PSEUDO_MERCATOR),
                    ),
                    params: vec![
                        ParamDef::angular("Longitude of natural origin", lon0),
                        ParamDef::linear("False easting", x0),
                        ParamDef::linear("False northing", y0),
                    ],
                },
                _ => {
                    let lat1 = num("lat_1")?;
                    let lat2 = num("lat_2")?;
                    match (lat1, lat2) {
                        (Some(lat1), Some(lat2)) => ConversionDef {
                            info: ObjectInfo::named("unknown"),
                            method: MethodDef::new(
                                "Lambert Conic Conformal (2SP)",
                                Some(methods::METHOD_LCC_2SP),
                            ),
                            params: vec![
                                ParamDef::angular("Latitude of false origin", lat0),
                                ParamDef::angular("Longitude of false origin", lon0),
                                ParamDef::angular("Latitude of 1st standard parallel", lat1),
                                ParamDef::angular("Latitude of 2nd standard parallel", lat2),
                                ParamDef::linear("Easting at false origin", x0),
                                ParamDef::linear("Northing at false origin", y0),
                            ],
                        },
                        _ => ConversionDef {
                            info: ObjectInfo::named("unknown"),
                            method: MethodDef::new(
                                "Lambert Conic Conformal (1SP)",
                                Some(methods::METHOD_LCC_1SP),
                            ),
                            params: vec![
                                ParamDef::angular(
                                    "Latitude of natural origin",
                                    lat1.unwrap_or(lat0),
                                ),
                                ParamDef::angular("Longitude of natural origin", lon0),
                                ParamDef::scale("Scale factor at natural origin", k0),
                                ParamDef::linear("False easting", x0),
                                ParamDef::linear("False northing", y0),
                            ],
                        },
                    }
                }
            };
            Ok(projected(datum, conv, linear_unit(&keys, text)?))
        }
        other => Err(Error::parse(text, format!("unsupported +proj={other}"))),
    }
}

fn linear_unit(keys: &HashMap<String, String>, text: &str) -> Result<UnitDef, Error> {
    if let Some(to_meter) = keys.get("to_meter") {
        let factor: f64 = to_meter
            .parse()
            .map_err(|_| Error::parse(text, "bad +to_meter"))?;
        return Ok(UnitDef::linear("unknown", factor));
    }
    match keys.get("units") {
        Some(u) => UnitDef::from_linear_short_name(u)
            .ok_or_else(|| Error::parse(text, format!("unknown +units={u}"))),
        None => Ok(UnitDef::metre()),
    }
}

fn projected(datum: DatumDef, conversion: ConversionDef, unit: UnitDef) -> CrsDef {
    let base = CrsDef::new(
        ObjectInfo::named("unknown"),
        CrsKind::Geographic2D,
        Some(DatumOrEnsemble::Datum(datum)),
        CsDef::ellipsoidal_2d_lon_lat(),
    );
    let mut cs = CsDef::cartesian_east_north();
    for axis in &mut cs.axes {
        axis.unit = unit.clone();
    }
    let mut crs = CrsDef::new(
        ObjectInfo::named("unknown"),
        CrsKind::Projected,
        base.datum.clone(),
        cs,
    );
    crs.base = Some(Box::new(base));
    crs.conversion = Some(conversion);
    crs
}

// ---------------------------------------------------------------------------
// Export

pub(crate) fn write_crs(crs: &CrsDef, options: &ProjStringOptions) -> Result<String, Error> {
    let mut parts: Vec<String> = Vec::new();
    match crs.kind {
        CrsKind::Geographic2D | CrsKind::Geographic3D => {
            parts.push("+proj=longlat".into());
            push_frame(&mut parts, crs);
        }
        CrsKind::Geocentric => {
            parts.push("+proj=geocent".into());
            push_frame(&mut parts, crs);
        }
        CrsKind::Projected => {
            let conv = crs.conversion.as_ref().ok_or_else(|| {
                Error::InvalidParameter("projected CRS without a conversion".into())
            })?;
            push_conversion(&mut parts, conv, options)?;
            push_frame(&mut parts, crs);
            if let Some(axis) = crs.cs.axes.first() {
                if (axis.unit.factor - 1.0).abs() > 1e-12 {
                    parts.push(format!("+to_meter={}", fmt(axis.unit.factor)));
                } else {
                    parts.push("+units=m".into());
                }
            }
        }
        CrsKind::Bound => {
            let base = crs
                .base
                .as_deref()
                .ok_or_else(|| Error::InvalidParameter("bound CRS without a source".into()))?;
            let mut flat = base.clone();
            if let (Some(DatumOrEnsemble::Datum(d)), Some(tr)) =
                (&mut flat.datum, &crs.bound_transform)
            {
                if let Some(values) = tr.helmert_values() {
                    d.to_wgs84 = Some(values);
                }
            }
            return write_crs(&flat, options);
        }
        _ => {
            return Err(Error::InvalidParameter(format!(
                "a {:?} CRS has no PROJ string form",
                crs.kind
            )))
        }
    }

    match options.variant {
        ProjStringVariant::Proj4 => parts.push("+no_defs".into()),
        ProjStringVariant::Proj5 => parts.push("+type=crs".into()),
    }

    let separator = if options.multi_line {
        if options.no_indentation {
            "\n".to_string()
        } else {
            "\n    ".to_string()
        }
    } else {
        " ".to_string()
    };
    Ok(parts.join(&separator))
}

fn push_frame(parts: &mut Vec<String>, crs: &CrsDef) {
    let datum = crs.horizontal_datum().map(DatumOrEnsemble::forced_datum);
    let Some(datum) = datum else {
        parts.push("+ellps=WGS84".into());
        return;
    };
    match datum.short_name() {
        Some(short) => parts.push(format!("+datum={short}")),
        None => {
            match datum.ellipsoid.as_ref().and_then(|e| e.short_name()) {
                Some(ellps) => parts.push(format!("+ellps={ellps}")),
                None => {
                    if let Some(e) = &datum.ellipsoid {
                        parts.push(format!("+a={}", fmt(e.semi_major)));
                        if e.is_sphere() {
                            parts.push(format!("+b={}", fmt(e.semi_major)));
                        } else {
                            parts.push(format!("+rf={}", fmt(e.inverse_flattening)));
                        }
                    }
                }
            }
            if let Some(tw) = &datum.to_wgs84 {
                let list: Vec<String> = tw.iter().map(|v| fmt(*v)).collect();
                parts.push(format!("+towgs84={}", list.join(",")));
            }
        }
    }
    if let Some(pm) = &datum.prime_meridian {
        if pm.longitude != 0.0 {
            parts.push(format!("+pm={}", fmt(pm.longitude)));
        }
    }
}

fn push_conversion(
    parts: &mut Vec<String>,
    conv: &ConversionDef,
    options: &ProjStringOptions,
) -> Result<(), Error> {
    let deg = crate::model::DEG_TO_RAD;
    let ang = |names: &[&str]| conv.param(names).map(|v| v / deg).unwrap_or(0.0);
    let lin = |names: &[&str]| conv.param(names).unwrap_or(0.0);

    let lat0 = ang(&["Latitude of natural origin", "Latitude of false origin", "latitude_of_origin", "lat_0"]);
    let lon0 = ang(&["Longitude of natural origin", "Longitude of false origin", "central_meridian", "lon_0"]);
    let k0 = conv
        .param(&["Scale factor at natural origin", "scale_factor", "k_0"])
        .unwrap_or(1.0);
    let x0 = lin(&["False easting", "Easting at false origin", "false_easting", "x_0"]);
    let y0 = lin(&["False northing", "Northing at false origin", "false_northing", "y_0"]);

    match crate::model::equivalence::normalize_name(&conv.method.name).as_str() {
        "transversemercator" | "gausskruger" => {
            // UTM keeps its compact spelling when the parameters line up.
            let lon_zone = (lon0 + 183.0) / 6.0;
            let is_utm = lat0 == 0.0
                && k0 == 0.9996
                && x0 == 500_000.0
                && (y0 == 0.0 || y0 == 10_000_000.0)
                && lon_zone.fract() == 0.0
                && (1.0..=60.0).contains(&lon_zone);
            if is_utm {
                parts.push("+proj=utm".into());
                parts.push(format!("+zone={}", lon_zone as u32));
                if y0 == 10_000_000.0 {
                    parts.push("+south".into());
                }
            } else {
                parts.push("+proj=tmerc".into());
                if options.write_approx_flag {
                    parts.push("+approx".into());
                }
                parts.push(format!("+lat_0={}", fmt(lat0)));
                parts.push(format!("+lon_0={}", fmt(lon0)));
                parts.push(format!("+k={}", fmt(k0)));
                parts.push(format!("+x_0={}", fmt(x0)));
                parts.push(format!("+y_0={}", fmt(y0)));
            }
        }
        "mercatorvarianta" | "mercator1sp" => {
            parts.push("+proj=merc".into());
            parts.push(format!("+lon_0={}", fmt(lon0)));
            parts.push(format!("+k={}", fmt(k0)));
            parts.push(format!("+x_0={}", fmt(x0)));
            parts.push(format!("+y_0={}", fmt(y0)));
        }
        "mercatorvariantb" | "mercator2sp" => {
            parts.push("+proj=merc".into());
            parts.push(format!(
                "+lat_ts={}",
                fmt(ang(&["Latitude of 1st standard parallel", "standard_parallel_1", "lat_ts"]))
            ));
            parts.push(format!("+lon_0={}", fmt(lon0)));
            parts.push(format!("+x_0={}", fmt(x0)));
            parts.push(format!("+y_0={}", fmt(y0)));
        }
        "popularvisualisationpseudomercator" | "popularvisualizationpseudomercator"
        | "webmercator" => {
            parts.push("+proj=webmerc".into());
            parts.push(format!("+lon_0={}", fmt(lon0)));
            parts.push(format!("+x_0={}", fmt(x0)));
            parts.push(format!("+y_0={}", fmt(y0)));
        }
        "lambertconicconformal1sp" | "lambertconformalconic1sp" => {
            parts.push("+proj=lcc".into());
            parts.push(format!("+lat_1={}", fmt(lat0)));
            parts.push(format!("+lat_0={}", fmt(lat0)));
            parts.push(format!("+lon_0={}", fmt(lon0)));
            parts.push(format!("+k_0={}", fmt(k0)));
            parts.push(format!("+x_0={}", fmt(x0)));
            parts.push(format!("+y_0={}", fmt(y0)));
        }
        "lambertconicconformal2sp" | "lambertconformalconic2sp" | "lambertconformalconic" => {
            parts.push("+proj=lcc".into());
            parts.push(format!(
                "+lat_0={}",
                fmt(ang(&["Latitude of false origin", "latitude_of_origin", "lat_0"]))
            ));
            parts.push(format!(
                "+lon_0={}",
                fmt(ang(&["Longitude of false origin", "central_meridian", "lon_0"]))
            ));
            parts.push(format!(
                "+lat_1={}",
                fmt(ang(&["Latitude of 1st standard parallel", "standard_parallel_1", "lat_1"]))
            ));
            parts.push(format!(
                "+lat_2={}",
                fmt(ang(&["Latitude of 2nd standard parallel", "standard_parallel_2", "lat_2"]))
            ));
            parts.push(format!(
                "+x_0={}",
                fmt(lin(&["Easting at false origin", "false_easting", "x_0"]))
            ));
            parts.push(format!(
                "+y_0={}",
                fmt(lin(&["Northing at false origin", "false_northing", "y_0"]))
            ));
        }
        other => {
            return Err(Error::InvalidParameter(format!(
                "method {other:?} has no PROJ string form"
            )))
        }
    }
    Ok(())
}

fn fmt(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AxisDirection;

    #[test]
    fn test_parse_longlat() {
        let crs = parse("+proj=longlat +datum=WGS84 +no_defs").unwrap();
        assert_eq!(crs.kind, CrsKind::Geographic2D);
        // PROJ strings are always in GIS order.
        assert_eq!(crs.cs.axes[0].direction, AxisDirection::East);
        assert_eq!(crs.ellipsoid().unwrap().semi_major, 6_378_137.0);
    }

    #[test]
    fn test_parse_utm() {
        let crs = parse("+proj=utm +zone=33 +ellps=WGS84").unwrap();
        assert_eq!(crs.kind, CrsKind::Projected);
        let conv = crs.conversion.as_ref().unwrap();
        let lon0 = conv.param(&["Longitude of natural origin"]).unwrap();
        assert!((lon0 - 15f64.to_radians()).abs() < 1e-12);
        let crs_south = parse("+proj=utm +zone=33 +south +ellps=WGS84").unwrap();
        let fn_ = crs_south
            .conversion
            .as_ref()
            .unwrap()
            .param(&["False northing"])
            .unwrap();
        assert_eq!(fn_, 10_000_000.0);
    }

    #[test]
    fn test_parse_towgs84() {
        let crs = parse("+proj=longlat +ellps=intl +towgs84=-87,-98,-121").unwrap();
        match crs.datum.as_ref().unwrap() {
            DatumOrEnsemble::Datum(d) => {
                assert_eq!(d.to_wgs84.as_deref(), Some(&[-87.0, -98.0, -121.0][..]));
            }
            _ => panic!("expected a plain datum"),
        }
        assert!(parse("+proj=longlat +towgs84=1,2").is_err());
    }

    #[test]
    fn test_parse_custom_ellipsoid() {
        let crs = parse("+proj=longlat +a=6378388 +rf=297").unwrap();
        let e = crs.ellipsoid().unwrap();
        assert_eq!(e.semi_major, 6_378_388.0);
        assert_eq!(e.inverse_flattening, 297.0);
    }

    #[test]
    fn test_parse_lcc_two_parallels() {
        let crs =
            parse("+proj=lcc +lat_0=46.5 +lon_0=3 +lat_1=49 +lat_2=44 +x_0=700000 +y_0=6600000 +ellps=GRS80")
                .unwrap();
        let conv = crs.conversion.as_ref().unwrap();
        assert_eq!(conv.method.code, Some(crate::proj::methods::METHOD_LCC_2SP));
    }

    #[test]
    fn test_parse_units() {
        let crs = parse("+proj=tmerc +lon_0=0 +units=us-ft +ellps=GRS80").unwrap();
        let unit = &crs.cs.axes[0].unit;
        assert!((unit.factor - 1200.0 / 3937.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_unknown_proj_fails() {
        assert!(matches!(
            parse("+proj=collignon").unwrap_err(),
            Error::DefinitionParse { .. }
        ));
        assert!(parse("+ellps=WGS84").is_err());
    }

    #[test]
    fn test_write_geographic_proj4_and_proj5() {
        let crs = CrsDef::wgs84_2d();
        let p5 = write_crs(&crs, &ProjStringOptions::default()).unwrap();
        assert_eq!(p5, "+proj=longlat +datum=WGS84 +type=crs");
        let p4 = write_crs(
            &crs,
            &ProjStringOptions {
                variant: ProjStringVariant::Proj4,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(p4.ends_with("+no_defs"));
    }

    #[test]
    fn test_write_round_trips_through_parse() {
        let crs = parse("+proj=utm +zone=33 +ellps=WGS84").unwrap();
        let text = write_crs(&crs, &ProjStringOptions::default()).unwrap();
        assert!(text.contains("+proj=utm"));
        assert!(text.contains("+zone=33"));
        let again = parse(&text).unwrap();
        assert_eq!(again.kind, CrsKind::Projected);
    }

    #[test]
    fn test_write_tmerc_with_approx_flag() {
        let crs = parse("+proj=tmerc +lat_0=1 +lon_0=9 +k=1 +x_0=0 +y_0=0 +ellps=bessel").unwrap();
        let text = write_crs(
            &crs,
            &ProjStringOptions {
                write_approx_flag: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(text.contains("+approx"));
        assert!(text.contains("+ellps=bessel"));
    }

    #[test]
    fn test_write_multi_line() {
        let crs = CrsDef::wgs84_2d();
        let text = write_crs(
            &crs,
            &ProjStringOptions {
                multi_line: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(text.contains("\n    +datum=WGS84"));
    }

    #[test]
    fn test_vertical_has_no_proj_string() {
        let crs = CrsDef::new(
            ObjectInfo::named("NAVD88 height"),
            CrsKind::Vertical,
            None,
            CsDef::vertical_up(),
        );
        assert!(matches!(
            write_crs(&crs, &ProjStringOptions::default()),
            Err(Error::InvalidParameter(_))
        ));
    }
}

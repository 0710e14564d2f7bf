//! Dispatch from an EPSG conversion method to a concrete projection.

use crate::error::Error;
use crate::model::equivalence::normalize_name;
use crate::model::ConversionDef;
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::lambert_conformal::LambertConformalConic;
use crate::proj::mercator::{Mercator, PseudoMercator};
use crate::proj::transverse_mercator::TransverseMercator;
use crate::proj::Projection;

pub(crate) const METHOD_TRANSVERSE_MERCATOR: u32 = 9807;
pub(crate) const METHOD_MERCATOR_A: u32 = 9804;
pub(crate) const METHOD_MERCATOR_B: u32 = 9805;
pub(crate) const METHOD_LCC_1SP: u32 = 9801;
pub(crate) const METHOD_LCC_2SP: u32 = 9802;
pub(crate) const METHOD_PSEUDO_MERCATOR: u32 = 1024;

/// Resolve a conversion's method to its EPSG code, by code or by any of the
/// method's known spellings.
fn method_code(conv: &ConversionDef) -> Option<u32> {
    if let Some(code) = conv.method.code {
        return Some(code);
    }
    match normalize_name(&conv.method.name).as_str() {
        "transversemercator" | "gausskruger" => Some(METHOD_TRANSVERSE_MERCATOR),
        "mercatorvarianta" | "mercator1sp" => Some(METHOD_MERCATOR_A),
        "mercatorvariantb" | "mercator2sp" => Some(METHOD_MERCATOR_B),
        "lambertconicconformal1sp" | "lambertconformalconic1sp" => Some(METHOD_LCC_1SP),
        "lambertconicconformal2sp" | "lambertconformalconic2sp" | "lambertconformalconic" => {
            Some(METHOD_LCC_2SP)
        }
        "popularvisualisationpseudomercator" | "popularvisualizationpseudomercator"
        | "webmercator" => Some(METHOD_PSEUDO_MERCATOR),
        _ => None,
    }
}

/// Instantiate the projection described by `conv` on `ellipsoid`.
///
/// An unrecognized method is not a parse failure (the object model keeps
/// it); only the numeric pipeline refuses it.
pub(crate) fn projection_for(
    conv: &ConversionDef,
    ellipsoid: Ellipsoid,
) -> Result<Box<dyn Projection>, Error> {
    let lat0 = conv
        .param(&["Latitude of natural origin", "latitude_of_origin", "lat_0"])
        .unwrap_or(0.0);
    let lon0 = conv
        .param(&["Longitude of natural origin", "central_meridian", "lon_0"])
        .unwrap_or(0.0);
    let k0 = conv
        .param(&["Scale factor at natural origin", "scale_factor", "k_0"])
        .unwrap_or(1.0);
    let fe = conv
        .param(&["False easting", "false_easting", "x_0"])
        .unwrap_or(0.0);
    let fn_ = conv
        .param(&["False northing", "false_northing", "y_0"])
        .unwrap_or(0.0);

    match method_code(conv) {
        Some(METHOD_TRANSVERSE_MERCATOR) => Ok(Box::new(TransverseMercator::new(
            ellipsoid, lon0, lat0, k0, fe, fn_,
        ))),
        Some(METHOD_MERCATOR_A) => Ok(Box::new(Mercator::with_scale_factor(
            ellipsoid, lon0, k0, fe, fn_,
        ))),
        Some(METHOD_MERCATOR_B) => {
            let lat_ts = conv
                .param(&[
                    "Latitude of 1st standard parallel",
                    "standard_parallel_1",
                    "lat_ts",
                ])
                .unwrap_or(0.0);
            Ok(Box::new(Mercator::with_standard_parallel(
                ellipsoid, lon0, lat_ts, fe, fn_,
            )))
        }
        Some(METHOD_PSEUDO_MERCATOR) => {
            Ok(Box::new(PseudoMercator::new(ellipsoid, lon0, fe, fn_)))
        }
        Some(METHOD_LCC_1SP) => Ok(Box::new(LambertConformalConic::one_parallel(
            ellipsoid, lon0, lat0, k0, fe, fn_,
        ))),
        Some(METHOD_LCC_2SP) => {
            let lat0 = conv
                .param(&["Latitude of false origin", "latitude_of_origin", "lat_0"])
                .unwrap_or(lat0);
            let lon0 = conv
                .param(&[
                    "Longitude of false origin",
                    "central_meridian",
                    "lon_0",
                ])
                .unwrap_or(lon0);
            let lat1 = conv
                .param(&[
                    "Latitude of 1st standard parallel",
                    "standard_parallel_1",
                    "lat_1",
                ])
                .unwrap_or(lat0);
            let lat2 = conv
                .param(&[
                    "Latitude of 2nd standard parallel",
                    "standard_parallel_2",
                    "lat_2",
                ])
                .unwrap_or(lat1);
            let fe = conv
                .param(&["Easting at false origin", "false_easting", "x_0"])
                .unwrap_or(fe);
            let fn_ = conv
                .param(&["Northing at false origin", "false_northing", "y_0"])
                .unwrap_or(fn_);
            Ok(Box::new(LambertConformalConic::two_parallels(
                ellipsoid, lon0, lat0, lat1, lat2, fe, fn_,
            )))
        }
        _ => Err(Error::NoOperationFound(format!(
            "unsupported conversion method {:?}",
            conv.method.name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MethodDef, ObjectInfo, ParamDef};
    use crate::proj::ellipsoid::WGS84;
    use approx::assert_relative_eq;

    fn utm33() -> ConversionDef {
        ConversionDef {
            info: ObjectInfo::named("UTM zone 33N"),
            method: MethodDef::new("Transverse Mercator", Some(METHOD_TRANSVERSE_MERCATOR)),
            params: vec![
                ParamDef::angular("Latitude of natural origin", 0.0),
                ParamDef::angular("Longitude of natural origin", 15.0),
                ParamDef::scale("Scale factor at natural origin", 0.9996),
                ParamDef::linear("False easting", 500_000.0),
                ParamDef::linear("False northing", 0.0),
            ],
        }
    }

    #[test]
    fn test_utm_conversion_dispatch() {
        let p = projection_for(&utm33(), WGS84).unwrap();
        let (e, _) = p
            .forward(15.0_f64.to_radians(), 52.0_f64.to_radians())
            .unwrap();
        assert_relative_eq!(e, 500_000.0, epsilon = 1.0);
    }

    #[test]
    fn test_method_by_name_only() {
        let mut conv = utm33();
        conv.method = MethodDef::new("Transverse_Mercator", None);
        assert!(projection_for(&conv, WGS84).is_ok());
    }

    #[test]
    fn test_unknown_method_is_no_operation() {
        let mut conv = utm33();
        conv.method = MethodDef::new("Krovak", Some(9819));
        assert!(matches!(
            projection_for(&conv, WGS84),
            Err(Error::NoOperationFound(_))
        ));
    }
}

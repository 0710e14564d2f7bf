//! Authority database: resolving `AUTH:CODE` references to definitions.
//!
//! The default [`BuiltinRegistry`] carries a compiled-in subset of the EPSG
//! dataset sufficient for the common geographic, UTM and web-mapping systems;
//! a different backend (a full EPSG mirror, say) can be plugged into a
//! context through [`crate::Context::set_database`].

use crate::ident::UsageArea;
use crate::model::equivalence::canonical_name;
use crate::model::DatumDef;

/// One database row: the definition text plus the metadata that the
/// definition itself may not carry.
#[derive(Clone, Debug)]
pub struct DatabaseEntry {
    pub authority: String,
    pub code: String,
    pub name: String,
    /// Definition in any format accepted by [`crate::Context::create`].
    pub definition: String,
    pub deprecated: bool,
    pub area: Option<UsageArea>,
}

/// Source of authority definitions.
pub trait AuthorityDatabase {
    fn lookup(&self, authority: &str, code: &str) -> Option<DatabaseEntry>;

    /// Case-insensitive substring search over entry names.
    fn search(&self, text: &str, limit: usize) -> Vec<DatabaseEntry>;
}

// ---------------------------------------------------------------------------
// Builtin registry

pub struct BuiltinRegistry {
    entries: Vec<DatabaseEntry>,
}

const DEG: &str = r#"ANGLEUNIT["degree",0.0174532925199433]"#;
const METRE: &str = r#"LENGTHUNIT["metre",1]"#;

fn geographic_wkt(name: &str, datum: &str, ellipsoid_wkt: &str, code: u32) -> String {
    format!(
        r#"GEOGCRS["{name}",DATUM["{datum}",{ellipsoid_wkt}],PRIMEM["Greenwich",0,{DEG}],CS[ellipsoidal,2],AXIS["geodetic latitude (Lat)",north,ORDER[1],{DEG}],AXIS["geodetic longitude (Lon)",east,ORDER[2],{DEG}],ID["EPSG",{code}]]"#
    )
}

fn wgs84_ellipsoid() -> String {
    format!(r#"ELLIPSOID["WGS 84",6378137,298.257223563,{METRE}]"#)
}

fn grs80_ellipsoid() -> String {
    format!(r#"ELLIPSOID["GRS 1980",6378137,298.257222101,{METRE}]"#)
}

fn utm_wkt(base_name: &str, datum: &str, ellipsoid_wkt: &str, zone: u32, north: bool, code: u32) -> String {
    let suffix = if north { "N" } else { "S" };
    let lon0 = -183.0 + 6.0 * zone as f64;
    let fn_ = if north { 0 } else { 10_000_000 };
    format!(
        r#"PROJCRS["{base_name} / UTM zone {zone}{suffix}",BASEGEOGCRS["{base_name}",DATUM["{datum}",{ellipsoid_wkt}],PRIMEM["Greenwich",0,{DEG}]],CONVERSION["UTM zone {zone}{suffix}",METHOD["Transverse Mercator",ID["EPSG",9807]],PARAMETER["Latitude of natural origin",0,{DEG}],PARAMETER["Longitude of natural origin",{lon0},{DEG}],PARAMETER["Scale factor at natural origin",0.9996,SCALEUNIT["unity",1]],PARAMETER["False easting",500000,{METRE}],PARAMETER["False northing",{fn_},{METRE}]],CS[Cartesian,2],AXIS["(E)",east,ORDER[1],{METRE}],AXIS["(N)",north,ORDER[2],{METRE}],ID["EPSG",{code}]]"#
    )
}

fn entry(code: u32, name: &str, definition: String, area: UsageArea) -> DatabaseEntry {
    DatabaseEntry {
        authority: "EPSG".into(),
        code: code.to_string(),
        name: name.into(),
        definition,
        deprecated: false,
        area: Some(area),
    }
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        let mut entries = Vec::with_capacity(160);
        let world = UsageArea::new(-180.0, -90.0, 180.0, 90.0, "World");

        entries.push(entry(
            4326,
            "WGS 84",
            geographic_wkt("WGS 84", "World Geodetic System 1984", &wgs84_ellipsoid(), 4326),
            world.clone(),
        ));
        entries.push(entry(
            4979,
            "WGS 84",
            format!(
                r#"GEOGCRS["WGS 84",DATUM["World Geodetic System 1984",{}],PRIMEM["Greenwich",0,{DEG}],CS[ellipsoidal,3],AXIS["geodetic latitude (Lat)",north,ORDER[1],{DEG}],AXIS["geodetic longitude (Lon)",east,ORDER[2],{DEG}],AXIS["ellipsoidal height (h)",up,ORDER[3],{METRE}],ID["EPSG",4979]]"#,
                wgs84_ellipsoid()
            ),
            world.clone(),
        ));
        entries.push(entry(
            4978,
            "WGS 84",
            format!(
                r#"GEODCRS["WGS 84",DATUM["World Geodetic System 1984",{}],PRIMEM["Greenwich",0,{DEG}],CS[Cartesian,3],AXIS["(X)",geocentricX,ORDER[1],{METRE}],AXIS["(Y)",geocentricY,ORDER[2],{METRE}],AXIS["(Z)",geocentricZ,ORDER[3],{METRE}],ID["EPSG",4978]]"#,
                wgs84_ellipsoid()
            ),
            world.clone(),
        ));
        entries.push(entry(
            4258,
            "ETRS89",
            geographic_wkt("ETRS89", "European Terrestrial Reference System 1989", &grs80_ellipsoid(), 4258),
            UsageArea::new(-16.1, 32.88, 40.18, 84.73, "Europe - ETRS89"),
        ));
        entries.push(entry(
            4269,
            "NAD83",
            geographic_wkt("NAD83", "North American Datum 1983", &grs80_ellipsoid(), 4269),
            UsageArea::new(167.65, 14.92, -47.74, 86.46, "North America"),
        ));
        entries.push(entry(
            4267,
            "NAD27",
            geographic_wkt(
                "NAD27",
                "North American Datum 1927",
                &format!(r#"ELLIPSOID["Clarke 1866",6378206.4,294.978698213898,{METRE}]"#),
                4267,
            ),
            UsageArea::new(167.65, 7.15, -47.74, 83.17, "North America - NAD27"),
        ));
        entries.push(entry(
            4230,
            "ED50",
            geographic_wkt(
                "ED50",
                "European Datum 1950",
                &format!(r#"ELLIPSOID["International 1924",6378388,297,{METRE}]"#),
                4230,
            ),
            UsageArea::new(-16.1, 25.71, 48.61, 84.73, "Europe - ED50"),
        ));
        entries.push(entry(
            4171,
            "RGF93 v1",
            geographic_wkt("RGF93 v1", "Reseau Geodesique Francais 1993 v1", &grs80_ellipsoid(), 4171),
            UsageArea::new(-9.86, 41.15, 10.38, 51.56, "France"),
        ));
        entries.push(entry(
            4277,
            "OSGB36",
            geographic_wkt(
                "OSGB36",
                "Ordnance Survey of Great Britain 1936",
                &format!(r#"ELLIPSOID["Airy 1830",6377563.396,299.3249646,{METRE}]"#),
                4277,
            ),
            UsageArea::new(-8.82, 49.79, 1.92, 60.94, "UK - Britain and UKCS"),
        ));

        entries.push(entry(
            3857,
            "WGS 84 / Pseudo-Mercator",
            format!(
                r#"PROJCRS["WGS 84 / Pseudo-Mercator",BASEGEOGCRS["WGS 84",DATUM["World Geodetic System 1984",{}],PRIMEM["Greenwich",0,{DEG}]],CONVERSION["Popular Visualisation Pseudo-Mercator",METHOD["Popular Visualisation Pseudo Mercator",ID["EPSG",1024]],PARAMETER["Latitude of natural origin",0,{DEG}],PARAMETER["Longitude of natural origin",0,{DEG}],PARAMETER["False easting",0,{METRE}],PARAMETER["False northing",0,{METRE}]],CS[Cartesian,2],AXIS["easting (X)",east,ORDER[1],{METRE}],AXIS["northing (Y)",north,ORDER[2],{METRE}],ID["EPSG",3857]]"#,
                wgs84_ellipsoid()
            ),
            UsageArea::new(-180.0, -85.06, 180.0, 85.06, "World between 85.06S and 85.06N"),
        ));
        entries.push(entry(
            2154,
            "RGF93 v1 / Lambert-93",
            format!(
                r#"PROJCRS["RGF93 v1 / Lambert-93",BASEGEOGCRS["RGF93 v1",DATUM["Reseau Geodesique Francais 1993 v1",{}],PRIMEM["Greenwich",0,{DEG}]],CONVERSION["Lambert-93",METHOD["Lambert Conic Conformal (2SP)",ID["EPSG",9802]],PARAMETER["Latitude of false origin",46.5,{DEG}],PARAMETER["Longitude of false origin",3,{DEG}],PARAMETER["Latitude of 1st standard parallel",49,{DEG}],PARAMETER["Latitude of 2nd standard parallel",44,{DEG}],PARAMETER["Easting at false origin",700000,{METRE}],PARAMETER["Northing at false origin",6600000,{METRE}]],CS[Cartesian,2],AXIS["easting (X)",east,ORDER[1],{METRE}],AXIS["northing (Y)",north,ORDER[2],{METRE}],ID["EPSG",2154]]"#,
                grs80_ellipsoid()
            ),
            UsageArea::new(-9.86, 41.15, 10.38, 51.56, "France"),
        ));
        entries.push(entry(
            5703,
            "NAVD88 height",
            format!(
                r#"VERTCRS["NAVD88 height",VDATUM["North American Vertical Datum 1988"],CS[vertical,1],AXIS["gravity-related height (H)",up,{METRE}],ID["EPSG",5703]]"#
            ),
            UsageArea::new(167.65, 14.92, -47.74, 86.46, "North America - NAVD88"),
        ));

        // WGS 84 UTM zones.
        for zone in 1..=60u32 {
            let west = -180.0 + 6.0 * (zone - 1) as f64;
            entries.push(entry(
                32600 + zone,
                &format!("WGS 84 / UTM zone {zone}N"),
                utm_wkt("WGS 84", "World Geodetic System 1984", &wgs84_ellipsoid(), zone, true, 32600 + zone),
                UsageArea::new(west, 0.0, west + 6.0, 84.0, &format!("World - N hemisphere - {west}E to {}E", west + 6.0)),
            ));
            entries.push(entry(
                32700 + zone,
                &format!("WGS 84 / UTM zone {zone}S"),
                utm_wkt("WGS 84", "World Geodetic System 1984", &wgs84_ellipsoid(), zone, false, 32700 + zone),
                UsageArea::new(west, -80.0, west + 6.0, 0.0, &format!("World - S hemisphere - {west}E to {}E", west + 6.0)),
            ));
        }
        // ETRS89 UTM zones covering Europe.
        for zone in 28..=38u32 {
            let west = -180.0 + 6.0 * (zone - 1) as f64;
            entries.push(entry(
                25800 + zone,
                &format!("ETRS89 / UTM zone {zone}N"),
                utm_wkt("ETRS89", "European Terrestrial Reference System 1989", &grs80_ellipsoid(), zone, true, 25800 + zone),
                UsageArea::new(west, 32.88, west + 6.0, 84.73, &format!("Europe - {west}E to {}E", west + 6.0)),
            ));
        }

        BuiltinRegistry { entries }
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        BuiltinRegistry::new()
    }
}

impl AuthorityDatabase for BuiltinRegistry {
    fn lookup(&self, authority: &str, code: &str) -> Option<DatabaseEntry> {
        if !authority.eq_ignore_ascii_case("EPSG") {
            return None;
        }
        self.entries.iter().find(|e| e.code == code).cloned()
    }

    fn search(&self, text: &str, limit: usize) -> Vec<DatabaseEntry> {
        let needle = text.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(|e| e.name.to_ascii_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Datum shifts

/// Parameters of one candidate shift towards WGS 84.
#[derive(Clone, Debug)]
pub(crate) enum ShiftParams {
    /// Position-vector Helmert: 3 values (metres) or 7 (metres, arc-seconds,
    /// ppm).
    Helmert(Vec<f64>),
    /// Distortion grid; usable only when the context allows network access.
    Grid(String),
}

#[derive(Clone, Debug)]
pub(crate) struct ShiftCandidate {
    pub name: String,
    /// Positional accuracy in metres; None for ballpark-quality shifts.
    pub accuracy: Option<f64>,
    pub area: Option<UsageArea>,
    pub params: ShiftParams,
}

fn helmert(name: &str, accuracy: f64, area: UsageArea, values: &[f64]) -> ShiftCandidate {
    ShiftCandidate {
        name: name.into(),
        accuracy: Some(accuracy),
        area: Some(area),
        params: ShiftParams::Helmert(values.to_vec()),
    }
}

/// Known transformations from `datum` towards WGS 84, in registration order.
/// An explicitly declared `to_wgs84` on the datum takes precedence over this
/// table and is handled by the caller.
pub(crate) fn shift_candidates_to_wgs84(datum: &DatumDef) -> Vec<ShiftCandidate> {
    match canonical_name(&datum.info.name).as_str() {
        "ed1950" => vec![
            helmert(
                "ED50 to WGS 84 (mean for Europe)",
                10.0,
                UsageArea::new(-16.1, 25.71, 48.61, 84.73, "Europe - ED50"),
                &[-87.0, -98.0, -121.0],
            ),
            helmert(
                "ED50 to WGS 84 (Iberia)",
                5.0,
                UsageArea::new(-9.87, 35.26, 4.39, 43.95, "Spain and Portugal - mainland"),
                &[-84.0, -107.0, -120.0],
            ),
            helmert(
                "ED50 to WGS 84 (Norway offshore north of 65N)",
                4.0,
                UsageArea::new(-0.49, 65.0, 36.49, 77.25, "Norway - offshore north of 65N"),
                &[-116.641, -56.931, -110.559, 0.893, 0.921, -0.917, -3.52],
            ),
        ],
        "nad1927" => vec![
            ShiftCandidate {
                name: "NAD27 to WGS 84 (NADCON5 CONUS)".into(),
                accuracy: Some(0.15),
                area: Some(UsageArea::new(-124.79, 24.41, -66.91, 49.38, "USA - CONUS")),
                params: ShiftParams::Grid("us_noaa_nadcon5_nad27_nad83_conus.tif".into()),
            },
            helmert(
                "NAD27 to WGS 84 (mean for North America)",
                10.0,
                UsageArea::new(167.65, 7.15, -47.74, 83.17, "North America - NAD27"),
                &[-8.0, 160.0, 176.0],
            ),
        ],
        "deutscheshauptdreiecksnetz" | "dhdn" => vec![helmert(
            "DHDN to WGS 84 (Germany)",
            3.0,
            UsageArea::new(5.86, 47.27, 13.84, 55.09, "Germany - onshore"),
            &[598.1, 73.7, 418.2, 0.202, 0.045, -2.455, 6.7],
        )],
        "ordnancesurveyofgreatbritain1936" | "osgb36" | "osgb1936" => vec![helmert(
            "OSGB36 to WGS 84 (Petroleum)",
            2.0,
            UsageArea::new(-8.82, 49.79, 1.92, 60.94, "UK - Britain and UKCS"),
            &[446.448, -125.157, 542.06, 0.15, 0.247, 0.842, -20.489],
        )],
        "nad1983" => vec![helmert(
            "NAD83 to WGS 84 (1)",
            2.0,
            UsageArea::new(167.65, 14.92, -47.74, 86.46, "North America"),
            &[0.0, 0.0, 0.0],
        )],
        "etrs1989" | "reseaugeodesiquefrancais1993v1" | "reseaugeodesiquefrancais1993" => vec![helmert(
            "ETRS89 to WGS 84 (1)",
            1.0,
            UsageArea::new(-16.1, 32.88, 40.18, 84.73, "Europe - ETRS89"),
            &[0.0, 0.0, 0.0],
        )],
        "wgs1984" | "worldgeodeticsystem1984ensemble" => {
            vec![helmert("WGS 84 (null shift)", 0.0, UsageArea::world(), &[0.0, 0.0, 0.0])]
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DatumDef;

    #[test]
    fn test_lookup_known_codes() {
        let reg = BuiltinRegistry::new();
        assert_eq!(reg.lookup("EPSG", "4326").unwrap().name, "WGS 84");
        assert_eq!(
            reg.lookup("epsg", "32633").unwrap().name,
            "WGS 84 / UTM zone 33N"
        );
        assert_eq!(
            reg.lookup("EPSG", "32733").unwrap().name,
            "WGS 84 / UTM zone 33S"
        );
        assert!(reg.lookup("EPSG", "999999").is_none());
        assert!(reg.lookup("ESRI", "4326").is_none());
    }

    #[test]
    fn test_utm_zone_central_meridian() {
        let reg = BuiltinRegistry::new();
        let def = reg.lookup("EPSG", "32633").unwrap().definition;
        assert!(def.contains(r#"PARAMETER["Longitude of natural origin",15"#));
        let def31 = reg.lookup("EPSG", "25831").unwrap().definition;
        assert!(def31.contains(r#"PARAMETER["Longitude of natural origin",3"#));
    }

    #[test]
    fn test_utm_area_tracks_zone() {
        let reg = BuiltinRegistry::new();
        let area = reg.lookup("EPSG", "32633").unwrap().area.unwrap();
        assert_eq!(area.west, 12.0);
        assert_eq!(area.east, 18.0);
        assert!(area.south == 0.0 && area.north == 84.0);
    }

    #[test]
    fn test_search_limit() {
        let reg = BuiltinRegistry::new();
        let hits = reg.search("utm", 7);
        assert_eq!(hits.len(), 7);
        assert!(reg.search("no such thing", 10).is_empty());
    }

    #[test]
    fn test_ed50_candidates_in_registration_order() {
        let datum = DatumDef::geodetic(
            "European Datum 1950",
            crate::model::EllipsoidDef::from_short_name("intl").unwrap(),
        );
        let shifts = shift_candidates_to_wgs84(&datum);
        assert_eq!(shifts.len(), 3);
        assert!(shifts[0].name.contains("mean for Europe"));
        assert!(shifts[1].accuracy < shifts[0].accuracy);
    }

    #[test]
    fn test_nad27_has_grid_candidate() {
        let datum = DatumDef::from_short_name("nad27").unwrap();
        let shifts = shift_candidates_to_wgs84(&datum);
        assert!(shifts
            .iter()
            .any(|s| matches!(s.params, ShiftParams::Grid(_))));
    }

    #[test]
    fn test_unknown_datum_has_no_candidates() {
        let datum = DatumDef::geodetic(
            "Custom Local Datum",
            crate::model::EllipsoidDef::wgs84(),
        );
        assert!(shift_candidates_to_wgs84(&datum).is_empty());
    }
}

//! Coordinate reference systems and point transformations, in pure Rust.
//!
//! The crate models the geodetic object hierarchy (CRS, datums, ellipsoids,
//! coordinate systems, operations), parses and writes the common definition
//! formats (WKT 1 and 2, PROJ strings, PROJJSON, `AUTH:CODE` references),
//! and builds coordinate operations between any two CRS, including datum
//! shifts with per-area candidate selection.
//!
//! Every object lives in a [`Context`], an arena that owns it; disposing the
//! context invalidates all handles at once. Contexts are single-threaded;
//! move definitions between threads as text.
//!
//! ```
//! use geocrs::{Context, Coordinate, Crs, OperationOptions};
//!
//! let ctx = Context::new();
//! let wgs84 = Crs::create("EPSG:4326", Some(&ctx))?;
//! let utm33 = Crs::create("EPSG:32633", Some(&ctx))?;
//!
//! let op = ctx.create_coordinate_operation(&wgs84, &utm33, OperationOptions::default())?;
//! // EPSG:4326 is latitude-first.
//! let projected = op.apply(Coordinate::xy(55.0, 12.0))?;
//! assert!((projected.x - 308_124.37).abs() < 0.05);
//! # Ok::<(), geocrs::Error>(())
//! ```

mod authority;
mod context;
mod coord;
mod crs;
mod error;
mod ident;
mod model;
mod object;
mod op;
mod proj;
mod projjson;
mod projstring;
mod wkt;

pub use authority::{AuthorityDatabase, BuiltinRegistry, DatabaseEntry};
pub use context::Context;
pub use coord::Coordinate;
pub use crs::{Axis, CoordinateSystem, Crs, Datum, DatumEnsemble, Ellipsoid, PrimeMeridian};
pub use error::Error;
pub use ident::{AreaOfInterest, Identifier, IdentifierList, UsageArea};
pub use model::{AxisDirection, CrsKind, CsKind, DatumKind, OperationKind, UnitKind};
pub use object::{
    Object, ObjectKind, ProjJsonOptions, ProjJsonVariant, ProjStringOptions, ProjStringVariant,
    WktOptions, WktVariant, SCHEMA_V0_2_URL, SCHEMA_V0_4_URL,
};
pub use op::{CoordinateOperation, OperationOptions};

//! The context that owns every geodetic object.
//!
//! A [`Context`] is an arena: objects created through it live exactly as long
//! as it does, and [`Context::dispose`] invalidates every outstanding handle
//! at once. Contexts are single-threaded by construction; move definitions
//! between threads as text and re-parse on the other side.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::authority::{AuthorityDatabase, BuiltinRegistry, DatabaseEntry};
use crate::error::Error;
use crate::model::Def;
use crate::object::{Object, ObjectRecord};

const DEFAULT_ENDPOINT: &str = "https://cdn.proj.org";

pub(crate) struct ContextInner {
    records: RefCell<Vec<Rc<ObjectRecord>>>,
    disposed: Cell<bool>,
    last_error: RefCell<Option<String>>,
    network_enabled: Cell<bool>,
    endpoint_url: RefCell<String>,
    use_authority_database: Cell<bool>,
    celestial_body: RefCell<String>,
    database: RefCell<Rc<dyn AuthorityDatabase>>,
}

impl ContextInner {
    fn with_database(database: Rc<dyn AuthorityDatabase>) -> Self {
        ContextInner {
            records: RefCell::new(Vec::new()),
            disposed: Cell::new(false),
            last_error: RefCell::new(None),
            network_enabled: Cell::new(false),
            endpoint_url: RefCell::new(DEFAULT_ENDPOINT.to_string()),
            use_authority_database: Cell::new(true),
            celestial_body: RefCell::new("Earth".to_string()),
            database: RefCell::new(database),
        }
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

/// Owner of geodetic objects and of the settings that govern how definitions
/// resolve (authority database, grid network policy).
#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextInner>,
}

impl Context {
    pub fn new() -> Self {
        Context {
            inner: Rc::new(ContextInner::with_database(Rc::new(
                BuiltinRegistry::new(),
            ))),
        }
    }

    pub(crate) fn from_inner(inner: Rc<ContextInner>) -> Self {
        Context { inner }
    }

    /// A fresh context with the same settings but an empty arena.
    pub fn clone_context(&self) -> Context {
        let copy = ContextInner::with_database(self.inner.database.borrow().clone());
        copy.network_enabled.set(self.inner.network_enabled.get());
        *copy.endpoint_url.borrow_mut() = self.inner.endpoint_url.borrow().clone();
        copy.use_authority_database
            .set(self.inner.use_authority_database.get());
        *copy.celestial_body.borrow_mut() = self.inner.celestial_body.borrow().clone();
        Context {
            inner: Rc::new(copy),
        }
    }

    /// Invalidate every object created through this context.
    pub fn dispose(&self) {
        self.inner.disposed.set(true);
        self.inner.records.borrow_mut().clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    // -- settings -----------------------------------------------------------

    /// Whether remote transformation grids may be used. Off by default.
    pub fn network_enabled(&self) -> bool {
        self.inner.network_enabled.get()
    }

    pub fn set_network_enabled(&self, enabled: bool) {
        self.inner.network_enabled.set(enabled);
    }

    pub fn endpoint_url(&self) -> String {
        self.inner.endpoint_url.borrow().clone()
    }

    pub fn set_endpoint_url(&self, url: impl Into<String>) {
        *self.inner.endpoint_url.borrow_mut() = url.into();
    }

    pub fn uses_authority_database(&self) -> bool {
        self.inner.use_authority_database.get()
    }

    pub fn set_use_authority_database(&self, enabled: bool) {
        self.inner.use_authority_database.set(enabled);
    }

    pub fn default_celestial_body(&self) -> String {
        self.inner.celestial_body.borrow().clone()
    }

    pub fn set_default_celestial_body(&self, body: impl Into<String>) {
        *self.inner.celestial_body.borrow_mut() = body.into();
    }

    /// Replace the authority database consulted for `AUTH:CODE` lookups.
    pub fn set_database(&self, database: Rc<dyn AuthorityDatabase>) {
        *self.inner.database.borrow_mut() = database;
    }

    /// Message of the last definition that failed to resolve here.
    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error.borrow().clone()
    }

    fn note_error(&self, err: &Error) {
        *self.inner.last_error.borrow_mut() = Some(err.to_string());
    }

    // -- object creation ----------------------------------------------------

    /// Parse any supported definition format, detected from its shape:
    /// PROJ strings start with `+` or `proj=`, PROJJSON with `{`,
    /// authority references are `AUTH:CODE` or OGC URNs, anything else is
    /// treated as WKT.
    pub fn create(&self, definition: &str) -> Result<Object, Error> {
        self.check_alive()?;
        let (def, warnings) = self.parse_def(definition).map_err(|e| {
            self.note_error(&e);
            e
        })?;
        for w in &warnings {
            warn!(warning = %w, "definition parsed with warning");
        }
        Ok(self.adopt(def))
    }

    /// Parse WKT, additionally reporting recoverable warnings.
    pub fn create_from_wkt(&self, text: &str) -> Result<(Object, Vec<String>), Error> {
        self.check_alive()?;
        let (def, warnings) = crate::wkt::parse::parse(text).map_err(|e| {
            self.note_error(&e);
            e
        })?;
        Ok((self.adopt(def), warnings))
    }

    /// Resolve `authority:code` through the authority database.
    pub fn create_from_database(&self, authority: &str, code: &str) -> Result<Object, Error> {
        self.check_alive()?;
        let entry = self.lookup(authority, code).map_err(|e| {
            self.note_error(&e);
            e
        })?;
        let (mut def, _) = self.parse_def(&entry.definition).map_err(|e| {
            self.note_error(&e);
            e
        })?;
        // Registry metadata wins over whatever the definition text carries.
        if let Some(info) = def.info_mut() {
            info.name = entry.name.clone();
            info.identifiers = vec![crate::ident::Identifier::new(
                entry.authority.clone(),
                entry.code.clone(),
            )];
            if entry.area.is_some() {
                info.usage_area = entry.area.clone();
            }
            info.deprecated = entry.deprecated;
        }
        debug!(authority = %entry.authority, code = %entry.code, "resolved from database");
        Ok(self.adopt(def))
    }

    /// Shorthand for [`Context::create_from_database`] with the EPSG
    /// authority.
    pub fn create_from_epsg(&self, code: u32) -> Result<Object, Error> {
        self.create_from_database("EPSG", &code.to_string())
    }

    /// Case-insensitive name search over the authority database.
    pub fn search(&self, text: &str, limit: usize) -> Result<Vec<DatabaseEntry>, Error> {
        self.check_alive()?;
        if !self.uses_authority_database() {
            return Ok(Vec::new());
        }
        Ok(self.inner.database.borrow().search(text, limit))
    }

    fn lookup(&self, authority: &str, code: &str) -> Result<DatabaseEntry, Error> {
        if !self.uses_authority_database() {
            return Err(Error::UnknownCrs(format!("{authority}:{code}")));
        }
        self.inner
            .database
            .borrow()
            .lookup(authority, code)
            .ok_or_else(|| Error::UnknownCrs(format!("{authority}:{code}")))
    }

    pub(crate) fn authority_entry(&self, authority: &str, code: &str) -> Option<DatabaseEntry> {
        if !self.uses_authority_database() {
            return None;
        }
        self.inner.database.borrow().lookup(authority, code)
    }

    fn parse_def(&self, definition: &str) -> Result<(Def, Vec<String>), Error> {
        let text = definition.trim();
        if text.is_empty() {
            return Err(Error::parse(definition, "empty definition"));
        }
        if text.starts_with('{') {
            return Ok((crate::projjson::parse(text)?, Vec::new()));
        }
        if text.starts_with('+') || text.starts_with("proj=") {
            return Ok((Def::Crs(crate::projstring::parse(text)?), Vec::new()));
        }
        if let Some((authority, code)) = authority_reference(text) {
            let entry = self.lookup(authority, code)?;
            let (mut def, warnings) = self.parse_def(&entry.definition)?;
            if let Some(info) = def.info_mut() {
                info.name = entry.name.clone();
                info.identifiers = vec![crate::ident::Identifier::new(
                    entry.authority.clone(),
                    entry.code.clone(),
                )];
                if entry.area.is_some() {
                    info.usage_area = entry.area.clone();
                }
                info.deprecated = entry.deprecated;
            }
            return Ok((def, warnings));
        }
        crate::wkt::parse::parse(text)
    }

    // -- arena --------------------------------------------------------------

    pub(crate) fn adopt(&self, def: Def) -> Object {
        self.adopt_record(def, false)
    }

    pub(crate) fn adopt_record(&self, def: Def, no_proj: bool) -> Object {
        let rec = Rc::new(ObjectRecord::new(def, no_proj));
        self.inner.records.borrow_mut().push(Rc::clone(&rec));
        Object {
            ctx: Rc::downgrade(&self.inner),
            rec: Rc::downgrade(&rec),
            owner: None,
        }
    }

    pub(crate) fn into_inner(self) -> Rc<ContextInner> {
        self.inner
    }

    fn check_alive(&self) -> Result<(), Error> {
        if self.is_disposed() {
            Err(Error::Disposed)
        } else {
            Ok(())
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

thread_local! {
    static DEFAULT_CONTEXT: Context = Context::new();
}

/// The per-thread context used when an operation is given none explicitly.
pub(crate) fn default_context() -> Context {
    DEFAULT_CONTEXT.with(|c| c.clone())
}

/// Split an `AUTH:CODE` or `urn:ogc:def:...` reference.
fn authority_reference(text: &str) -> Option<(&str, &str)> {
    if text.contains(char::is_whitespace) || text.contains('[') {
        return None;
    }
    let lower = text.to_ascii_lowercase();
    if lower.starts_with("urn:ogc:def:") {
        // urn:ogc:def:crs:EPSG::4326
        let parts: Vec<&str> = text.split(':').collect();
        if parts.len() >= 7 {
            return Some((parts[4], parts[6]));
        }
        return None;
    }
    let (authority, code) = text.split_once(':')?;
    if authority.is_empty()
        || code.is_empty()
        || !authority.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        || !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return None;
    }
    Some((authority, code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;

    #[test]
    fn test_create_from_authority_code() {
        let ctx = Context::new();
        let crs = ctx.create("EPSG:4326").unwrap();
        assert_eq!(crs.kind().unwrap(), ObjectKind::Geographic2DCrs);
        assert_eq!(crs.name().unwrap(), "WGS 84");
    }

    #[test]
    fn test_create_from_urn() {
        let ctx = Context::new();
        let crs = ctx.create("urn:ogc:def:crs:EPSG::4326").unwrap();
        assert_eq!(crs.identifier().unwrap().unwrap().code(), "4326");
    }

    #[test]
    fn test_create_from_proj_string() {
        let ctx = Context::new();
        let crs = ctx.create("+proj=longlat +datum=WGS84 +no_defs").unwrap();
        assert!(crs.kind().unwrap().is_crs());
    }

    #[test]
    fn test_create_from_epsg() {
        let ctx = Context::new();
        let crs = ctx.create_from_epsg(32633).unwrap();
        assert_eq!(crs.kind().unwrap(), ObjectKind::ProjectedCrs);
        assert_eq!(crs.name().unwrap(), "WGS 84 / UTM zone 33N");
    }

    #[test]
    fn test_unknown_code_is_an_error() {
        let ctx = Context::new();
        let err = ctx.create("EPSG:999999").unwrap_err();
        assert!(matches!(err, Error::UnknownCrs(_)));
        assert!(ctx.last_error().unwrap().contains("999999"));
    }

    #[test]
    fn test_database_can_be_disabled() {
        let ctx = Context::new();
        ctx.set_use_authority_database(false);
        assert!(matches!(
            ctx.create("EPSG:4326").unwrap_err(),
            Error::UnknownCrs(_)
        ));
        assert!(ctx.search("WGS", 10).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_text_is_parse_error() {
        let ctx = Context::new();
        let err = ctx.create("GEOGCRS[oops").unwrap_err();
        assert!(matches!(err, Error::DefinitionParse { .. }));
        assert!(ctx.last_error().is_some());
    }

    #[test]
    fn test_empty_definition() {
        let ctx = Context::new();
        assert!(matches!(
            ctx.create("   ").unwrap_err(),
            Error::DefinitionParse { .. }
        ));
    }

    #[test]
    fn test_dispose_blocks_creation() {
        let ctx = Context::new();
        ctx.dispose();
        assert!(matches!(ctx.create("EPSG:4326"), Err(Error::Disposed)));
    }

    #[test]
    fn test_clone_context_copies_settings_not_objects() {
        let ctx = Context::new();
        ctx.set_network_enabled(true);
        ctx.set_default_celestial_body("Mars");
        let obj = ctx.create("EPSG:4326").unwrap();
        let copy = ctx.clone_context();
        assert!(copy.network_enabled());
        assert_eq!(copy.default_celestial_body(), "Mars");
        assert!(!copy.is_disposed());
        // Objects stay with the original.
        ctx.dispose();
        assert!(obj.name().is_err());
        assert!(!copy.is_disposed());
    }

    #[test]
    fn test_search_finds_by_name() {
        let ctx = Context::new();
        let hits = ctx.search("UTM zone 33N", 5).unwrap();
        assert!(!hits.is_empty());
        assert!(hits.iter().any(|e| e.code == "32633"));
    }

    #[test]
    fn test_authority_reference_detection() {
        assert_eq!(authority_reference("EPSG:4326"), Some(("EPSG", "4326")));
        assert_eq!(
            authority_reference("urn:ogc:def:crs:EPSG::4979"),
            Some(("EPSG", "4979"))
        );
        assert_eq!(authority_reference("GEOGCRS[\"x\"]"), None);
        assert_eq!(authority_reference("+proj=longlat"), None);
    }
}

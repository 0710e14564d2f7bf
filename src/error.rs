use thiserror::Error;

/// Error kinds surfaced by every public operation of the crate.
///
/// A failing operation never returns a partially built object or a partially
/// computed coordinate; it returns exactly one of these.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed WKT, PROJ string or PROJJSON. Carries the offending text
    /// (truncated) and a reason.
    #[error("cannot parse definition {text:?}: {message}")]
    DefinitionParse { text: String, message: String },

    /// An authority:code pair that the database does not know.
    #[error("unknown CRS: {0}")]
    UnknownCrs(String),

    /// A forced derivation (e.g. `datum_forced`) that cannot be satisfied
    /// for this object kind. Plain derivations return `Ok(None)` instead.
    #[error("derivation not available: {0}")]
    UnsupportedDerivation(String),

    /// Use of an object after it, or its owning context, was disposed.
    #[error("object used after its context was disposed")]
    Disposed,

    /// No candidate coordinate operation matches source, target and area.
    #[error("no coordinate operation found: {0}")]
    NoOperationFound(String),

    /// Input coordinate outside the mathematical validity of the selected
    /// pipeline. Triggers candidate failover inside a choose-operation.
    #[error("coordinate outside the domain of {0}")]
    OutOfDomain(String),

    /// A grid-dependent operation could not obtain its grid.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// An option or argument that is out of range or inconsistent.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl Error {
    pub(crate) fn parse(text: &str, message: impl Into<String>) -> Self {
        let mut text = text.trim().to_string();
        if text.len() > 120 {
            let cut = (0..=120).rev().find(|i| text.is_char_boundary(*i)).unwrap_or(0);
            text.truncate(cut);
            text.push('…');
        }
        Error::DefinitionParse {
            text,
            message: message.into(),
        }
    }

    /// True for the failures that a choose-operation may recover from by
    /// falling over to the next ranked candidate.
    pub(crate) fn allows_failover(&self) -> bool {
        matches!(self, Error::OutOfDomain(_))
    }
}

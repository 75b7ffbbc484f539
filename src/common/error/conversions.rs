//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from the error
//! types of third-party crates to the unified Error type.

use super::types::Error;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CacheIo(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<glob::PatternError> for Error {
    fn from(err: glob::PatternError) -> Self {
        Error::Config(format!("invalid mapping glob: {}", err))
    }
}

#[cfg(feature = "xlsx")]
impl From<calamine::Error> for Error {
    fn from(err: calamine::Error) -> Self {
        match err {
            calamine::Error::Io(e) => Error::Io(e),
            other => Error::Spreadsheet(other.to_string()),
        }
    }
}

//! Error taxonomy of an average request

use alloc::string::String;

use thiserror_no_std::Error;

use crate::metrics::UnsupportedMetric;
use crate::source::SourceError;
use crate::subjects::RegistryError;
use crate::window::WindowError;

/// Terminal failure of an average request.
///
/// Every variant ends the request; exactly one outcome is reported.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The request could not be decoded or misses a field
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    /// The requested duration is not a positive whole number of seconds
    #[error("invalid time duration: {0}")]
    InvalidDuration(String),
    #[error("unknown subject `{0}`")]
    UnknownSubject(String),
    #[error("{0}")]
    UnsupportedMetric(UnsupportedMetric),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("store query failed: {0}")]
    StoreQuery(String),
}

impl QueryError {
    /// Short machine-readable kind, used in logs and response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "MalformedRequest",
            Self::InvalidDuration(_) => "InvalidDuration",
            Self::UnknownSubject(_) => "UnknownSubject",
            Self::UnsupportedMetric(_) => "UnsupportedMetric",
            Self::StoreUnavailable(_) => "StoreUnavailable",
            Self::StoreQuery(_) => "StoreQueryError",
        }
    }
}

impl From<UnsupportedMetric> for QueryError {
    fn from(value: UnsupportedMetric) -> Self {
        Self::UnsupportedMetric(value)
    }
}

impl From<WindowError> for QueryError {
    fn from(value: WindowError) -> Self {
        match value {
            WindowError::InvalidDuration(secs) => {
                Self::InvalidDuration(alloc::format!("{}s is not a positive duration", secs))
            }
        }
    }
}

impl From<SourceError> for QueryError {
    fn from(value: SourceError) -> Self {
        match value {
            SourceError::Unavailable(msg) => Self::StoreUnavailable(msg),
            SourceError::Query(msg) => Self::StoreQuery(msg),
        }
    }
}

impl From<RegistryError> for QueryError {
    fn from(value: RegistryError) -> Self {
        match value {
            RegistryError::UnknownSubject(id) => Self::UnknownSubject(id),
            // Registry construction errors are configuration problems, they
            // never surface from `resolve`.
            other => Self::UnknownSubject(alloc::format!("{}", other)),
        }
    }
}

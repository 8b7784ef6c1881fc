//! Reading source contract
//!
//! A reading source is the thin adapter in front of whatever store holds the
//! device uploads. The core only relies on this trait; the store client and
//! its query execution live with the host.

use alloc::string::String;

use thiserror_no_std::Error;

use crate::reading::Reading;

/// Failure reported by a reading source.
///
/// Either variant aborts the whole request; a subject whose query failed is
/// never treated as a subject without data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The store could not be reached or opened
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The store was reached but the query failed
    #[error("store query failed: {0}")]
    Query(String),
}

/// Trait for stores that can return the readings of a subject.
pub trait ReadingSource {
    /// Finite, one-shot sequence of readings. No ordering is guaranteed.
    type Readings: IntoIterator<Item = Reading>;

    /// Returns the readings of `subject` captured at or after `since`
    /// (seconds since the Unix epoch).
    fn query(
        &self,
        subject: &str,
        since: i64,
    ) -> impl Future<Output = Result<Self::Readings, SourceError>>;
}

impl<S: ReadingSource> ReadingSource for &S {
    type Readings = S::Readings;

    fn query(
        &self,
        subject: &str,
        since: i64,
    ) -> impl Future<Output = Result<Self::Readings, SourceError>> {
        (**self).query(subject, since)
    }
}

//! Hardware-independent core library for tally
//!
//! This crate contains the platform-agnostic logic of the sensor-average
//! service: metric extraction from device readings, time-window resolution,
//! subject resolution, the aggregation engine and summary formatting.
//!
//! It is `#![no_std]` with `extern crate alloc` so the same logic can be
//! linked into the host service, the simulator and the tests. Everything that
//! touches a real store or a transport lives outside this crate.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod accumulator;
pub mod aggregate;
pub mod error;
pub mod metrics;
pub mod reading;
pub mod request;
pub mod service;
pub mod source;
pub mod subjects;
pub mod summary;
pub mod window;

pub use accumulator::AggregateAccumulator;
pub use aggregate::{Aggregate, AggregateResult, aggregate, fold_into};
pub use error::QueryError;
pub use metrics::{METRIC_TABLE, MetricKey, SensorGroup, UnsupportedMetric, extract};
pub use reading::Reading;
pub use request::{AverageRequest, DurationValue, RawRequest};
pub use service::{AverageService, Outcome};
pub use source::{ReadingSource, SourceError};
pub use subjects::{RegistryError, SubjectGroup, SubjectRegistry};
pub use chrono_tz::Tz;
pub use summary::{DEFAULT_LABEL_TIME_ZONE, SummaryFormatter, SummaryPayload};
pub use window::{TimeWindow, WindowError};
